//! # 分组密码原语
//!
//! 工作模式引擎只把分组密码看作一对纯函数:
//!
//! $$
//! C = Encrypt(P, K), P = Decrypt(C, K)
//! $$
//!
//! 分组和密钥都用整数表示, 位宽分别为`BLOCK_BITS`和`KEY_BITS`. 对于固定的密钥, `Encrypt`
//! 必须是分组空间上的双射, 即`Decrypt(Encrypt(P, K), K) == P`, 否则ECB/CBC无法正确解密. <br>
//! <br>
//! 字节流按大端序打包为分组, 即第一个字节为分组的最高有效字节.

use crate::EngineError;

mod saes;
mod sdes;
pub use saes::SAES;
pub use sdes::SDES;

pub trait BlockSpec {
    /// 分组位长度, 需要是8的倍数且不超过64
    const BLOCK_BITS: u32;
    /// 密钥位长度, 不超过64
    const KEY_BITS: u32;
    /// 分组字节长度
    const BLOCK_SIZE: usize = (Self::BLOCK_BITS as usize) >> 3;
}

pub trait BlockEncrypt: BlockSpec {
    fn encrypt_block(&self, block: u64, key: u64) -> Result<u64, EngineError>;
}

pub trait BlockDecrypt: BlockSpec {
    fn decrypt_block(&self, block: u64, key: u64) -> Result<u64, EngineError>;
}

pub trait BlockCipher: BlockEncrypt + BlockDecrypt {}

impl<T> BlockCipher for T where T: BlockEncrypt + BlockDecrypt {}

/// 低`bits`位全为1的掩码
pub const fn mask(bits: u32) -> u64 {
    if bits >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// 检查`value`能否用`bits`位表示
pub fn check_width(name: &str, value: u64, bits: u32) -> Result<(), EngineError> {
    if value & !mask(bits) != 0 {
        Err(EngineError::invalid_parameter(format!(
            "{name} `{value:#x}` out of the `{bits}` bits range"
        )))
    } else {
        Ok(())
    }
}

/// 检查分组参数是否能被字节流引擎处理
pub fn check_spec<E: BlockSpec>() -> Result<(), EngineError> {
    if E::BLOCK_BITS == 0 || E::BLOCK_BITS % 8 != 0 || E::BLOCK_BITS > u64::BITS {
        return Err(EngineError::invalid_parameter(format!(
            "block bits `{}` need to be a multiple of 8 in range `[8, 64]`",
            E::BLOCK_BITS
        )));
    }

    if E::KEY_BITS == 0 || E::KEY_BITS > u64::BITS {
        return Err(EngineError::invalid_parameter(format!(
            "key bits `{}` out of range `[1, 64]`",
            E::KEY_BITS
        )));
    }

    Ok(())
}

pub(crate) fn check_chunk(chunk: &[u8], block_size: usize) -> Result<(), EngineError> {
    if chunk.len() % block_size != 0 {
        Err(EngineError::MalformedInput {
            len: chunk.len(),
            block_size,
        })
    } else {
        Ok(())
    }
}

/// 调用者保证`chunk.len()`是`block_size`的整数倍
pub(crate) fn blocks(chunk: &[u8], block_size: usize) -> impl Iterator<Item = u64> + '_ {
    chunk.chunks_exact(block_size).map(to_block)
}

pub(crate) fn to_block(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

/// 只写入`block`的低`block_size`个字节
pub(crate) fn put_block(out: &mut Vec<u8>, block: u64, block_size: usize) {
    out.extend_from_slice(&block.to_be_bytes()[(8 - block_size)..]);
}

pub(crate) fn last_block(chunk: &[u8], block_size: usize) -> Option<u64> {
    chunk
        .len()
        .checked_sub(block_size)
        .map(|start| to_block(&chunk[start..]))
}

#[cfg(test)]
mod tests {
    use super::{blocks, check_chunk, check_width, last_block, mask, put_block};
    use crate::EngineError;

    #[test]
    fn block_codec_big_endian() {
        let data = [0x12u8, 0x34, 0x56, 0x78];
        let b16 = blocks(&data, 2).collect::<Vec<_>>();
        assert_eq!(b16, vec![0x1234, 0x5678]);

        let mut out = vec![];
        b16.iter().for_each(|&b| put_block(&mut out, b, 2));
        assert_eq!(out, data);

        let mut out = vec![];
        put_block(&mut out, 0xabcd, 1);
        assert_eq!(out, vec![0xcd], "bytes above the block width are dropped");

        assert_eq!(last_block(&data, 2), Some(0x5678));
        assert_eq!(last_block(&data, 1), Some(0x78));
        assert_eq!(last_block(&[], 2), None);
    }

    #[test]
    fn width_checks() {
        assert_eq!(mask(8), 0xff);
        assert_eq!(mask(10), 0x3ff);
        assert_eq!(mask(64), u64::MAX);

        assert!(check_width("key", 0x3ff, 10).is_ok());
        assert!(matches!(
            check_width("key", 0x400, 10),
            Err(EngineError::InvalidParameter(_))
        ));

        assert!(check_chunk(&[0u8; 4], 2).is_ok());
        assert!(matches!(
            check_chunk(&[0u8; 3], 2),
            Err(EngineError::MalformedInput {
                len: 3,
                block_size: 2
            })
        ));
    }
}
