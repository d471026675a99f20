use crate::block_cipher::{blocks, check_chunk, mask, put_block};
use crate::{BlockEncrypt, EngineError};

/// The Counter Mode(CTR) <br>
///
/// 第`j`个分组使用计数值`counter + j`, 计数值按`u64`回绕递增, 送入分组密码前截断为分组位宽. <br>
/// 加解密是同一个运算.
pub struct CTR<'a, E> {
    cipher: &'a E,
    key: u64,
}

impl<'a, E> CTR<'a, E> {
    pub const fn new(cipher: &'a E, key: u64) -> Self {
        Self { cipher, key }
    }
}

impl<'a, E: BlockEncrypt> CTR<'a, E> {
    fn keystream(&self, counter: u64) -> Result<u64, EngineError> {
        self.cipher
            .encrypt_block(counter & mask(E::BLOCK_BITS), self.key)
            .map(|o| o & mask(E::BLOCK_BITS))
    }

    /// 返回(输出字节, 下一个未使用的计数值)
    pub fn apply_chunk(
        &self,
        mut counter: u64,
        chunk: &[u8],
    ) -> Result<(Vec<u8>, u64), EngineError> {
        let n = E::BLOCK_SIZE;
        check_chunk(chunk, n)?;

        let mut out = Vec::with_capacity(chunk.len());
        for block in blocks(chunk, n) {
            let o = self.keystream(counter)?;
            put_block(&mut out, o ^ block, n);
            counter = counter.wrapping_add(1);
        }
        Ok((out, counter))
    }
}

#[cfg(test)]
mod tests {
    use super::CTR;
    use crate::block_cipher::{SAES, SDES};
    use crate::BlockEncrypt;

    #[test]
    fn ctr_sdes_self_inverse() {
        let ctr = CTR::new(&SDES, 0b1010000010);
        let (ct, cnt) = ctr.apply_chunk(0x40, &[0x12, 0x34, 0x56, 0x78]).unwrap();
        assert_eq!(ct, vec![0xe8, 0x21, 0x4f, 0x3c]);
        assert_eq!(cnt, 0x44);

        let (pt, _) = ctr.apply_chunk(0x40, &ct).unwrap();
        assert_eq!(pt, vec![0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn ctr_saes() {
        let ctr = CTR::new(&SAES, 0xa73b);
        let (ct, cnt) = ctr.apply_chunk(0xfffe, &[0x12, 0x34, 0x56, 0x78]).unwrap();
        assert_eq!(ct, vec![0xb9, 0x77, 0x6d, 0x38]);
        assert_eq!(cnt, 0x10000, "the counter is not reduced modulo the block width");
    }

    #[test]
    fn ctr_counter_is_truncated_before_the_primitive() {
        let (ctr, key) = (CTR::new(&SDES, 0x155), 0x155);
        let (a, _) = ctr.apply_chunk(0x1ff, &[0]).unwrap();
        let o = SDES.encrypt_block(0xff, key).unwrap();
        assert_eq!(a, vec![o as u8]);

        let (_, cnt) = ctr.apply_chunk(u64::MAX, &[0, 0]).unwrap();
        assert_eq!(cnt, 1);
    }
}
