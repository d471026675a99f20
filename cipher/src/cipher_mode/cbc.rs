use crate::block_cipher::{blocks, check_chunk, mask, put_block};
use crate::{BlockDecrypt, BlockEncrypt, EngineError};

/// Cipher Block Chaining Mode(CBC) <br>
///
/// 每个分片的返回值中带有下一个分片要使用的IV: 加密时是本分片最后输出的密文分组, 解密时是本分片最后读入的密文分组.
/// 空分片原样返回传入的IV.
pub struct CBC<'a, E> {
    cipher: &'a E,
    key: u64,
}

impl<'a, E> CBC<'a, E> {
    pub const fn new(cipher: &'a E, key: u64) -> Self {
        Self { cipher, key }
    }
}

impl<'a, E: BlockEncrypt> CBC<'a, E> {
    fn encrypt_inner(&self, iv: &mut u64, block: u64) -> Result<u64, EngineError> {
        let c = self.cipher.encrypt_block((block ^ *iv) & mask(E::BLOCK_BITS), self.key)?
            & mask(E::BLOCK_BITS);
        *iv = c;
        Ok(c)
    }

    pub fn encrypt_chunk(&self, mut iv: u64, chunk: &[u8]) -> Result<(Vec<u8>, u64), EngineError> {
        let n = E::BLOCK_SIZE;
        check_chunk(chunk, n)?;

        let mut out = Vec::with_capacity(chunk.len());
        for block in blocks(chunk, n) {
            let c = self.encrypt_inner(&mut iv, block)?;
            put_block(&mut out, c, n);
        }
        Ok((out, iv))
    }
}

impl<'a, E: BlockDecrypt> CBC<'a, E> {
    fn decrypt_inner(&self, iv: &mut u64, block: u64) -> Result<u64, EngineError> {
        let p = (self.cipher.decrypt_block(block, self.key)? ^ *iv) & mask(E::BLOCK_BITS);
        *iv = block;
        Ok(p)
    }

    pub fn decrypt_chunk(&self, mut iv: u64, chunk: &[u8]) -> Result<(Vec<u8>, u64), EngineError> {
        let n = E::BLOCK_SIZE;
        check_chunk(chunk, n)?;

        let mut out = Vec::with_capacity(chunk.len());
        for block in blocks(chunk, n) {
            let p = self.decrypt_inner(&mut iv, block)?;
            put_block(&mut out, p, n);
        }
        Ok((out, iv))
    }
}
