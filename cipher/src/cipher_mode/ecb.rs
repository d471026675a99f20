use crate::block_cipher::{blocks, check_chunk, mask, put_block};
use crate::{BlockDecrypt, BlockEncrypt, EngineError};

/// Electronic Codebook Mode <br>
///
/// 给定的密钥, 每个明文块和密文块一一对应(如果不期待使用这一特性, 不应该使用ECB模式).
pub struct ECB<'a, E> {
    cipher: &'a E,
    key: u64,
}

impl<'a, E> ECB<'a, E> {
    pub const fn new(cipher: &'a E, key: u64) -> Self {
        Self { cipher, key }
    }
}

impl<'a, E: BlockEncrypt> ECB<'a, E> {
    pub fn encrypt_chunk(&self, chunk: &[u8]) -> Result<Vec<u8>, EngineError> {
        let n = E::BLOCK_SIZE;
        check_chunk(chunk, n)?;

        let mut out = Vec::with_capacity(chunk.len());
        for block in blocks(chunk, n) {
            let c = self.cipher.encrypt_block(block, self.key)?;
            put_block(&mut out, c & mask(E::BLOCK_BITS), n);
        }
        Ok(out)
    }
}

impl<'a, E: BlockDecrypt> ECB<'a, E> {
    pub fn decrypt_chunk(&self, chunk: &[u8]) -> Result<Vec<u8>, EngineError> {
        let n = E::BLOCK_SIZE;
        check_chunk(chunk, n)?;

        let mut out = Vec::with_capacity(chunk.len());
        for block in blocks(chunk, n) {
            let p = self.cipher.decrypt_block(block, self.key)?;
            put_block(&mut out, p & mask(E::BLOCK_BITS), n);
        }
        Ok(out)
    }
}
