//! ## Simplified DES(S-DES)
//!
//! [Cryptography and Network Security, Appendix G](https://williamstallings.com/Cryptography/)
//!
//! 分组8位, 密钥10位. 由`P10`, 循环左移和`P8`生成两个子密钥`K1`, `K2`:
//!
//! $$
//! C = IP^{-1}(f_{K2}(SW(f_{K1}(IP(P)))))
//!
//! P = IP^{-1}(f_{K1}(SW(f_{K2}(IP(C)))))
//! $$
//!
//! 仅用于教学, 不提供任何安全性.

use crate::{BlockDecrypt, BlockEncrypt, BlockSpec, EngineError};

// 置换表中的位置从1开始, 1表示最高有效位
const P10: [u8; 10] = [3, 5, 2, 7, 4, 10, 1, 9, 8, 6];
const P8: [u8; 8] = [6, 3, 7, 4, 8, 5, 10, 9];
const P4: [u8; 4] = [2, 4, 3, 1];
const IP: [u8; 8] = [2, 6, 3, 1, 4, 8, 5, 7];
const IP_INV: [u8; 8] = [4, 1, 3, 5, 7, 2, 8, 6];
const EP: [u8; 8] = [4, 1, 2, 3, 2, 3, 4, 1];

const S0: [[u16; 4]; 4] = [[1, 0, 3, 2], [3, 2, 1, 0], [0, 2, 1, 3], [3, 1, 3, 2]];
const S1: [[u16; 4]; 4] = [[0, 1, 2, 3], [2, 0, 1, 3], [3, 0, 1, 0], [2, 1, 0, 3]];

#[derive(Clone, Copy, Debug, Default)]
pub struct SDES;

impl SDES {
    fn permute(x: u16, table: &[u8], in_bits: u8) -> u16 {
        table
            .iter()
            .fold(0, |acc, &p| (acc << 1) | ((x >> (in_bits - p)) & 1))
    }

    fn rotl5(x: u16) -> u16 {
        ((x << 1) | (x >> 4)) & 0x1f
    }

    fn shift_halves(k: u16) -> u16 {
        (Self::rotl5(k >> 5) << 5) | Self::rotl5(k & 0x1f)
    }

    fn subkeys(key: u64) -> (u16, u16) {
        let k = Self::shift_halves(Self::permute((key & 0x3ff) as u16, &P10, 10));
        let k1 = Self::permute(k, &P8, 10);
        let k = Self::shift_halves(Self::shift_halves(k));
        (k1, Self::permute(k, &P8, 10))
    }

    fn sbox(sbox: &[[u16; 4]; 4], x: u16) -> u16 {
        let (row, col) = (
            (((x >> 3) & 1) << 1) | (x & 1),
            (((x >> 2) & 1) << 1) | ((x >> 1) & 1),
        );
        sbox[row as usize][col as usize]
    }

    fn f_k(x: u16, subkey: u16) -> u16 {
        let (left, right) = (x >> 4, x & 0xf);
        let d = Self::permute(right, &EP, 4) ^ subkey;
        let d = (Self::sbox(&S0, d >> 4) << 2) | Self::sbox(&S1, d & 0xf);
        let d = Self::permute(d, &P4, 4);
        ((left ^ d) << 4) | right
    }

    const fn switch(x: u16) -> u16 {
        ((x & 0xf) << 4) | (x >> 4)
    }

    fn crypt(block: u64, first: u16, second: u16) -> u64 {
        let x = Self::permute((block & 0xff) as u16, &IP, 8);
        let x = Self::f_k(Self::switch(Self::f_k(x, first)), second);
        u64::from(Self::permute(x, &IP_INV, 8))
    }
}

impl BlockSpec for SDES {
    const BLOCK_BITS: u32 = 8;
    const KEY_BITS: u32 = 10;
}

impl BlockEncrypt for SDES {
    fn encrypt_block(&self, block: u64, key: u64) -> Result<u64, EngineError> {
        let (k1, k2) = Self::subkeys(key);
        Ok(Self::crypt(block, k1, k2))
    }
}

impl BlockDecrypt for SDES {
    fn decrypt_block(&self, block: u64, key: u64) -> Result<u64, EngineError> {
        let (k1, k2) = Self::subkeys(key);
        Ok(Self::crypt(block, k2, k1))
    }
}
