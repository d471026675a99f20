//! ## Simplified AES(S-AES)
//!
//! Musa, Schaefer, Wedig: *A Simplified AES Algorithm and Its Linear and Differential Cryptanalyses*
//!
//! 分组16位, 密钥16位, 状态为4个半字节$s_0 s_1 s_2 s_3$(按列排列). 两轮变换:
//!
//! $$
//! C = A_{K_2} \circ SR \circ NS \circ A_{K_1} \circ MC \circ SR \circ NS \circ A_{K_0}(P)
//! $$
//!
//! `MixColumns`在$GF(2^4)$上计算, 既约多项式为$x^4 + x + 1$.

use crate::{BlockDecrypt, BlockEncrypt, BlockSpec, EngineError};

const SBOX: [u8; 16] = [
    0x9, 0x4, 0xa, 0xb, 0xd, 0x1, 0x8, 0x5, 0x6, 0x2, 0x0, 0x3, 0xc, 0xe, 0xf, 0x7,
];

const INV_SBOX: [u8; 16] = [
    0xa, 0x5, 0x9, 0xb, 0x1, 0x7, 0x8, 0xf, 0x6, 0x0, 0x2, 0x3, 0xc, 0x4, 0xd, 0xe,
];

const MIX: [u8; 4] = [1, 4, 4, 1];
const INV_MIX: [u8; 4] = [9, 2, 2, 9];

type State = [u8; 4];

#[derive(Clone, Copy, Debug, Default)]
pub struct SAES;

impl SAES {
    fn gf_mul(mut a: u8, mut b: u8) -> u8 {
        let mut p = 0;
        while b != 0 {
            if b & 1 != 0 {
                p ^= a;
            }
            a <<= 1;
            if a & 0x10 != 0 {
                a ^= 0x13;
            }
            b >>= 1;
        }
        p & 0xf
    }

    fn sub_word(w: u8) -> u8 {
        (SBOX[(w >> 4) as usize] << 4) | SBOX[(w & 0xf) as usize]
    }

    const fn rot_word(w: u8) -> u8 {
        w.rotate_left(4)
    }

    /// 返回`[K0, K1, K2]`, 每个轮密钥由两个字节组成
    fn expand_key(key: u64) -> [[u8; 2]; 3] {
        let (w0, w1) = (((key >> 8) & 0xff) as u8, (key & 0xff) as u8);
        let w2 = w0 ^ Self::sub_word(Self::rot_word(w1)) ^ 0x80;
        let w3 = w2 ^ w1;
        let w4 = w2 ^ Self::sub_word(Self::rot_word(w3)) ^ 0x30;
        let w5 = w4 ^ w3;
        [[w0, w1], [w2, w3], [w4, w5]]
    }

    fn to_state(block: u64) -> State {
        [
            ((block >> 12) & 0xf) as u8,
            ((block >> 8) & 0xf) as u8,
            ((block >> 4) & 0xf) as u8,
            (block & 0xf) as u8,
        ]
    }

    fn from_state(s: State) -> u64 {
        s.iter().fold(0u64, |acc, &n| (acc << 4) | u64::from(n))
    }

    fn add_round_key(s: State, rk: [u8; 2]) -> State {
        [s[0] ^ (rk[0] >> 4), s[1] ^ (rk[0] & 0xf), s[2] ^ (rk[1] >> 4), s[3] ^ (rk[1] & 0xf)]
    }

    fn sub_nibbles(s: State, sbox: &[u8; 16]) -> State {
        s.map(|n| sbox[n as usize])
    }

    const fn shift_rows(s: State) -> State {
        [s[0], s[3], s[2], s[1]]
    }

    fn mix_columns(s: State, c: &[u8; 4]) -> State {
        let g = Self::gf_mul;
        [
            g(c[0], s[0]) ^ g(c[2], s[1]),
            g(c[1], s[0]) ^ g(c[3], s[1]),
            g(c[0], s[2]) ^ g(c[2], s[3]),
            g(c[1], s[2]) ^ g(c[3], s[3]),
        ]
    }
}

impl BlockSpec for SAES {
    const BLOCK_BITS: u32 = 16;
    const KEY_BITS: u32 = 16;
}

impl BlockEncrypt for SAES {
    fn encrypt_block(&self, block: u64, key: u64) -> Result<u64, EngineError> {
        let k = Self::expand_key(key);
        let s = Self::add_round_key(Self::to_state(block), k[0]);

        let s = Self::shift_rows(Self::sub_nibbles(s, &SBOX));
        let s = Self::add_round_key(Self::mix_columns(s, &MIX), k[1]);

        let s = Self::shift_rows(Self::sub_nibbles(s, &SBOX));
        Ok(Self::from_state(Self::add_round_key(s, k[2])))
    }
}

impl BlockDecrypt for SAES {
    fn decrypt_block(&self, block: u64, key: u64) -> Result<u64, EngineError> {
        let k = Self::expand_key(key);
        let s = Self::add_round_key(Self::to_state(block), k[2]);

        let s = Self::sub_nibbles(Self::shift_rows(s), &INV_SBOX);
        let s = Self::mix_columns(Self::add_round_key(s, k[1]), &INV_MIX);

        let s = Self::sub_nibbles(Self::shift_rows(s), &INV_SBOX);
        Ok(Self::from_state(Self::add_round_key(s, k[0])))
    }
}
