//! # Block Cipher Mode of Operation
//!
//! [NIST 800-38A, Recommendation for Block Cipher Modes of operation Methods and Techniques](https://nvlpubs.nist.gov/nistpubs/Legacy/SP/nistspecialpublication800-38a.pdf)<br>
//! <br>
//! 这里的每种工作模式都只处理一个分片(chunk), 输入分片和链接状态, 输出处理后的字节和下一个分片
//! 需要的链接状态. 变换本身不持有任何可变的共享状态, 因此在链接状态确定之后, 不同分片可以在任意线程上计算. <br>
//! <br>
//! ## The Electronic Codebook Mode(ECB)
//!
//! $$
//! C_j = Encrypt(P_j), j = 1...n
//! $$
//!
//! 没有链接状态, 加解密都可并行. <br>
//! <br>
//! ## The Cipher Block Chaining Mode(CBC)
//!
//! $$
//! C_1 = Encrypt(P_1 \xor IV); C_j = Encrypt(P_j \xor C_{j-1}), j = 2...n
//!
//! P_1 = Decrypt(C_1) \xor IV; P_j = Decrypt(C_j) \xor C_{j-1}, j = 2...n
//! $$
//!
//! 加密时下一个分片的IV是本分片**输出**的最后一个密文分组, 只能顺序计算; 解密时下一个分片的IV是本分片
//! **输入**的最后一个密文分组, 读到分片边界即可确定, 因此解密可以并行. <br>
//! <br>
//! ## The Counter Mode(CTR)
//!
//! $$
//! O_j = Encrypt(T + j); C_j = P_j \xor O_j
//! $$
//!
//! 计数值$T$不对分组位宽取模, 只在送入分组密码前截断. 第$i$个分片的计数基值等于`nonce`加上该分片之前
//! 的分组数, 只依赖分片位置, 加解密都可并行.

use crate::{BlockCipher, EngineError};

mod cbc;
mod ctr;
mod ecb;
pub use cbc::CBC;
pub use ctr::CTR;
pub use ecb::ECB;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    ECB,
    CBC,
    CTR,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

/// 分片之间传递的链接状态
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChainState {
    /// ECB
    None,
    /// CBC: 上一个密文分组
    Iv(u64),
    /// CTR: 下一个未使用的计数值
    Counter(u64),
}

impl Mode {
    /// 分片之间是否没有输出依赖, 即链接状态是否能在分发之前算出
    pub const fn is_chunk_parallel(self, direction: Direction) -> bool {
        !matches!((self, direction), (Mode::CBC, Direction::Encrypt))
    }

    /// CTR的加解密是同一个运算
    pub const fn normalize(self, direction: Direction) -> Direction {
        match self {
            Mode::CTR => Direction::Encrypt,
            _ => direction,
        }
    }

    /// 由调用者提供的IV/nonce生成第一个分片的链接状态
    pub fn initial_state(self, iv: Option<u64>) -> Result<ChainState, EngineError> {
        match (self, iv) {
            (Mode::ECB, _) => Ok(ChainState::None),
            (Mode::CBC, Some(iv)) => Ok(ChainState::Iv(iv)),
            (Mode::CTR, Some(nonce)) => Ok(ChainState::Counter(nonce)),
            (mode, None) => Err(EngineError::invalid_parameter(format!(
                "{mode} mode requires an IV or nonce"
            ))),
        }
    }

    pub fn accepts(self, state: ChainState) -> bool {
        matches!(
            (self, state),
            (Mode::ECB, ChainState::None)
                | (Mode::CBC, ChainState::Iv(_))
                | (Mode::CTR, ChainState::Counter(_))
        )
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Mode::ECB => "ECB",
            Mode::CBC => "CBC",
            Mode::CTR => "CTR",
        })
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Direction::Encrypt => "encrypt",
            Direction::Decrypt => "decrypt",
        })
    }
}

/// 对一个分片执行工作模式变换, 返回(输出字节, 下一个分片的链接状态)
pub fn transform<E: BlockCipher>(
    cipher: &E,
    key: u64,
    mode: Mode,
    direction: Direction,
    state: ChainState,
    chunk: &[u8],
) -> Result<(Vec<u8>, ChainState), EngineError> {
    match (mode, state) {
        (Mode::ECB, ChainState::None) => {
            let ecb = ECB::new(cipher, key);
            let out = match direction {
                Direction::Encrypt => ecb.encrypt_chunk(chunk)?,
                Direction::Decrypt => ecb.decrypt_chunk(chunk)?,
            };
            Ok((out, ChainState::None))
        }
        (Mode::CBC, ChainState::Iv(iv)) => {
            let cbc = CBC::new(cipher, key);
            let (out, iv) = match direction {
                Direction::Encrypt => cbc.encrypt_chunk(iv, chunk)?,
                Direction::Decrypt => cbc.decrypt_chunk(iv, chunk)?,
            };
            Ok((out, ChainState::Iv(iv)))
        }
        (Mode::CTR, ChainState::Counter(cnt)) => {
            let (out, cnt) = CTR::new(cipher, key).apply_chunk(cnt, chunk)?;
            Ok((out, ChainState::Counter(cnt)))
        }
        (mode, state) => Err(EngineError::invalid_parameter(format!(
            "chain state `{state:?}` does not belong to {mode} mode"
        ))),
    }
}
