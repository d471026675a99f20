//! # 分组密码工作模式引擎
//!
//! 在任意大小的字节流上以ECB/CBC/CTR模式运行分组密码. 字节流被切分为固定大小的分片, 分片之间的链接状态
//! (CBC的IV, CTR的计数值)被正确传递, 使得分片处理与整体处理的结果逐字节相同; 在模式的数据依赖允许时,
//! 分片被并行处理并按原顺序写出.
//!
//! - `block_cipher`: 分组密码原语的接口, 以及S-DES/S-AES两个教学用分组密码;
//! - `cipher_mode`: 单个分片上的工作模式变换;
//! - `scheduler`: 分片切分, 链接状态推算, 并行分发和有序重组;
//! - `driver`: 一次完整运行的参数校验和编排;

mod error;
pub use error::EngineError;

pub mod block_cipher;
pub use block_cipher::{BlockCipher, BlockDecrypt, BlockEncrypt, BlockSpec};

pub mod cipher_mode;
pub use cipher_mode::{transform, ChainState, Direction, Mode};

pub mod scheduler;
pub use scheduler::RunReport;

pub mod driver;
pub use driver::{run, RunConfig, StreamDriver};
