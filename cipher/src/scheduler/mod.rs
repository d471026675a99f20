//! # 分片调度
//!
//! 输入流被切分为固定大小的分片, 每个分片连同它的链接状态构成一个独立的任务(`Job`). 调度的核心是在分发之前
//! 算出每个分片的链接状态:
//!
//! | 模式 | 分片`i`的链接状态 | 分发方式 |
//! |---|---|---|
//! | ECB | 无 | 并行 |
//! | CBC 加密 | 分片`i-1`**输出**的最后一个密文分组 | 只能顺序执行 |
//! | CBC 解密 | 分片`i-1`**读入**的最后一个密文分组 | 并行 |
//! | CTR | `nonce`加上分片`i`之前的分组数 | 并行 |
//!
//! 无论任务以什么顺序完成, 结果都按分片序号写出. 任一分片失败后不再分发新分片, 该分片之前的结果照常写出,
//! 该分片及其之后的结果全部丢弃.

use std::io::{Read, Write};
use std::panic::{catch_unwind, AssertUnwindSafe};

use crossbeam::channel;

use crate::block_cipher::{check_chunk, last_block};
use crate::cipher_mode::{transform, ChainState, Direction, Mode};
use crate::{BlockCipher, EngineError};

mod chunk;
mod ordered;
mod pool;
pub use chunk::ChunkReader;
pub use ordered::OrderedWriter;
pub use pool::WorkerPool;

use ordered::ChunkResult;

/// 一次运行的统计和最终的链接状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub chunks: u64,
    /// 读入的字节数
    pub read: usize,
    /// 写出的字节数
    pub written: usize,
    /// 可用于继续处理同一逻辑流的链接状态
    pub chain: ChainState,
}

/// 只依据输入字节推算每个分片的链接状态 <br>
///
/// CBC加密的链接状态依赖输出, 无法提前推算.
pub struct ChainPlanner {
    mode: Mode,
    block_size: usize,
    state: ChainState,
}

impl ChainPlanner {
    pub fn new(
        mode: Mode,
        direction: Direction,
        block_size: usize,
        initial: ChainState,
    ) -> Result<Self, EngineError> {
        if !mode.is_chunk_parallel(direction) {
            return Err(EngineError::invalid_parameter(format!(
                "{mode} {direction}ion chains on produced output and cannot be planned ahead"
            )));
        }

        if !mode.accepts(initial) {
            return Err(EngineError::invalid_parameter(format!(
                "chain state `{initial:?}` does not belong to {mode} mode"
            )));
        }

        Ok(Self {
            mode,
            block_size,
            state: initial,
        })
    }

    /// 返回`chunk`的链接状态, 并前进到下一个分片
    pub fn plan(&mut self, chunk: &[u8]) -> Result<ChainState, EngineError> {
        check_chunk(chunk, self.block_size)?;

        let state_in = self.state;
        self.state = match (self.mode, state_in) {
            (Mode::CTR, ChainState::Counter(c)) => {
                ChainState::Counter(c.wrapping_add((chunk.len() / self.block_size) as u64))
            }
            // 解密的下一个IV是读入的密文, 而不是解密的输出
            (Mode::CBC, ChainState::Iv(iv)) => {
                ChainState::Iv(last_block(chunk, self.block_size).unwrap_or(iv))
            }
            (_, s) => s,
        };

        Ok(state_in)
    }

    /// 已规划的所有分片之后的链接状态
    pub const fn state(&self) -> ChainState {
        self.state
    }
}

/// 一个分片的计算任务, 拥有自己的数据和链接状态
pub struct Job {
    index: u64,
    data: Vec<u8>,
    state: ChainState,
}

impl Job {
    pub const fn new(index: u64, data: Vec<u8>, state: ChainState) -> Self {
        Self { index, data, state }
    }

    pub const fn index(&self) -> u64 {
        self.index
    }

    pub fn run<E: BlockCipher>(
        &self,
        cipher: &E,
        key: u64,
        mode: Mode,
        direction: Direction,
    ) -> Result<(Vec<u8>, ChainState), EngineError> {
        transform(cipher, key, mode, direction, self.state, &self.data)
    }

    /// 分组密码的panic被视为原语失败, 保证每个任务都有结果
    fn run_guarded<E: BlockCipher>(
        &self,
        cipher: &E,
        key: u64,
        mode: Mode,
        direction: Direction,
    ) -> Result<(Vec<u8>, ChainState), EngineError> {
        catch_unwind(AssertUnwindSafe(|| self.run(cipher, key, mode, direction))).unwrap_or_else(
            |_| {
                Err(EngineError::PrimitiveFailure {
                    block: 0,
                    reason: format!("block primitive panicked on chunk {}", self.index),
                })
            },
        )
    }
}

pub struct Scheduler<'a, E> {
    cipher: &'a E,
    key: u64,
    mode: Mode,
    direction: Direction,
}

impl<'a, E> Scheduler<'a, E>
where
    E: BlockCipher + Sync,
{
    pub fn new(cipher: &'a E, key: u64, mode: Mode, direction: Direction) -> Self {
        Self {
            cipher,
            key,
            mode,
            direction: mode.normalize(direction),
        }
    }

    /// 在当前线程上逐个分片处理, 链接状态取自上一个分片的变换输出
    pub fn run_sequential<R: Read, W: Write>(
        &self,
        initial: ChainState,
        source: &mut ChunkReader<R>,
        sink: &mut W,
    ) -> Result<RunReport, EngineError> {
        let (mut state, mut chunks, mut written) = (initial, 0u64, 0usize);

        while let Some(chunk) = source.next_chunk()? {
            let job = Job::new(chunks, chunk, state);
            let (out, next) = job
                .run_guarded(self.cipher, self.key, self.mode, self.direction)
                .map_err(|e| {
                    log::error!("chunk {chunks} failed: {e}");
                    e
                })?;

            sink.write_all(out.as_slice())?;
            log::trace!("chunk {chunks} written, {} bytes", out.len());
            state = next;
            chunks += 1;
            written += out.len();
        }
        sink.flush()?;

        Ok(RunReport {
            chunks,
            read: source.read_len(),
            written,
            chain: state,
        })
    }

    /// 链接状态由`ChainPlanner`在分发前推算, 分片在`pool`中并行处理, 最多`inflight`个分片未写出
    pub fn run_concurrent<R: Read, W: Write>(
        &self,
        pool: &WorkerPool,
        inflight: usize,
        initial: ChainState,
        source: &mut ChunkReader<R>,
        sink: &mut W,
    ) -> Result<RunReport, EngineError> {
        let mut planner = ChainPlanner::new(self.mode, self.direction, E::BLOCK_SIZE, initial)?;
        let (tx, rx) = channel::unbounded::<(u64, ChunkResult)>();
        let mut writer = OrderedWriter::new(sink);
        let (cipher, key, mode, direction, bound) = (
            self.cipher,
            self.key,
            self.mode,
            self.direction,
            inflight.max(1) as u64,
        );

        let issued = pool.scope(|s| -> Result<u64, EngineError> {
            let mut issued = 0u64;

            while !writer.is_aborted() {
                let planned = source
                    .next_chunk()
                    .map_err(EngineError::from)
                    .and_then(|chunk| match chunk {
                        Some(chunk) => planner.plan(&chunk).map(|state| Some((chunk, state))),
                        None => Ok(None),
                    });

                let (chunk, state) = match planned {
                    Ok(Some(x)) => x,
                    Ok(None) => break,
                    Err(e) => {
                        log::error!("chunk {issued} rejected: {e}");
                        writer.push(issued, Err(e))?;
                        issued += 1;
                        break;
                    }
                };

                log::trace!("chunk {issued} dispatched with {state:?}");
                let (job, tx) = (Job::new(issued, chunk, state), tx.clone());
                s.spawn(move |_| {
                    let res = job
                        .run_guarded(cipher, key, mode, direction)
                        .map(|(out, _)| out);
                    // 接收端只会在运行中止后关闭
                    let _ = tx.send((job.index(), res));
                });
                issued += 1;

                while let Ok((i, res)) = rx.try_recv() {
                    writer.push(i, res)?;
                }

                while issued - writer.next_index() >= bound {
                    Self::recv_into(&rx, &mut writer)?;
                }
            }

            while writer.next_index() < issued {
                Self::recv_into(&rx, &mut writer)?;
            }

            Ok(issued)
        });

        let issued = issued.map_err(|e| {
            log::error!("concurrent run aborted: {e}");
            e
        })?;
        writer.flush()?;

        Ok(RunReport {
            chunks: issued,
            read: source.read_len(),
            written: writer.write_len(),
            chain: planner.state(),
        })
    }

    fn recv_into<W: Write>(
        rx: &channel::Receiver<(u64, ChunkResult)>,
        writer: &mut OrderedWriter<'_, W>,
    ) -> Result<(), EngineError> {
        let (i, res) = rx
            .recv()
            .map_err(|e| EngineError::WorkerPool(format!("result channel closed: {e}")))?;
        writer.push(i, res)
    }
}
