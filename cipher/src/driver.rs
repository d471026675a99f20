//! # 流驱动
//!
//! `StreamDriver`负责一次完整的加解密运行: 校验运行参数, 从`source`读取分片, 交给`Scheduler`处理,
//! 按序写入`sink`. 参数错误在读取任何数据之前返回. <br>
//!
//! 运行结束后的链接状态保存在驱动中, 可以用同一个驱动继续处理同一逻辑流的后续数据.

use std::io::{Read, Write};

use crate::block_cipher::{check_spec, check_width};
use crate::cipher_mode::{ChainState, Direction, Mode};
use crate::scheduler::{ChunkReader, RunReport, Scheduler, WorkerPool};
use crate::{BlockCipher, EngineError};

pub const DEFAULT_CHUNK_SIZE: usize = 65536;
pub const DEFAULT_INFLIGHT_PER_WORKER: usize = 2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    pub mode: Mode,
    /// CTR模式下忽略
    pub direction: Direction,
    pub key: u64,
    /// CBC的IV或CTR的nonce, ECB下忽略 <br>
    ///
    /// CBC的IV必须能用分组位宽表示, 否则为`InvalidParameter`; CTR的nonce可以超出分组位宽,
    /// 计数值按`u64`回绕递增, 只在送入分组密码前截断.
    pub iv: Option<u64>,
    pub chunk_size: usize,
    pub concurrent: bool,
    /// `None`表示使用全部CPU核
    pub max_workers: Option<usize>,
    /// 每个工作线程最多允许的未写出分片数
    pub inflight_per_worker: usize,
}

impl RunConfig {
    pub fn new(mode: Mode, direction: Direction, key: u64) -> Self {
        Self {
            mode,
            direction,
            key,
            iv: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrent: true,
            max_workers: None,
            inflight_per_worker: DEFAULT_INFLIGHT_PER_WORKER,
        }
    }

    pub fn iv(mut self, iv: Option<u64>) -> Self {
        self.iv = iv;
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    pub fn max_workers(mut self, max_workers: Option<usize>) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn inflight_per_worker(mut self, n: usize) -> Self {
        self.inflight_per_worker = n;
        self
    }

    fn workers(&self) -> usize {
        self.max_workers.unwrap_or_else(num_cpus::get).max(1)
    }
}

pub struct StreamDriver<'a, E> {
    cipher: &'a E,
    config: RunConfig,
    chain: ChainState,
}

impl<'a, E> StreamDriver<'a, E>
where
    E: BlockCipher + Sync,
{
    pub fn new(cipher: &'a E, config: RunConfig) -> Result<Self, EngineError> {
        check_spec::<E>()?;
        check_width("key", config.key, E::KEY_BITS)?;

        if config.chunk_size == 0 || config.chunk_size % E::BLOCK_SIZE != 0 {
            return Err(EngineError::invalid_parameter(format!(
                "chunk size `{}` need to be a positive multiple of block size `{}`",
                config.chunk_size,
                E::BLOCK_SIZE
            )));
        }

        if config.max_workers == Some(0) {
            return Err(EngineError::invalid_parameter(
                "max workers need to be at least 1",
            ));
        }

        if config.inflight_per_worker == 0 {
            return Err(EngineError::invalid_parameter(
                "in-flight chunks per worker need to be at least 1",
            ));
        }

        let iv = match (config.mode, config.iv) {
            (Mode::ECB, Some(iv)) => {
                log::warn!("IV `{iv:#x}` is ignored in ECB mode");
                None
            }
            (_, iv) => iv,
        };
        if let (Mode::CBC, Some(iv)) = (config.mode, iv) {
            check_width("IV", iv, E::BLOCK_BITS)?;
        }
        let chain = config.mode.initial_state(iv)?;

        Ok(Self {
            cipher,
            config,
            chain,
        })
    }

    /// 从上一次运行的链接状态继续
    pub fn resume(mut self, chain: ChainState) -> Result<Self, EngineError> {
        if !self.config.mode.accepts(chain) {
            return Err(EngineError::invalid_parameter(format!(
                "chain state `{chain:?}` does not belong to {} mode",
                self.config.mode
            )));
        }

        self.chain = chain;
        Ok(self)
    }

    pub const fn chain_state(&self) -> ChainState {
        self.chain
    }

    pub fn run<R: Read, W: Write>(
        &mut self,
        source: R,
        sink: &mut W,
    ) -> Result<RunReport, EngineError> {
        let cfg = &self.config;
        let direction = cfg.mode.normalize(cfg.direction);
        let scheduler = Scheduler::new(self.cipher, cfg.key, cfg.mode, direction);
        let mut reader = ChunkReader::new(source, cfg.chunk_size);

        log::debug!(
            "{} {direction} run, chunk size {}, starting from {:?}",
            cfg.mode,
            cfg.chunk_size,
            self.chain
        );

        let report = if cfg.concurrent && cfg.mode.is_chunk_parallel(direction) {
            let pool = WorkerPool::new(cfg.workers())?;
            let inflight = pool.workers().saturating_mul(cfg.inflight_per_worker);
            scheduler.run_concurrent(&pool, inflight, self.chain, &mut reader, sink)?
        } else {
            if cfg.concurrent {
                log::debug!("CBC encryption chains on its own output, running sequentially");
            }
            scheduler.run_sequential(self.chain, &mut reader, sink)?
        };

        log::debug!(
            "{} {direction} finished: {} chunks, {} bytes read, {} bytes written",
            cfg.mode,
            report.chunks,
            report.read,
            report.written
        );
        self.chain = report.chain;
        Ok(report)
    }
}

/// 用`cipher`对`source`执行一次完整的工作模式变换并写入`sink`
#[allow(clippy::too_many_arguments)]
pub fn run<E, R, W>(
    cipher: &E,
    mode: Mode,
    direction: Direction,
    key: u64,
    iv: Option<u64>,
    chunk_size: usize,
    concurrent: bool,
    max_workers: Option<usize>,
    source: R,
    sink: &mut W,
) -> Result<(), EngineError>
where
    E: BlockCipher + Sync,
    R: Read,
    W: Write,
{
    let config = RunConfig::new(mode, direction, key)
        .iv(iv)
        .chunk_size(chunk_size)
        .concurrent(concurrent)
        .max_workers(max_workers);

    StreamDriver::new(cipher, config)?
        .run(source, sink)
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::{run, RunConfig, StreamDriver};
    use crate::block_cipher::{SAES, SDES};
    use crate::cipher_mode::{ChainState, Direction, Mode};
    use crate::EngineError;
    use std::io::Read;

    const KEY: u64 = 0b1010000010;
    const MSG: [u8; 4] = [0x12, 0x34, 0x56, 0x78];

    #[test]
    fn cbc_scenario_chunk_size_independent() {
        for (chunk_size, concurrent) in [(1, false), (2, false), (4, false), (2, true), (4, true)] {
            let mut out: Vec<u8> = vec![];
            run(
                &SDES,
                Mode::CBC,
                Direction::Encrypt,
                KEY,
                Some(0),
                chunk_size,
                concurrent,
                Some(2),
                MSG.as_slice(),
                &mut out,
            )
            .unwrap();
            assert_eq!(out, vec![0x4b, 0x88, 0x57, 0xfb], "chunk size {chunk_size}");
        }
    }

    #[test]
    fn config_errors_before_any_read() {
        struct Untouchable;
        impl Read for Untouchable {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                panic!("source read on a rejected configuration");
            }
        }

        let cases = [
            RunConfig::new(Mode::CBC, Direction::Encrypt, KEY),
            RunConfig::new(Mode::CTR, Direction::Encrypt, KEY),
            RunConfig::new(Mode::ECB, Direction::Encrypt, 1 << 10),
            RunConfig::new(Mode::CBC, Direction::Decrypt, KEY).iv(Some(0x100)),
            RunConfig::new(Mode::ECB, Direction::Encrypt, KEY).chunk_size(0),
            RunConfig::new(Mode::ECB, Direction::Encrypt, KEY).max_workers(Some(0)),
            RunConfig::new(Mode::ECB, Direction::Encrypt, KEY).inflight_per_worker(0),
        ];
        for cfg in cases {
            let res = StreamDriver::new(&SDES, cfg.clone())
                .and_then(|mut d| d.run(Untouchable, &mut Vec::<u8>::new()));
            assert!(
                matches!(res, Err(EngineError::InvalidParameter(_))),
                "{cfg:?}"
            );
        }

        let odd = RunConfig::new(Mode::ECB, Direction::Encrypt, 0xa73b).chunk_size(3);
        assert!(StreamDriver::new(&SAES, odd).is_err());
    }

    #[test]
    fn ctr_nonce_may_exceed_block_width() {
        let cfg = RunConfig::new(Mode::CTR, Direction::Decrypt, KEY).iv(Some(0x1_0000_0040));
        let mut out: Vec<u8> = vec![];
        StreamDriver::new(&SDES, cfg).unwrap().run(MSG.as_slice(), &mut out).unwrap();
        assert_eq!(out, vec![0xe8, 0x21, 0x4f, 0x3c]);
    }

    #[test]
    fn malformed_tail_keeps_earlier_chunks() {
        for concurrent in [false, true] {
            let cfg = RunConfig::new(Mode::ECB, Direction::Decrypt, 0xa73b)
                .chunk_size(4)
                .concurrent(concurrent)
                .max_workers(Some(3));

            let mut out: Vec<u8> = vec![];
            let res = StreamDriver::new(&SAES, cfg)
                .unwrap()
                .run([0x07u8, 0x38, 0x07, 0x38, 0x07].as_slice(), &mut out);

            assert!(matches!(
                res,
                Err(EngineError::MalformedInput { len: 1, block_size: 2 })
            ));
            assert_eq!(out, vec![0x6f, 0x6b, 0x6f, 0x6b], "concurrent: {concurrent}");
        }
    }

    #[test]
    fn resume_continues_a_logical_stream() {
        let data = (0u8..64).collect::<Vec<_>>();

        for mode in [Mode::CBC, Mode::CTR] {
            let cfg = RunConfig::new(mode, Direction::Encrypt, 0xa73b)
                .iv(Some(0x1234))
                .chunk_size(6);

            let mut whole: Vec<u8> = vec![];
            StreamDriver::new(&SAES, cfg.clone())
                .unwrap()
                .run(data.as_slice(), &mut whole)
                .unwrap();

            let mut first = StreamDriver::new(&SAES, cfg.clone()).unwrap();
            let mut parts: Vec<u8> = vec![];
            let report = first.run(&data[..20], &mut parts).unwrap();
            assert_eq!(report.chain, first.chain_state());

            let mut second = StreamDriver::new(&SAES, cfg).unwrap().resume(report.chain).unwrap();
            second.run(&data[20..], &mut parts).unwrap();

            assert_eq!(parts, whole, "{mode}");
        }
    }

    #[test]
    fn resume_rejects_foreign_state() {
        let cfg = RunConfig::new(Mode::ECB, Direction::Encrypt, KEY);
        let d = StreamDriver::new(&SDES, cfg).unwrap();
        assert!(d.resume(ChainState::Counter(3)).is_err());
    }

    #[test]
    fn iv_width_checked_for_cbc_only() {
        let cbc = RunConfig::new(Mode::CBC, Direction::Encrypt, KEY).iv(Some(0x1ff));
        assert!(matches!(
            StreamDriver::new(&SDES, cbc),
            Err(EngineError::InvalidParameter(_))
        ));

        let ctr = RunConfig::new(Mode::CTR, Direction::Encrypt, KEY).iv(Some(0x1ff));
        let d = StreamDriver::new(&SDES, ctr).unwrap();
        assert_eq!(d.chain_state(), ChainState::Counter(0x1ff));
    }

    #[test]
    fn ecb_ignores_iv() {
        let cfg = RunConfig::new(Mode::ECB, Direction::Encrypt, KEY).iv(Some(u64::MAX));
        let d = StreamDriver::new(&SDES, cfg).unwrap();
        assert_eq!(d.chain_state(), ChainState::None);
    }
}
