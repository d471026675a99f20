use std::path::Path;
use std::sync::OnceLock;

use cipher::driver::{DEFAULT_CHUNK_SIZE, DEFAULT_INFLIGHT_PER_WORKER};
use config::{Config, ConfigError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct BlockmodeConfig {
    // byte size of one chunk
    pub chunk_size: usize,

    // maximum creatable worker threads
    pub threads: usize,

    // chunks allowed in flight per worker thread
    pub inflight_per_worker: usize,
}

impl Default for BlockmodeConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            threads: num_cpus::get().max(1),
            inflight_per_worker: DEFAULT_INFLIGHT_PER_WORKER,
        }
    }
}

impl BlockmodeConfig {
    /// 只有第一次调用时的`f`生效
    pub fn config_with_file(f: Option<&Path>) -> &'static Self {
        static CONFIG: OnceLock<BlockmodeConfig> = OnceLock::new();

        CONFIG.get_or_init(|| {
            Self::load(f).unwrap_or_else(|e| {
                log::warn!("load config failed, fall back to default: {e}");
                Self::default()
            })
        })
    }

    /// 默认值 -> `BLOCKMODE__`前缀的环境变量 -> 配置文件
    pub fn load(f: Option<&Path>) -> Result<Self, ConfigError> {
        let default_config = Config::try_from(&BlockmodeConfig::default())?;

        let mut config = Config::builder().add_source(default_config).add_source(
            config::Environment::with_prefix("BLOCKMODE")
                .try_parsing(true)
                .separator("__"),
        );

        if let Some(f) = f {
            config = config.add_source(config::File::from(f).required(false));
        }

        let mut cfg: BlockmodeConfig = config.build()?.try_deserialize()?;

        cfg.threads = cfg.threads.max(1);
        cfg.inflight_per_worker = cfg.inflight_per_worker.max(1);

        log::trace!("{:?}", cfg);

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::BlockmodeConfig;
    use std::io::Write;

    #[test]
    fn file_overrides_defaults() {
        let mut f = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(f, r#"{{"chunk_size": 4096, "threads": 0}}"#).unwrap();
        f.flush().unwrap();

        let cfg = BlockmodeConfig::load(Some(f.path())).unwrap();
        assert_eq!(cfg.chunk_size, 4096);
        assert_eq!(cfg.threads, 1);
        assert_eq!(cfg.inflight_per_worker, 2);
    }

    #[test]
    fn missing_file_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = BlockmodeConfig::load(Some(&dir.path().join("none.json"))).unwrap();
        assert!(cfg.threads >= 1);
    }
}
