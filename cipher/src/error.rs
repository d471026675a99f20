use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// 密钥, IV, 分片大小等运行参数不合法, 在读取任何数据之前检出
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// 分片字节长度不是分组字节长度的整数倍
    #[error("Malformed chunk of `{len}` bytes, not a multiple of block size `{block_size}`")]
    MalformedInput { len: usize, block_size: usize },

    #[error("Block primitive failed on block `{block:#x}`: {reason}")]
    PrimitiveFailure { block: u64, reason: String },

    #[error("Worker pool unavailable: {0}")]
    WorkerPool(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// 配置期错误, 在任何分片被读取之前就终止运行
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidParameter(_) | Self::WorkerPool(_))
    }
}
