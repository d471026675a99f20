use std::collections::BTreeMap;
use std::io::Write;

use crate::EngineError;

pub(crate) type ChunkResult = Result<Vec<u8>, EngineError>;

/// 按分片序号顺序写出结果 <br>
///
/// 乱序到达的结果先缓存, 直到下一个待写序号就绪. 失败的分片同样按序号排队: 写到它时返回其错误,
/// 它之前的分片都已写出, 它以及之后的分片都不会写出.
pub struct OrderedWriter<'a, W: Write> {
    out: &'a mut W,
    next: u64,
    pending: BTreeMap<u64, ChunkResult>,
    written: usize,
    failed: Option<u64>,
}

impl<'a, W: Write> OrderedWriter<'a, W> {
    pub fn new(out: &'a mut W) -> Self {
        Self {
            out,
            next: 0,
            pending: BTreeMap::new(),
            written: 0,
            failed: None,
        }
    }

    pub fn push(&mut self, index: u64, res: ChunkResult) -> Result<(), EngineError> {
        if index < self.next {
            return Err(EngineError::invalid_parameter(format!(
                "chunk {index} already written"
            )));
        }

        if res.is_err() {
            log::trace!("chunk {index} failed, queued behind chunk {}", self.next);
            self.failed = Some(self.failed.map_or(index, |f| f.min(index)));
        }

        self.pending.insert(index, res);
        self.flush_ready()
    }

    fn flush_ready(&mut self) -> Result<(), EngineError> {
        while let Some(res) = self.pending.remove(&self.next) {
            let data = res?;
            self.out.write_all(data.as_slice())?;
            log::trace!("chunk {} written, {} bytes", self.next, data.len());
            self.written += data.len();
            self.next += 1;
        }
        Ok(())
    }

    /// 下一个待写出的分片序号
    pub const fn next_index(&self) -> u64 {
        self.next
    }

    /// 已有分片失败, 不应再分发新的分片
    pub const fn is_aborted(&self) -> bool {
        self.failed.is_some()
    }

    pub const fn write_len(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> Result<(), EngineError> {
        self.out.flush().map_err(EngineError::from)
    }
}
