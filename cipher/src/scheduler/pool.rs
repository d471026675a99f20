use rayon::{Scope, ThreadPool, ThreadPoolBuilder};

use crate::EngineError;

/// 单次运行独占的线程池 <br>
///
/// 所有任务都在`scope`内派发, `scope`返回前会等待全部任务结束; 线程池随运行结束被释放.
pub struct WorkerPool {
    pool: ThreadPool,
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self, EngineError> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("blockmode-worker-{i}"))
            .build()
            .map_err(|e| EngineError::WorkerPool(format!("{e}")))?;

        log::debug!("worker pool started with {workers} threads");
        Ok(Self { pool, workers })
    }

    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// `op`在当前线程执行, 其中派发的任务在池中执行
    pub fn scope<'scope, OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce(&Scope<'scope>) -> R,
    {
        self.pool.in_place_scope(op)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        log::debug!("worker pool with {} threads released", self.workers);
    }
}

#[cfg(test)]
mod tests {
    use super::WorkerPool;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn scope_joins_every_job() {
        let pool = WorkerPool::new(3).unwrap();
        assert_eq!(pool.workers(), 3);

        let done = AtomicUsize::new(0);
        pool.scope(|s| {
            for _ in 0..16 {
                s.spawn(|_| {
                    done.fetch_add(1, Ordering::SeqCst);
                });
            }
        });
        assert_eq!(done.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn zero_workers_means_one() {
        assert_eq!(WorkerPool::new(0).unwrap().workers(), 1);
    }
}
