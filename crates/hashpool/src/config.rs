//! Sizing knobs for the worker pool.
//!
//! A [`PoolConfig`] is resolved against the input length of each invocation
//! into concrete worker and queue sizes. Resolution never yields zero: every
//! count is clamped to at least one.

/// Worker-count and queue-capacity settings for a [`HashPool`].
///
/// [`HashPool`]: crate::HashPool
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Upper bound on concurrent workers per invocation.
    pub num_workers: usize,
    /// Capacity of the work queue shared by all workers. `None` uses the
    /// input length.
    pub work_queue_capacity: Option<usize>,
    /// Capacity of the shared result queue. `None` uses the input length.
    pub result_queue_capacity: Option<usize>,
}

impl Default for PoolConfig {
    /// One worker per available CPU, unbounded-in-practice queues.
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get().max(1),
            work_queue_capacity: None,
            result_queue_capacity: None,
        }
    }
}

impl PoolConfig {
    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers.max(1);
        self
    }

    pub fn with_work_queue_capacity(mut self, capacity: usize) -> Self {
        self.work_queue_capacity = Some(capacity.max(1));
        self
    }

    pub fn with_result_queue_capacity(mut self, capacity: usize) -> Self {
        self.result_queue_capacity = Some(capacity.max(1));
        self
    }

    /// Resolves the settings for an input of `len` items.
    ///
    /// `len` must be non-zero; empty inputs never reach the pool.
    pub(crate) fn plan(&self, len: usize) -> PoolPlan {
        debug_assert!(len > 0);
        let workers = self.num_workers.clamp(1, len);
        let work_queue_capacity = self.work_queue_capacity.unwrap_or(len).max(1);
        let result_queue_capacity = self.result_queue_capacity.unwrap_or(len).max(1);

        PoolPlan {
            workers,
            work_queue_capacity,
            result_queue_capacity,
        }
    }
}

/// Concrete sizes for a single invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PoolPlan {
    pub workers: usize,
    pub work_queue_capacity: usize,
    pub result_queue_capacity: usize,
}
