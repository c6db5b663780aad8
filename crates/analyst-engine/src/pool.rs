//! Shared worker pool
//!
//! One semaphore-bounded pool, sized by configuration, executes every
//! producer call in the engine - strategies borrow it rather than spawning
//! their own concurrency, so backpressure and shutdown stay observable in
//! a single place.

use std::sync::Arc;

use analyst_core::{Error, Result};
use tokio::sync::Semaphore;

/// Bounded executor for agent units of work
///
/// Futures passed to [`WorkerPool::run`] wait for a permit before they are
/// polled, so at most `size` units of work are in flight at once no matter
/// how many tasks or strategies share the pool.
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Create a pool with a fixed number of concurrent slots
    pub fn new(size: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Run a unit of work under a pool permit
    pub async fn run<T>(&self, work: impl Future<Output = T>) -> Result<T> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::Config("worker pool is closed".to_string()))?;
        Ok(work.await)
    }

    /// Configured pool size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
