//! Generic async resource pool: min/max sizing, health checks, idle
//! eviction, and monitoring hooks (spec.md §4.B). Used by transfer and
//! database stages for connection/worker/session pooling.

pub mod error;
pub mod pool;
pub mod stats;

pub use error::PoolError;
pub use pool::{Factory, Lease, PoolConfig, PoolState, ResourcePool};
pub use stats::PoolStats;

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct CountingFactory {
        created: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Factory<usize> for CountingFactory {
        async fn create(&self) -> Result<usize, PoolError> {
            Ok(self.created.fetch_add(1, Ordering::SeqCst))
        }
    }

    #[tokio::test]
    async fn initialize_prefills_min_size() {
        let created = Arc::new(AtomicUsize::new(0));
        let pool = ResourcePool::new(
            Arc::new(CountingFactory { created: created.clone() }),
            PoolConfig { min_size: 3, max_size: 5, ..Default::default() },
        );
        pool.initialize().await;
        let stats = pool.stats().await;
        assert_eq!(stats.total_connections, 3);
        assert_eq!(stats.idle_connections, 3);
        pool.close().await;
    }

    #[tokio::test]
    async fn acquire_reuses_released_resource() {
        let created = Arc::new(AtomicUsize::new(0));
        let pool = ResourcePool::new(
            Arc::new(CountingFactory { created: created.clone() }),
            PoolConfig { min_size: 0, max_size: 1, ..Default::default() },
        );
        pool.initialize().await;

        let lease = pool.acquire(Duration::from_secs(1)).await.unwrap();
        let value = *lease;
        lease.release().await;
        assert_eq!(created.load(Ordering::SeqCst), 1);

        let lease2 = pool.acquire(Duration::from_secs(1)).await.unwrap();
        assert_eq!(*lease2, value);
        assert_eq!(created.load(Ordering::SeqCst), 1, "second acquire must reuse, not recreate");
        pool.close().await;
    }

    #[tokio::test]
    async fn max_size_zero_times_out_immediately() {
        let pool = ResourcePool::new(
            Arc::new(CountingFactory { created: Arc::new(AtomicUsize::new(0)) }),
            PoolConfig { min_size: 0, max_size: 0, ..Default::default() },
        );
        pool.initialize().await;
        let result = pool.acquire(Duration::from_secs(5)).await;
        assert!(matches!(result, Err(PoolError::Timeout)));
        pool.close().await;
    }

    #[tokio::test]
    async fn acquire_at_capacity_waits_then_times_out() {
        let pool = ResourcePool::new(
            Arc::new(CountingFactory { created: Arc::new(AtomicUsize::new(0)) }),
            PoolConfig { min_size: 0, max_size: 1, ..Default::default() },
        );
        pool.initialize().await;
        let _held = pool.acquire(Duration::from_secs(5)).await.unwrap();
        let result = pool.acquire(Duration::from_millis(50)).await;
        assert!(matches!(result, Err(PoolError::Timeout)));
        pool.close().await;
    }

    #[tokio::test]
    async fn returning_to_a_timed_out_waiter_does_not_leak_the_resource() {
        let created = Arc::new(AtomicUsize::new(0));
        let pool = ResourcePool::new(
            Arc::new(CountingFactory { created: created.clone() }),
            PoolConfig { min_size: 0, max_size: 1, ..Default::default() },
        );
        pool.initialize().await;

        let held = pool.acquire(Duration::from_secs(5)).await.unwrap();

        // This acquire enqueues a waiter, then times out and drops its
        // receiver while the waiter entry is still queued.
        let timed_out = pool.acquire(Duration::from_millis(20)).await;
        assert!(matches!(timed_out, Err(PoolError::Timeout)));

        // Returning the held resource must reach the stale waiter's failed
        // send, then fall back to re-queuing the resource rather than
        // dropping it: total_connections stays 1 and the resource is idle,
        // not destroyed.
        drop(held);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let stats = pool.stats().await;
        assert_eq!(stats.total_connections, 1, "the returned resource must not be leaked");
        assert_eq!(stats.idle_connections, 1);

        let reused = pool.acquire(Duration::from_secs(1)).await.unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 1, "the pool must reuse the resource, not create a second one");
        drop(reused);
        pool.close().await;
    }

    #[tokio::test]
    async fn never_exceeds_max_size() {
        let pool = ResourcePool::new(
            Arc::new(CountingFactory { created: Arc::new(AtomicUsize::new(0)) }),
            PoolConfig { min_size: 0, max_size: 2, ..Default::default() },
        );
        pool.initialize().await;
        let a = pool.acquire(Duration::from_secs(1)).await.unwrap();
        let b = pool.acquire(Duration::from_secs(1)).await.unwrap();
        let stats = pool.stats().await;
        assert_eq!(stats.total_connections, 2);
        drop(a);
        drop(b);
        pool.close().await;
    }
}
