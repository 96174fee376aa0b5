use crate::error::PoolError;
use crate::stats::{PoolStats, StatsAccumulator};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, Mutex, Notify};
use tokio::task::JoinHandle;

/// Creates and validates resources for a [`ResourcePool`]. The idiomatic
/// Rust rendering of `async_pool.py`'s `connection_factory` /
/// `health_check_func` / `cleanup_func` optional callables.
#[async_trait]
pub trait Factory<R: Send + 'static>: Send + Sync {
    async fn create(&self) -> Result<R, PoolError>;

    /// Returns `true` if the resource is still usable. Default: always
    /// healthy (matches the Python original treating `health_check_func`
    /// as optional).
    async fn health_check(&self, _resource: &R) -> bool {
        true
    }

    /// Called when a resource is destroyed (idle timeout, failed health
    /// check, or pool close). Default: no-op.
    async fn cleanup(&self, _resource: R) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Initializing,
    Active,
    Draining,
    Closed,
}

pub struct PoolConfig {
    pub min_size: usize,
    pub max_size: usize,
    pub max_idle_time: Duration,
    pub health_check_interval: Duration,
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_size: 1,
            max_size: 10,
            max_idle_time: Duration::from_secs(300),
            health_check_interval: Duration::from_secs(60),
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

struct IdleSlot<R> {
    resource: R,
    created_at: Instant,
    last_used: Instant,
    use_count: u64,
}

struct Waiter<R> {
    tx: oneshot::Sender<R>,
}

struct Inner<R> {
    idle: VecDeque<IdleSlot<R>>,
    waiters: VecDeque<Waiter<R>>,
    total: usize,
    state: PoolState,
}

/// Generic async pool of expensive resources: database connections,
/// worker threads, SSH sessions (spec.md §4.B). `min_size <= len <=
/// max_size` holds once `initialize()` returns; a connection handed out
/// is never also present in the idle queue.
pub struct ResourcePool<R: Send + 'static> {
    config: PoolConfig,
    factory: Arc<dyn Factory<R>>,
    inner: Arc<Mutex<Inner<R>>>,
    stats: Arc<Mutex<StatsAccumulator>>,
    shutdown: Arc<Notify>,
    background: Arc<Mutex<Vec<JoinHandle<()>>>>,
    active_count: Arc<AtomicU64>,
}

impl<R: Send + 'static> Clone for ResourcePool<R> {
    fn clone(&self) -> Self {
        Self {
            config: PoolConfig {
                min_size: self.config.min_size,
                max_size: self.config.max_size,
                max_idle_time: self.config.max_idle_time,
                health_check_interval: self.config.health_check_interval,
                acquire_timeout: self.config.acquire_timeout,
            },
            factory: self.factory.clone(),
            inner: self.inner.clone(),
            stats: self.stats.clone(),
            shutdown: self.shutdown.clone(),
            background: self.background.clone(),
            active_count: self.active_count.clone(),
        }
    }
}

/// A leased resource. Returned to the pool on explicit [`Lease::release`]
/// or on drop, matching the Python original's `PooledConnection` async
/// context manager.
pub struct Lease<R: Send + 'static> {
    resource: Option<R>,
    pool: ResourcePool<R>,
    acquired_at: Instant,
}

impl<R: Send + 'static> std::ops::Deref for Lease<R> {
    type Target = R;
    fn deref(&self) -> &R {
        self.resource.as_ref().expect("resource taken from live lease")
    }
}

impl<R: Send + 'static> std::ops::DerefMut for Lease<R> {
    fn deref_mut(&mut self) -> &mut R {
        self.resource.as_mut().expect("resource taken from live lease")
    }
}

impl<R: Send + 'static> Lease<R> {
    pub async fn release(mut self) {
        if let Some(resource) = self.resource.take() {
            self.pool.return_resource(resource).await;
        }
    }
}

impl<R: Send + 'static> Drop for Lease<R> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            let pool = self.pool.clone();
            tokio::spawn(async move {
                pool.return_resource(resource).await;
            });
        }
    }
}

impl<R: Send + 'static> ResourcePool<R> {
    pub fn new(factory: Arc<dyn Factory<R>>, config: PoolConfig) -> Self {
        Self {
            config,
            factory,
            inner: Arc::new(Mutex::new(Inner {
                idle: VecDeque::new(),
                waiters: VecDeque::new(),
                total: 0,
                state: PoolState::Initializing,
            })),
            stats: Arc::new(Mutex::new(StatsAccumulator::default())),
            shutdown: Arc::new(Notify::new()),
            background: Arc::new(Mutex::new(Vec::new())),
            active_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Prefill `min_size` resources (best-effort) and start the
    /// health-check and idle-cleanup background loops.
    pub async fn initialize(&self) {
        {
            let mut inner = self.inner.lock().await;
            if inner.state != PoolState::Initializing {
                return;
            }
            for _ in 0..self.config.min_size {
                match self.factory.create().await {
                    Ok(resource) => {
                        let now = Instant::now();
                        inner.idle.push_back(IdleSlot { resource, created_at: now, last_used: now, use_count: 0 });
                        inner.total += 1;
                        self.stats.lock().await.total_created += 1;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to create initial pool connection");
                        self.stats.lock().await.total_errors += 1;
                    }
                }
            }
            inner.state = PoolState::Active;
        }

        let mut handles = self.background.lock().await;
        handles.push(self.spawn_health_check_loop());
        handles.push(self.spawn_cleanup_loop());
    }

    fn spawn_health_check_loop(&self) -> JoinHandle<()> {
        let pool = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(pool.config.health_check_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => pool.run_health_check().await,
                    _ = pool.shutdown.notified() => break,
                }
            }
        })
    }

    fn spawn_cleanup_loop(&self) -> JoinHandle<()> {
        let pool = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(pool.config.health_check_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => pool.run_idle_cleanup().await,
                    _ = pool.shutdown.notified() => break,
                }
            }
        })
    }

    async fn run_health_check(&self) {
        let mut inner = self.inner.lock().await;
        let mut still_idle = VecDeque::with_capacity(inner.idle.len());
        while let Some(slot) = inner.idle.pop_front() {
            if self.factory.health_check(&slot.resource).await {
                still_idle.push_back(slot);
            } else {
                inner.total = inner.total.saturating_sub(1);
                self.stats.lock().await.total_destroyed += 1;
                self.factory.cleanup(slot.resource).await;
                tracing::warn!("destroyed unhealthy idle pool connection");
            }
        }
        inner.idle = still_idle;

        while inner.total < self.config.min_size {
            match self.factory.create().await {
                Ok(resource) => {
                    let now = Instant::now();
                    inner.idle.push_back(IdleSlot { resource, created_at: now, last_used: now, use_count: 0 });
                    inner.total += 1;
                    self.stats.lock().await.total_created += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to top up pool toward min_size");
                    self.stats.lock().await.total_errors += 1;
                    break;
                }
            }
        }
    }

    async fn run_idle_cleanup(&self) {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let mut keep = VecDeque::with_capacity(inner.idle.len());
        while let Some(slot) = inner.idle.pop_front() {
            let idle_for = now.duration_since(slot.last_used);
            if idle_for > self.config.max_idle_time && inner.total > self.config.min_size {
                inner.total = inner.total.saturating_sub(1);
                self.stats.lock().await.total_destroyed += 1;
                self.factory.cleanup(slot.resource).await;
            } else {
                keep.push_back(slot);
            }
        }
        inner.idle = keep;
    }

    /// Acquire a lease, waiting up to `timeout` if the pool is at
    /// capacity. FIFO among waiters (spec.md §4.B / §5).
    pub async fn acquire(&self, timeout: Duration) -> Result<Lease<R>, PoolError> {
        let start = Instant::now();
        {
            let mut stats = self.stats.lock().await;
            stats.total_requests += 1;
        }

        if self.config.max_size == 0 {
            return Err(PoolError::Timeout);
        }

        let resource = {
            let mut inner = self.inner.lock().await;
            if inner.state == PoolState::Closed {
                return Err(PoolError::Closed);
            }
            if let Some(mut slot) = inner.idle.pop_front() {
                slot.last_used = Instant::now();
                slot.use_count += 1;
                Some(slot.resource)
            } else if inner.total < self.config.max_size {
                inner.total += 1;
                None // signal: create outside the lock
            } else {
                let (tx, rx) = oneshot::channel();
                inner.waiters.push_back(Waiter { tx });
                drop(inner);
                let wait = tokio::time::timeout(timeout, rx).await;
                match wait {
                    Ok(Ok(resource)) => {
                        self.record_wait(start).await;
                        self.active_count.fetch_add(1, Ordering::Relaxed);
                        return Ok(Lease { resource: Some(resource), pool: self.clone(), acquired_at: Instant::now() });
                    }
                    _ => {
                        self.stats.lock().await.total_errors += 1;
                        return Err(PoolError::Timeout);
                    }
                }
            }
        };

        let resource = match resource {
            Some(r) => r,
            None => match self.factory.create().await {
                Ok(r) => {
                    self.stats.lock().await.total_created += 1;
                    r
                }
                Err(e) => {
                    let mut inner = self.inner.lock().await;
                    inner.total = inner.total.saturating_sub(1);
                    self.stats.lock().await.total_errors += 1;
                    return Err(PoolError::FactoryFailed(e.to_string()));
                }
            },
        };

        self.record_wait(start).await;
        self.active_count.fetch_add(1, Ordering::Relaxed);
        Ok(Lease { resource: Some(resource), pool: self.clone(), acquired_at: Instant::now() })
    }

    async fn record_wait(&self, start: Instant) {
        let wait_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.stats.lock().await.record_wait(wait_ms);
    }

    async fn return_resource(&self, resource: R) {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        let mut inner = self.inner.lock().await;

        let mut resource = resource;
        while let Some(waiter) = inner.waiters.pop_front() {
            match waiter.tx.send(resource) {
                Ok(()) => return,
                // The waiter's `acquire()` already timed out and dropped its
                // receiver; hand the resource to the next waiter instead of
                // leaking it.
                Err(returned) => resource = returned,
            }
        }

        if !self.factory.health_check(&resource).await {
            inner.total = inner.total.saturating_sub(1);
            self.stats.lock().await.total_destroyed += 1;
            drop(inner);
            self.factory.cleanup(resource).await;
            return;
        }

        let now = Instant::now();
        inner.idle.push_back(IdleSlot { resource, created_at: now, last_used: now, use_count: 1 });
    }

    pub async fn stats(&self) -> PoolStats {
        let inner = self.inner.lock().await;
        let acc = self.stats.lock().await;
        PoolStats {
            total_connections: inner.total,
            active_connections: self.active_count.load(Ordering::Relaxed) as usize,
            idle_connections: inner.idle.len(),
            pending_waiters: inner.waiters.len(),
            total_created: acc.total_created,
            total_destroyed: acc.total_destroyed,
            total_requests: acc.total_requests,
            total_errors: acc.total_errors,
            avg_wait_time_ms: acc.avg_wait_ms(),
            max_wait_time_ms: acc.max_wait_time_ms,
        }
    }

    /// Cancel background tasks and destroy all resources.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state == PoolState::Closed {
            return;
        }
        inner.state = PoolState::Closed;
        let idle: Vec<IdleSlot<R>> = inner.idle.drain(..).collect();
        inner.total = 0;
        drop(inner);

        for slot in idle {
            self.factory.cleanup(slot.resource).await;
        }

        self.shutdown.notify_waiters();
        let mut handles = self.background.lock().await;
        for handle in handles.drain(..) {
            handle.abort();
        }
    }
}

// `acquired_at` is kept on `Lease` for future leak-warning instrumentation
// (spec.md §4.B "the pool MAY log a warning when a resource's in-use
// duration exceeds a threshold"); read here to avoid an unused-field
// warning until that instrumentation lands.
impl<R: Send + 'static> Lease<R> {
    pub fn acquired_at(&self) -> Instant {
        self.acquired_at
    }
}
