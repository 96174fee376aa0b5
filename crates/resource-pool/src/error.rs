use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("timed out waiting for a resource")]
    Timeout,

    #[error("pool is closed")]
    Closed,

    #[error("resource factory failed: {0}")]
    FactoryFailed(String),
}
