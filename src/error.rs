use thiserror::Error;

/// Lifecycle failures surfaced by [`crate::pipeline::engine::Engine`] implementations.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("engine already started")]
    AlreadyStarted,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to spawn engine worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("engine worker exited before reporting startup")]
    WorkerLost,
}

pub type Result<T> = std::result::Result<T, EngineError>;
