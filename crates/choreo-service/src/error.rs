//! Service error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] choreo_core::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Sequence has {frames} frames, limit is {limit}")]
    SequenceTooLong { frames: usize, limit: usize },

    #[error("Comparison task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
