//! Governor error types.

use thiserror::Error;

/// Errors that can occur while starting or talking to the governor.
///
/// Per-cycle work never fails; these cover initialization and the
/// control channel only.
#[derive(Debug, Error)]
pub enum GovernorError {
    #[error("unit controller reports no units")]
    NoUnits,

    #[error("primary unit is offline")]
    PrimaryOffline,

    #[error("no async runtime to host the governor: {0}")]
    Runtime(String),

    #[error("governor task has stopped")]
    Stopped,

    #[error("governor task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type GovernorResult<T> = Result<T, GovernorError>;
