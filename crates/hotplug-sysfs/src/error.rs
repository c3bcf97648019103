//! Error types for the Linux adapters.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for sysfs and procfs access.
pub type SysfsResult<T> = Result<T, SysfsError>;

/// Errors that can occur while reading or writing kernel interfaces.
#[derive(Debug, Error)]
pub enum SysfsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed cpu list: {0:?}")]
    CpuList(String),

    #[error("malformed value in {path}: {value:?}")]
    Value { path: PathBuf, value: String },

    #[error("unit {0} is not a present cpu")]
    UnknownUnit(usize),

    #[error("the primary unit cannot be taken offline")]
    PrimaryUnit,

    #[error("no cpu lines in {0}")]
    NoCpuStats(PathBuf),
}
