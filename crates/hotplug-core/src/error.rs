//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or validating `hotplug.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid duration for {field}: {value:?}")]
    InvalidDuration { field: &'static str, value: String },

    #[error("base_tick must be greater than zero")]
    ZeroTick,

    #[error("tier rates must satisfy high > mid > low (got {high}/{mid}/{low})")]
    TierOrder { high: u32, mid: u32, low: u32 },

    #[error("suspend ceiling must be greater than zero")]
    ZeroCeiling,
}
