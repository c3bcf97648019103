//! hotplug-core: shared types, collaborator traits, and configuration.

pub mod config;
pub mod control;
pub mod error;
pub mod memory;
pub mod types;

pub use config::{HotplugConfig, TierRates, Tunables};
pub use control::{LoadProbe, UnitController};
pub use error::{ConfigError, ConfigResult};
pub use memory::{InMemoryUnits, ScriptedProbe, UnitCall};
pub use types::*;
