//! hotplug-governor: load-driven processing unit scaling.
//!
//! Samples aggregate load, classifies it against thresholds scaled by the
//! number of active units, and brings units online or offline. A cooldown
//! window keeps a noisy sample from flapping units, and a power listener
//! forces minimum capacity with a clamped ceiling while the system is in
//! its low-power state.
//!
//! # Architecture
//!
//! ```text
//! GovernorHandle ──(Command)──▶ HotplugScheduler task
//!                                 ├── LoadProbe        (sample)
//!                                 ├── threshold        (classify)
//!                                 ├── gate             (cooldown)
//!                                 ├── actions          (unit walks)
//!                                 ├── PowerStateListener
//!                                 └── UnitController   (online/offline/ceiling)
//! ```

pub mod actions;
pub mod error;
pub mod gate;
pub mod handle;
pub mod power;
pub mod scheduler;
pub mod state;
pub mod threshold;

pub use error::{GovernorError, GovernorResult};
pub use handle::GovernorHandle;
pub use power::PowerStateListener;
pub use scheduler::{GovernorStatus, HotplugScheduler, SchedulerMode};
pub use state::SystemState;
pub use threshold::{Decision, ThresholdSet, Tier, classify};
