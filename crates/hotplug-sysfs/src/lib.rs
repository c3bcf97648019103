//! hotplug-sysfs: Linux collaborators for the hotplug governor.
//!
//! - [`SysfsUnits`] brings cpus online/offline and sets frequency ceilings
//!   under `/sys/devices/system/cpu`.
//! - [`ProcStatProbe`] derives aggregate load from `/proc/stat`.

mod attr;
pub mod error;
pub mod probe;
pub mod units;

pub use attr::parse_cpu_list;
pub use error::{SysfsError, SysfsResult};
pub use probe::ProcStatProbe;
pub use units::SysfsUnits;
