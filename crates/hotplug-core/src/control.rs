//! Collaborator traits consumed by the governor.
//!
//! The governor never touches hardware directly. Load comes from a
//! [`LoadProbe`] and every unit transition goes through a
//! [`UnitController`]. Linux implementations live in `hotplug-sysfs`;
//! in-memory ones live in [`crate::memory`].

use crate::types::{PerformanceCeiling, UnitIndex};

/// Supplies one aggregate load sample on demand.
///
/// The figure is "percent load summed over online units", so a fully
/// busy 4-unit system reports roughly 400.
pub trait LoadProbe: Send {
    fn sample(&mut self) -> u32;
}

/// Online/offline control over the addressable units.
///
/// Calls are bounded and synchronous. Unit 0 is the primary unit and the
/// governor never calls [`take_offline`](UnitController::take_offline)
/// on it.
pub trait UnitController: Send + Sync {
    /// Number of addressable units, fixed for the lifetime of the controller.
    fn total_units(&self) -> usize;

    fn is_online(&self, unit: UnitIndex) -> bool;

    fn bring_online(&self, unit: UnitIndex) -> anyhow::Result<()>;

    fn take_offline(&self, unit: UnitIndex) -> anyhow::Result<()>;

    fn set_performance_ceiling(
        &self,
        unit: UnitIndex,
        ceiling: PerformanceCeiling,
    ) -> anyhow::Result<()>;

    /// Number of units currently online.
    fn online_count(&self) -> usize {
        (0..self.total_units())
            .filter(|&unit| self.is_online(unit))
            .count()
    }
}
