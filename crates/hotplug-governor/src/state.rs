//! Governor-owned system state.

use hotplug_core::UnitController;
use tokio::time::Instant;

/// State shared by the scheduler cycle and the power listener.
///
/// Owned by the governor task, so the two never mutate it concurrently.
#[derive(Debug, Clone)]
pub struct SystemState {
    /// Time of the last accepted transition.
    pub last_transition: Option<Instant>,
    pub active_units: usize,
    pub total_units: usize,
}

impl SystemState {
    pub fn new(active_units: usize, total_units: usize) -> Self {
        let state = Self {
            last_transition: None,
            active_units,
            total_units,
        };
        state.check();
        state
    }

    /// Re-read the online count from the controller.
    pub fn refresh(&mut self, units: &dyn UnitController) {
        self.active_units = units.online_count();
        self.check();
    }

    fn check(&self) {
        debug_assert!(
            (1..=self.total_units).contains(&self.active_units),
            "active units {} outside 1..={}",
            self.active_units,
            self.total_units
        );
    }
}
