//! Power state listener.
//!
//! Entering the low-power state forces every non-primary unit offline and
//! clamps the primary unit's ceiling; leaving it brings every unit back and
//! lifts the clamp. Pausing and resuming the cycle timer is the
//! scheduler's half of the transition, see
//! [`HotplugScheduler::handle_power`](crate::HotplugScheduler::handle_power).

use hotplug_core::{PRIMARY_UNIT, PerformanceCeiling, UnitController};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::actions;
use crate::state::SystemState;

pub struct PowerStateListener {
    suspend_ceiling: PerformanceCeiling,
}

impl PowerStateListener {
    pub fn new(suspend_ceiling: PerformanceCeiling) -> Self {
        Self { suspend_ceiling }
    }

    /// Unit work for entering the low-power state.
    ///
    /// The caller has already stopped the cycle timer.
    pub fn enter_low_power(&self, units: &dyn UnitController, state: &mut SystemState) {
        if units.online_count() > 1 {
            let downed = actions::take_secondaries_offline(units);
            info!(units = ?downed, "low-power: secondary units offline");
        }

        set_ceiling(units, self.suspend_ceiling);
        state.refresh(units);
    }

    /// Unit work for leaving the low-power state.
    ///
    /// Resets the transition timestamp to `now` so the first cycle after
    /// resume is not blocked by a cooldown that predates the suspend.
    pub fn leave_low_power(
        &self,
        units: &dyn UnitController,
        state: &mut SystemState,
        now: Instant,
    ) {
        let upped = actions::bring_all_online(units);
        info!(units = ?upped, "resume: secondary units online");

        set_ceiling(units, PerformanceCeiling::NoLimit);
        state.last_transition = Some(now);
        state.refresh(units);
    }
}

fn set_ceiling(units: &dyn UnitController, ceiling: PerformanceCeiling) {
    match units.set_performance_ceiling(PRIMARY_UNIT, ceiling) {
        Ok(()) => info!(unit = PRIMARY_UNIT, %ceiling, "performance ceiling set"),
        Err(e) => warn!(
            unit = PRIMARY_UNIT,
            %ceiling,
            error = %e,
            "failed to set performance ceiling"
        ),
    }
}
