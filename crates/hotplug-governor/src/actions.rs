//! Unit transitions shared by the scheduler cycle and the power listener.
//!
//! Every walk goes over the non-primary units in ascending index order and
//! skips units already in the target state, so repeating an action issues
//! no controller calls. A failed call is logged and the walk moves on; the
//! caller re-reads the online count afterwards.

use hotplug_core::{PRIMARY_UNIT, UnitController, UnitIndex};
use tracing::{info, warn};

use crate::threshold::Tier;

/// Bring every offline non-primary unit online. Returns the units brought up.
pub fn bring_all_online(units: &dyn UnitController) -> Vec<UnitIndex> {
    secondary_units(units)
        .filter(|&unit| !units.is_online(unit))
        .filter(|&unit| bring_up(units, unit))
        .collect()
}

/// Bring the lowest-indexed offline unit online.
pub fn bring_one_online(units: &dyn UnitController) -> Option<UnitIndex> {
    secondary_units(units)
        .filter(|&unit| !units.is_online(unit))
        .find(|&unit| bring_up(units, unit))
}

/// Take every online non-primary unit offline. Returns the units taken down.
pub fn take_secondaries_offline(units: &dyn UnitController) -> Vec<UnitIndex> {
    secondary_units(units)
        .filter(|&unit| units.is_online(unit))
        .filter(|&unit| take_down(units, unit))
        .collect()
}

/// Carry out the transitions for `tier`. Returns the units that changed.
pub fn execute(tier: Tier, units: &dyn UnitController) -> Vec<UnitIndex> {
    match tier {
        Tier::ScaleUpAll => bring_all_online(units),
        Tier::ScaleUpOne => bring_one_online(units).into_iter().collect(),
        Tier::ScaleDownAll => take_secondaries_offline(units),
        Tier::NoAction => Vec::new(),
    }
}

fn secondary_units(units: &dyn UnitController) -> impl Iterator<Item = UnitIndex> {
    PRIMARY_UNIT + 1..units.total_units()
}

fn bring_up(units: &dyn UnitController, unit: UnitIndex) -> bool {
    match units.bring_online(unit) {
        Ok(()) => {
            info!(unit, "unit is up");
            true
        }
        Err(e) => {
            warn!(unit, error = %e, "failed to bring unit online");
            false
        }
    }
}

fn take_down(units: &dyn UnitController, unit: UnitIndex) -> bool {
    match units.take_offline(unit) {
        Ok(()) => {
            info!(unit, "unit is down");
            true
        }
        Err(e) => {
            warn!(unit, error = %e, "failed to take unit offline");
            false
        }
    }
}
