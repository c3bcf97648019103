//! Shared types used across hotplug crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of an addressable processing unit (a CPU core).
pub type UnitIndex = usize;

/// The primary unit. It is never taken offline.
pub const PRIMARY_UNIT: UnitIndex = 0;

/// Upper bound on a unit's operating frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceCeiling {
    /// The hardware maximum applies.
    NoLimit,
    /// Clamp to the given frequency in kHz.
    Khz(u32),
}

impl fmt::Display for PerformanceCeiling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerformanceCeiling::NoLimit => f.write_str("no-limit"),
            PerformanceCeiling::Khz(khz) => write!(f, "{} MHz", khz / 1000),
        }
    }
}

/// A system-wide power state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerEvent {
    /// The system is entering its low-power state (screen off, suspend).
    EnterLowPower,
    /// The system is leaving its low-power state.
    LeaveLowPower,
}

impl PowerEvent {
    pub fn label(&self) -> &'static str {
        match self {
            PowerEvent::EnterLowPower => "enter-low-power",
            PowerEvent::LeaveLowPower => "leave-low-power",
        }
    }
}
