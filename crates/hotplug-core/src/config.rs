//! hotplug.toml configuration parser.
//!
//! Every field has a default, so an empty file is a valid configuration.
//! The parsed [`HotplugConfig`] keeps durations as human strings (`"1s"`,
//! `"500ms"`); [`HotplugConfig::tunables`] validates them into the
//! [`Tunables`] the governor runs on.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::types::PerformanceCeiling;

/// Cycle cadence at one active unit.
pub const DEFAULT_BASE_TICK: Duration = Duration::from_secs(1);
/// Hysteresis window at one active unit.
pub const DEFAULT_BASE_COOLDOWN: Duration = Duration::from_secs(2);
/// Delay before the first cycle after start.
pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_secs(25);
/// Primary unit ceiling while in the low-power state.
pub const DEFAULT_SUSPEND_CEILING_KHZ: u32 = 702_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HotplugConfig {
    pub governor: GovernorConfig,
    pub suspend: SuspendConfig,
    pub sysfs: SysfsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    pub base_tick: String,
    pub base_cooldown: String,
    pub startup_delay: String,
    pub tiers: TierRates,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            base_tick: "1s".to_string(),
            base_cooldown: "2s".to_string(),
            startup_delay: "25s".to_string(),
            tiers: TierRates::default(),
        }
    }
}

/// Tier boundaries in percent load per active unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierRates {
    pub high: u32,
    pub mid: u32,
    pub low: u32,
}

impl Default for TierRates {
    fn default() -> Self {
        Self {
            high: 70,
            mid: 40,
            low: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuspendConfig {
    pub ceiling_khz: u32,
}

impl Default for SuspendConfig {
    fn default() -> Self {
        Self {
            ceiling_khz: DEFAULT_SUSPEND_CEILING_KHZ,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SysfsConfig {
    pub cpu_root: PathBuf,
    pub proc_stat: PathBuf,
    /// Weight each unit's busy percentage by its current/max frequency.
    pub scale_by_frequency: bool,
}

impl Default for SysfsConfig {
    fn default() -> Self {
        Self {
            cpu_root: PathBuf::from("/sys/devices/system/cpu"),
            proc_stat: PathBuf::from("/proc/stat"),
            scale_by_frequency: true,
        }
    }
}

/// Validated governor tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tunables {
    pub base_tick: Duration,
    pub base_cooldown: Duration,
    pub startup_delay: Duration,
    pub tiers: TierRates,
    pub suspend_ceiling: PerformanceCeiling,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            base_tick: DEFAULT_BASE_TICK,
            base_cooldown: DEFAULT_BASE_COOLDOWN,
            startup_delay: DEFAULT_STARTUP_DELAY,
            tiers: TierRates::default(),
            suspend_ceiling: PerformanceCeiling::Khz(DEFAULT_SUSPEND_CEILING_KHZ),
        }
    }
}

impl HotplugConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate the file contents into runtime tunables.
    pub fn tunables(&self) -> ConfigResult<Tunables> {
        let base_tick = duration_field("base_tick", &self.governor.base_tick)?;
        if base_tick.is_zero() {
            return Err(ConfigError::ZeroTick);
        }

        let TierRates { high, mid, low } = self.governor.tiers;
        if !(high > mid && mid > low) {
            return Err(ConfigError::TierOrder { high, mid, low });
        }

        if self.suspend.ceiling_khz == 0 {
            return Err(ConfigError::ZeroCeiling);
        }

        Ok(Tunables {
            base_tick,
            base_cooldown: duration_field("base_cooldown", &self.governor.base_cooldown)?,
            startup_delay: duration_field("startup_delay", &self.governor.startup_delay)?,
            tiers: self.governor.tiers,
            suspend_ceiling: PerformanceCeiling::Khz(self.suspend.ceiling_khz),
        })
    }
}

fn duration_field(field: &'static str, value: &str) -> ConfigResult<Duration> {
    parse_duration(value).ok_or_else(|| ConfigError::InvalidDuration {
        field,
        value: value.to_string(),
    })
}

/// Parse a duration string like "500ms", "2s" or "5m". A bare number is
/// taken as seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
