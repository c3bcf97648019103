//! CPU hotplug and frequency ceiling through sysfs.
//!
//! ```text
//! <root>/present                         cpu list, fixes the unit table
//! <root>/online                          cpu list, used for online_count
//! <root>/cpuN/online                     "1" / "0"
//! <root>/cpuN/cpufreq/scaling_max_freq   ceiling in kHz
//! <root>/cpuN/cpufreq/cpuinfo_max_freq   hardware maximum, for NoLimit
//! ```
//!
//! A cpu without an `online` attribute cannot be hotplugged and is always
//! online (cpu0 on most boards).
//!
//! Unit indices are positions in the `present` list, so a sparse list such
//! as `0-1,3` gives three units: unit 2 is cpu3. The primary unit is the
//! lowest present cpu.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use hotplug_core::{PRIMARY_UNIT, PerformanceCeiling, UnitController, UnitIndex};
use tracing::{debug, info};

use crate::attr::{self, parse_cpu_list};
use crate::error::{SysfsError, SysfsResult};

pub struct SysfsUnits {
    root: PathBuf,
    /// Present cpu ids, ascending. Indexed by unit.
    present: Vec<usize>,
}

impl SysfsUnits {
    /// Open the cpu tree at `root`, normally `/sys/devices/system/cpu`.
    pub fn open(root: impl Into<PathBuf>) -> SysfsResult<Self> {
        let root = root.into();
        let mut present = parse_cpu_list(&attr::read(&root.join("present"))?)?;
        present.sort_unstable();
        present.dedup();
        info!(
            root = %root.display(),
            total = present.len(),
            cpus = ?present,
            "sysfs cpu tree opened"
        );
        Ok(Self { root, present })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The cpu id behind `unit`, if it is present.
    pub fn cpu_id(&self, unit: UnitIndex) -> Option<usize> {
        self.present.get(unit).copied()
    }

    fn cpu_dir(&self, unit: UnitIndex) -> SysfsResult<PathBuf> {
        let cpu = self.cpu_id(unit).ok_or(SysfsError::UnknownUnit(unit))?;
        Ok(self.root.join(format!("cpu{cpu}")))
    }

    fn write_online(&self, unit: UnitIndex, value: &str) -> SysfsResult<()> {
        attr::write(&self.cpu_dir(unit)?.join("online"), value)
    }
}

impl UnitController for SysfsUnits {
    fn total_units(&self) -> usize {
        self.present.len()
    }

    fn is_online(&self, unit: UnitIndex) -> bool {
        let Ok(dir) = self.cpu_dir(unit) else {
            return false;
        };
        match attr::read(&dir.join("online")) {
            Ok(value) => value == "1",
            Err(SysfsError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
                dir.is_dir()
            }
            Err(e) => {
                debug!(unit, error = %e, "cannot read online state");
                false
            }
        }
    }

    fn bring_online(&self, unit: UnitIndex) -> anyhow::Result<()> {
        Ok(self.write_online(unit, "1")?)
    }

    fn take_offline(&self, unit: UnitIndex) -> anyhow::Result<()> {
        if unit == PRIMARY_UNIT {
            return Err(SysfsError::PrimaryUnit.into());
        }
        Ok(self.write_online(unit, "0")?)
    }

    fn set_performance_ceiling(
        &self,
        unit: UnitIndex,
        ceiling: PerformanceCeiling,
    ) -> anyhow::Result<()> {
        let cpufreq = self.cpu_dir(unit)?.join("cpufreq");
        let khz = match ceiling {
            PerformanceCeiling::Khz(khz) => khz,
            PerformanceCeiling::NoLimit => attr::read_u32(&cpufreq.join("cpuinfo_max_freq"))?,
        };
        attr::write(&cpufreq.join("scaling_max_freq"), &khz.to_string())?;
        Ok(())
    }

    fn online_count(&self) -> usize {
        match attr::read(&self.root.join("online")).and_then(|list| parse_cpu_list(&list)) {
            Ok(cpus) => cpus
                .into_iter()
                .filter(|cpu| self.present.binary_search(cpu).is_ok())
                .count(),
            Err(e) => {
                debug!(error = %e, "falling back to per-cpu online scan");
                (0..self.present.len())
                    .filter(|&unit| self.is_online(unit))
                    .count()
            }
        }
    }
}
