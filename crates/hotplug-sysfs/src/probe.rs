//! Aggregate load from `/proc/stat`.
//!
//! Each sample compares per-cpu jiffy counters with the previous sample.
//! A cpu's load is its busy share of the interval in percent, optionally
//! weighted by `scaling_cur_freq / cpuinfo_max_freq` so that a cpu busy at
//! half speed counts half ("load at max frequency"). The sample is the sum
//! over the cpus that were online for the whole interval.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use hotplug_core::LoadProbe;
use tracing::{debug, warn};

use crate::attr;
use crate::error::{SysfsError, SysfsResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CpuTimes {
    busy: u64,
    total: u64,
}

pub struct ProcStatProbe {
    proc_stat: PathBuf,
    cpu_root: PathBuf,
    scale_by_frequency: bool,
    previous: HashMap<usize, CpuTimes>,
    last_load: u32,
}

impl ProcStatProbe {
    /// Open the probe and take the baseline sample.
    pub fn open(
        proc_stat: impl Into<PathBuf>,
        cpu_root: impl Into<PathBuf>,
        scale_by_frequency: bool,
    ) -> SysfsResult<Self> {
        let proc_stat = proc_stat.into();
        let previous = read_cpu_times(&proc_stat)?;
        Ok(Self {
            proc_stat,
            cpu_root: cpu_root.into(),
            scale_by_frequency,
            previous,
            last_load: 0,
        })
    }

    fn cpu_load(&self, cpu: usize, previous: CpuTimes, current: CpuTimes) -> Option<u64> {
        let elapsed = current.total.checked_sub(previous.total)?;
        if elapsed == 0 {
            return None;
        }
        let busy = current.busy.saturating_sub(previous.busy).min(elapsed);
        let percent = busy * 100 / elapsed;

        if !self.scale_by_frequency {
            return Some(percent);
        }
        match self.frequency(cpu) {
            Some((cur, max)) => Some(percent * cur.min(max) / max),
            None => Some(percent),
        }
    }

    /// Current and maximum frequency of `cpu`, if cpufreq exposes them.
    fn frequency(&self, cpu: usize) -> Option<(u64, u64)> {
        let cpufreq = self.cpu_root.join(format!("cpu{cpu}/cpufreq"));
        let cur = attr::read_u32(&cpufreq.join("scaling_cur_freq")).ok()?;
        let max = attr::read_u32(&cpufreq.join("cpuinfo_max_freq")).ok()?;
        (max > 0).then_some((u64::from(cur), u64::from(max)))
    }
}

impl LoadProbe for ProcStatProbe {
    fn sample(&mut self) -> u32 {
        let current = match read_cpu_times(&self.proc_stat) {
            Ok(current) => current,
            Err(e) => {
                warn!(error = %e, "load sample failed, reusing previous value");
                return self.last_load;
            }
        };

        let load: u64 = current
            .iter()
            .filter_map(|(&cpu, &now)| {
                let before = *self.previous.get(&cpu)?;
                self.cpu_load(cpu, before, now)
            })
            .sum();

        self.previous = current;
        self.last_load = u32::try_from(load).unwrap_or(u32::MAX);
        debug!(load = self.last_load, "load sampled");
        self.last_load
    }
}

fn read_cpu_times(path: &Path) -> SysfsResult<HashMap<usize, CpuTimes>> {
    let content = std::fs::read_to_string(path).map_err(|source| SysfsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let times = parse_cpu_times(&content);
    if times.is_empty() {
        return Err(SysfsError::NoCpuStats(path.to_path_buf()));
    }
    Ok(times)
}

/// Per-cpu counters from `/proc/stat`. The aggregate `cpu` line is skipped.
///
/// Fields: user nice system idle iowait irq softirq steal [guest guest_nice].
/// Guest time is already counted in user time, so only the first eight
/// fields make up the total.
fn parse_cpu_times(content: &str) -> HashMap<usize, CpuTimes> {
    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let cpu = fields.next()?.strip_prefix("cpu")?.parse::<usize>().ok()?;
            let values: Vec<u64> = fields.take(8).map_while(|v| v.parse().ok()).collect();
            if values.len() < 4 {
                return None;
            }
            let total: u64 = values.iter().sum();
            let idle = values[3] + values.get(4).copied().unwrap_or(0);
            Some((
                cpu,
                CpuTimes {
                    busy: total.saturating_sub(idle),
                    total,
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const FIRST: &str = "\
cpu  100 0 100 1800 0 0 0 0 0 0
cpu0 100 0 100 800 0 0 0 0 0 0
cpu1 0 0 0 1000 0 0 0 0 0 0
intr 12345
";

    const SECOND: &str = "\
cpu  700 0 700 2600 0 0 0 0 0 0
cpu0 200 0 200 1400 0 0 0 0 0 0
cpu1 400 0 400 1200 0 0 0 0 0 0
intr 23456
";

    #[test]
    fn parse_skips_aggregate_and_other_lines() {
        let times = parse_cpu_times(FIRST);
        assert_eq!(times.len(), 2);
        assert_eq!(
            times[&0],
            CpuTimes {
                busy: 200,
                total: 1000
            }
        );
    }

    #[test]
    fn iowait_counts_as_idle() {
        let times = parse_cpu_times("cpu3 10 0 10 50 30 0 0 0\n");
        assert_eq!(times[&3], CpuTimes { busy: 20, total: 100 });
    }

    #[test]
    fn sums_busy_percent_across_cpus() {
        let dir = tempfile::tempdir().unwrap();
        let stat = dir.path().join("stat");
        fs::write(&stat, FIRST).unwrap();

        let mut probe = ProcStatProbe::open(&stat, dir.path(), false).unwrap();
        fs::write(&stat, SECOND).unwrap();

        // cpu0: 200 busy of 800 (25%), cpu1: 800 of 1000 (80%).
        assert_eq!(probe.sample(), 105);
    }

    #[test]
    fn scales_by_frequency_when_available() {
        let dir = tempfile::tempdir().unwrap();
        let stat = dir.path().join("stat");
        fs::write(&stat, FIRST).unwrap();
        let cpufreq = dir.path().join("cpu0/cpufreq");
        fs::create_dir_all(&cpufreq).unwrap();
        fs::write(cpufreq.join("scaling_cur_freq"), "750000\n").unwrap();
        fs::write(cpufreq.join("cpuinfo_max_freq"), "1500000\n").unwrap();

        let mut probe = ProcStatProbe::open(&stat, dir.path(), true).unwrap();
        fs::write(&stat, SECOND).unwrap();

        // cpu0 at half speed: 25% -> 12; cpu1 has no cpufreq: 80.
        assert_eq!(probe.sample(), 92);
    }

    #[test]
    fn cpu_going_offline_drops_out() {
        let dir = tempfile::tempdir().unwrap();
        let stat = dir.path().join("stat");
        fs::write(&stat, FIRST).unwrap();

        let mut probe = ProcStatProbe::open(&stat, dir.path(), false).unwrap();
        fs::write(&stat, "cpu0 200 0 200 1400 0 0 0 0 0 0\n").unwrap();
        assert_eq!(probe.sample(), 25);
    }

    #[test]
    fn read_failure_reuses_last_value() {
        let dir = tempfile::tempdir().unwrap();
        let stat = dir.path().join("stat");
        fs::write(&stat, FIRST).unwrap();

        let mut probe = ProcStatProbe::open(&stat, dir.path(), false).unwrap();
        fs::write(&stat, SECOND).unwrap();
        assert_eq!(probe.sample(), 105);

        fs::remove_file(&stat).unwrap();
        assert_eq!(probe.sample(), 105);
    }

    #[test]
    fn open_rejects_file_without_cpu_lines() {
        let dir = tempfile::tempdir().unwrap();
        let stat = dir.path().join("stat");
        fs::write(&stat, "intr 1\n").unwrap();
        assert!(matches!(
            ProcStatProbe::open(&stat, dir.path(), false),
            Err(SysfsError::NoCpuStats(_))
        ));
    }
}
