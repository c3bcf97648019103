//! In-memory collaborators.
//!
//! [`InMemoryUnits`] keeps unit state in a vector and records every call it
//! receives, and [`ScriptedProbe`] replays a queue of load samples. The
//! daemon uses them for `--dry-run`; tests use them to assert exactly which
//! transitions the governor issued.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::bail;
use tracing::debug;

use crate::control::{LoadProbe, UnitController};
use crate::types::{PRIMARY_UNIT, PerformanceCeiling, UnitIndex};

/// A call received by [`InMemoryUnits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitCall {
    BringOnline(UnitIndex),
    TakeOffline(UnitIndex),
    SetCeiling(UnitIndex, PerformanceCeiling),
}

struct UnitTable {
    online: Vec<bool>,
    ceilings: Vec<PerformanceCeiling>,
    calls: Vec<UnitCall>,
    /// Units whose transitions are rejected, to exercise failure paths.
    failing: HashSet<UnitIndex>,
}

/// A [`UnitController`] backed by plain memory.
pub struct InMemoryUnits {
    table: Mutex<UnitTable>,
}

impl InMemoryUnits {
    /// Create `total` units with the first `online` of them online.
    pub fn new(total: usize, online: usize) -> Self {
        let online = online.min(total);
        Self {
            table: Mutex::new(UnitTable {
                online: (0..total).map(|unit| unit < online).collect(),
                ceilings: vec![PerformanceCeiling::NoLimit; total],
                calls: Vec::new(),
                failing: HashSet::new(),
            }),
        }
    }

    /// Make every later transition on `unit` fail.
    #[cfg(any(test, feature = "testing"))]
    pub fn fail_unit(&self, unit: UnitIndex) {
        self.lock().failing.insert(unit);
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<UnitCall> {
        self.lock().calls.clone()
    }

    /// Forget the recorded calls.
    #[cfg(any(test, feature = "testing"))]
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Indices of the units currently online.
    pub fn online_units(&self) -> Vec<UnitIndex> {
        self.lock()
            .online
            .iter()
            .enumerate()
            .filter_map(|(unit, &up)| up.then_some(unit))
            .collect()
    }

    pub fn ceiling(&self, unit: UnitIndex) -> Option<PerformanceCeiling> {
        self.lock().ceilings.get(unit).copied()
    }

    fn lock(&self) -> MutexGuard<'_, UnitTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_online(&self, unit: UnitIndex, online: bool) -> anyhow::Result<()> {
        let mut table = self.lock();
        table.calls.push(if online {
            UnitCall::BringOnline(unit)
        } else {
            UnitCall::TakeOffline(unit)
        });
        if table.failing.contains(&unit) {
            bail!("unit {unit} rejected the transition");
        }
        match table.online.get_mut(unit) {
            Some(state) => {
                *state = online;
                debug!(unit, online, "in-memory unit transition");
                Ok(())
            }
            None => bail!("unit {unit} does not exist"),
        }
    }
}

impl UnitController for InMemoryUnits {
    fn total_units(&self) -> usize {
        self.lock().online.len()
    }

    fn is_online(&self, unit: UnitIndex) -> bool {
        self.lock().online.get(unit).copied().unwrap_or(false)
    }

    fn bring_online(&self, unit: UnitIndex) -> anyhow::Result<()> {
        self.set_online(unit, true)
    }

    fn take_offline(&self, unit: UnitIndex) -> anyhow::Result<()> {
        if unit == PRIMARY_UNIT {
            self.lock().calls.push(UnitCall::TakeOffline(unit));
            bail!("the primary unit cannot be taken offline");
        }
        self.set_online(unit, false)
    }

    fn set_performance_ceiling(
        &self,
        unit: UnitIndex,
        ceiling: PerformanceCeiling,
    ) -> anyhow::Result<()> {
        let mut table = self.lock();
        table.calls.push(UnitCall::SetCeiling(unit, ceiling));
        match table.ceilings.get_mut(unit) {
            Some(slot) => {
                *slot = ceiling;
                Ok(())
            }
            None => bail!("unit {unit} does not exist"),
        }
    }

    fn online_count(&self) -> usize {
        self.lock().online.iter().filter(|&&up| up).count()
    }
}

/// A [`LoadProbe`] that replays queued samples.
///
/// Once the queue drains, the last sample repeats. Clones share the same
/// queue, so a test can keep one clone and push samples while the governor
/// owns the other.
#[derive(Clone)]
pub struct ScriptedProbe {
    queue: Arc<Mutex<ProbeScript>>,
}

struct ProbeScript {
    pending: VecDeque<u32>,
    last: u32,
    taken: usize,
}

impl ScriptedProbe {
    pub fn new(samples: impl IntoIterator<Item = u32>) -> Self {
        Self {
            queue: Arc::new(Mutex::new(ProbeScript {
                pending: samples.into_iter().collect(),
                last: 0,
                taken: 0,
            })),
        }
    }

    /// A probe that always reports `load`.
    pub fn constant(load: u32) -> Self {
        let probe = Self::new([]);
        probe.script().last = load;
        probe
    }

    pub fn push(&self, load: u32) {
        self.script().pending.push_back(load);
    }

    /// Number of samples taken so far.
    pub fn samples_taken(&self) -> usize {
        self.script().taken
    }

    fn script(&self) -> MutexGuard<'_, ProbeScript> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LoadProbe for ScriptedProbe {
    fn sample(&mut self) -> u32 {
        let mut script = self.script();
        if let Some(load) = script.pending.pop_front() {
            script.last = load;
        }
        script.taken += 1;
        script.last
    }
}
