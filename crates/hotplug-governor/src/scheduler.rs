//! Hotplug scheduler: the control loop.
//!
//! One task owns the scheduler. Timer expiries, power events, status
//! queries and shutdown are all handled by that task in turn, so a cycle
//! can never overlap another cycle or a suspend/resume transition. The
//! next deadline is armed only after the current cycle has finished its
//! unit work.
//!
//! ```text
//!            EnterLowPower
//!   RUNNING ───────────────▶ SUSPENDED
//!      ▲                         │
//!      └─────────────────────────┘
//!   LeaveLowPower (next cycle after one base tick)
//! ```

use std::sync::Arc;
use std::time::Duration;

use hotplug_core::{LoadProbe, PRIMARY_UNIT, PowerEvent, Tunables, UnitController};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::actions;
use crate::error::{GovernorError, GovernorResult};
use crate::gate;
use crate::power::PowerStateListener;
use crate::state::SystemState;
use crate::threshold;

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerMode {
    Running,
    Suspended,
}

/// Snapshot returned by a status query.
#[derive(Debug, Clone)]
pub struct GovernorStatus {
    pub mode: SchedulerMode,
    pub active_units: usize,
    pub total_units: usize,
    pub last_transition: Option<Instant>,
    pub next_cycle: Option<Instant>,
}

/// Messages handled by the governor task.
#[derive(Debug)]
pub(crate) enum Command {
    Power(PowerEvent),
    Status(oneshot::Sender<GovernorStatus>),
}

/// The control loop and the state it owns.
pub struct HotplugScheduler {
    tunables: Tunables,
    probe: Box<dyn LoadProbe>,
    units: Arc<dyn UnitController>,
    power: PowerStateListener,
    state: SystemState,
    mode: SchedulerMode,
    next_cycle: Option<Instant>,
}

impl HotplugScheduler {
    /// Create a scheduler in the `Running` state.
    ///
    /// Fails if the controller has no units or the primary unit is offline.
    pub fn new(
        tunables: Tunables,
        probe: Box<dyn LoadProbe>,
        units: Arc<dyn UnitController>,
    ) -> GovernorResult<Self> {
        let total_units = units.total_units();
        if total_units == 0 {
            return Err(GovernorError::NoUnits);
        }
        if !units.is_online(PRIMARY_UNIT) {
            return Err(GovernorError::PrimaryOffline);
        }

        let state = SystemState::new(units.online_count(), total_units);
        let power = PowerStateListener::new(tunables.suspend_ceiling);

        Ok(Self {
            tunables,
            probe,
            units,
            power,
            state,
            mode: SchedulerMode::Running,
            next_cycle: None,
        })
    }

    /// Current scheduler state.
    pub fn mode(&self) -> SchedulerMode {
        self.mode
    }

    /// Unit counts and the last transition time.
    pub fn state(&self) -> &SystemState {
        &self.state
    }

    /// Snapshot of the mode, the unit counts and the cycle deadline.
    pub fn status(&self) -> GovernorStatus {
        GovernorStatus {
            mode: self.mode,
            active_units: self.state.active_units,
            total_units: self.state.total_units,
            last_transition: self.state.last_transition,
            next_cycle: self.next_cycle,
        }
    }

    /// Run one cycle at `now` and return the delay before the next one.
    ///
    /// The delay is derived from the active unit count at the start of the
    /// cycle, whatever the cycle did.
    pub fn run_cycle(&mut self, now: Instant) -> Duration {
        let raw_load = self.probe.sample();
        let active = self.state.active_units;
        let decision =
            threshold::classify(raw_load, active, self.state.total_units, &self.tunables);

        debug!(
            load = raw_load,
            active,
            high = decision.thresholds.high,
            mid = decision.thresholds.mid,
            low = decision.thresholds.low,
            tier = decision.tier.label(),
            "hotplug sample"
        );

        if decision.tier.is_action() {
            if gate::allow(now, self.state.last_transition, decision.cooldown) {
                let changed = actions::execute(decision.tier, self.units.as_ref());
                info!(
                    tier = decision.tier.label(),
                    load = raw_load,
                    from = active,
                    target = decision.next_units,
                    units = ?changed,
                    "hotplug transition"
                );
                self.state.last_transition = Some(now);
            } else {
                debug!(
                    tier = decision.tier.label(),
                    cooldown_ms = decision.cooldown.as_millis() as u64,
                    "transition suppressed by cooldown"
                );
            }
        }

        self.state.refresh(self.units.as_ref());
        decision.sample_interval
    }

    /// Apply a power event at `now`.
    ///
    /// A duplicate event (entering while suspended, leaving while running)
    /// is ignored.
    pub fn handle_power(&mut self, event: PowerEvent, now: Instant) {
        match (event, self.mode) {
            (PowerEvent::EnterLowPower, SchedulerMode::Running) => {
                self.mode = SchedulerMode::Suspended;
                self.next_cycle = None;
                info!("low-power: hotplug cycles stopped");
                self.power.enter_low_power(self.units.as_ref(), &mut self.state);
            }
            (PowerEvent::LeaveLowPower, SchedulerMode::Suspended) => {
                self.power
                    .leave_low_power(self.units.as_ref(), &mut self.state, now);
                self.mode = SchedulerMode::Running;
                self.next_cycle = Some(now + self.tunables.base_tick);
                info!("resume: hotplug cycles restarting");
            }
            (event, mode) => {
                debug!(event = event.label(), ?mode, "ignoring duplicate power event");
            }
        }
    }

    /// Drive the scheduler until shutdown or until every command sender
    /// is dropped.
    pub(crate) async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        self.next_cycle = Some(Instant::now() + self.tunables.startup_delay);
        info!(
            active = self.state.active_units,
            total = self.state.total_units,
            startup_delay_ms = self.tunables.startup_delay.as_millis() as u64,
            "hotplug governor started"
        );

        loop {
            let deadline = self.next_cycle;

            tokio::select! {
                biased;

                _ = shutdown.changed() => {
                    info!("hotplug governor shutting down");
                    break;
                }
                command = commands.recv() => match command {
                    Some(Command::Power(event)) => self.handle_power(event, Instant::now()),
                    Some(Command::Status(reply)) => {
                        let _ = reply.send(self.status());
                    }
                    None => {
                        info!("command channel closed, hotplug governor stopping");
                        break;
                    }
                },
                _ = sleep_until(deadline) => {
                    let interval = self.run_cycle(Instant::now());
                    self.next_cycle = Some(Instant::now() + interval);
                }
            }
        }
    }
}

/// Sleep until `deadline`, or forever when no cycle is armed.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
