//! Handle to a running governor task.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::info;

use hotplug_core::PowerEvent;

use crate::error::{GovernorError, GovernorResult};
use crate::scheduler::{Command, GovernorStatus, HotplugScheduler};

/// Capacity of the command channel. Power events arrive at most once per
/// transition, so this only has to absorb status queries.
const COMMAND_CAPACITY: usize = 16;

/// Owns the governor task and the channels into it.
pub struct GovernorHandle {
    commands: mpsc::Sender<Command>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl GovernorHandle {
    /// Spawn `scheduler` on the current tokio runtime.
    ///
    /// Fails when called outside a runtime; the governor never starts in
    /// a degraded mode.
    pub fn spawn(scheduler: HotplugScheduler) -> GovernorResult<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| GovernorError::Runtime(e.to_string()))?;

        let (commands, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = runtime.spawn(scheduler.run(command_rx, shutdown_rx));

        Ok(Self {
            commands,
            shutdown,
            task,
        })
    }

    /// Deliver a power state transition.
    pub async fn power_event(&self, event: PowerEvent) -> GovernorResult<()> {
        info!(event = event.label(), "power event received");
        self.commands
            .send(Command::Power(event))
            .await
            .map_err(|_| GovernorError::Stopped)
    }

    pub async fn status(&self) -> GovernorResult<GovernorStatus> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Status(reply))
            .await
            .map_err(|_| GovernorError::Stopped)?;
        rx.await.map_err(|_| GovernorError::Stopped)
    }

    /// Stop the governor and wait for its task to finish.
    pub async fn shutdown(self) -> GovernorResult<()> {
        let _ = self.shutdown.send(true);
        self.task.await?;
        Ok(())
    }
}
