//! Power state source: POSIX signals.
//!
//! - `SIGUSR1`: entering the low-power state
//! - `SIGUSR2`: leaving the low-power state
//! - `SIGHUP`: log the governor status
//! - `SIGTERM` / Ctrl-C: shut down

use hotplug_core::PowerEvent;
use hotplug_governor::GovernorHandle;
use tokio::signal::unix::{SignalKind, signal};
use tracing::info;

/// Forward signals to the governor until a shutdown signal arrives.
pub async fn forward_until_shutdown(handle: &GovernorHandle) -> anyhow::Result<()> {
    let mut enter = signal(SignalKind::user_defined1())?;
    let mut leave = signal(SignalKind::user_defined2())?;
    let mut hangup = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;

    loop {
        tokio::select! {
            _ = enter.recv() => handle.power_event(PowerEvent::EnterLowPower).await?,
            _ = leave.recv() => handle.power_event(PowerEvent::LeaveLowPower).await?,
            _ = hangup.recv() => {
                let status = handle.status().await?;
                info!(
                    mode = ?status.mode,
                    active = status.active_units,
                    total = status.total_units,
                    "governor status"
                );
            }
            _ = terminate.recv() => {
                info!("SIGTERM received");
                break;
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}
