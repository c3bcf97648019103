//! Governor lifecycle tests.
//!
//! Drive a spawned governor through its handle on a paused tokio clock and
//! check which unit transitions it issued.

use std::sync::Arc;
use std::time::Duration;

use hotplug_core::{
    InMemoryUnits, PerformanceCeiling, PowerEvent, ScriptedProbe, Tunables, UnitCall,
    UnitController,
};
use hotplug_governor::{GovernorError, GovernorHandle, HotplugScheduler, SchedulerMode};

fn tunables() -> Tunables {
    Tunables {
        startup_delay: Duration::from_secs(5),
        ..Tunables::default()
    }
}

fn spawn(units: &Arc<InMemoryUnits>, probe: &ScriptedProbe) -> GovernorHandle {
    spawn_with(tunables(), units, probe)
}

fn spawn_with(
    tunables: Tunables,
    units: &Arc<InMemoryUnits>,
    probe: &ScriptedProbe,
) -> GovernorHandle {
    let scheduler =
        HotplugScheduler::new(tunables, Box::new(probe.clone()), units.clone()).unwrap();
    GovernorHandle::spawn(scheduler).unwrap()
}

#[tokio::test(start_paused = true)]
async fn first_cycle_waits_for_startup_delay() {
    let units = Arc::new(InMemoryUnits::new(4, 1));
    // 75 at one unit fires the high tier; 200 at four units is no action.
    let probe = ScriptedProbe::new([75, 200]);
    let handle = spawn(&units, &probe);

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(probe.samples_taken(), 0);
    assert!(units.calls().is_empty());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(probe.samples_taken(), 1);
    assert_eq!(units.online_count(), 4);

    let status = handle.status().await.unwrap();
    assert_eq!(status.mode, SchedulerMode::Running);
    assert_eq!(status.active_units, 4);
    assert_eq!(status.total_units, 4);
    assert!(status.last_transition.is_some());

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn cycles_keep_running_at_derived_interval() {
    let units = Arc::new(InMemoryUnits::new(2, 1));
    // 30 at one unit sits between low (20) and mid (40).
    let probe = ScriptedProbe::constant(30);
    let handle = spawn(&units, &probe);

    // Startup at 5s, then one cycle per second at one active unit.
    tokio::time::sleep(Duration::from_millis(8500)).await;
    assert_eq!(probe.samples_taken(), 4);
    assert!(units.calls().is_empty());

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn suspend_resume_round_trip() {
    let units = Arc::new(InMemoryUnits::new(4, 4));
    let probe = ScriptedProbe::constant(200);
    let handle = spawn(&units, &probe);

    handle.power_event(PowerEvent::EnterLowPower).await.unwrap();
    let status = handle.status().await.unwrap();
    assert_eq!(status.mode, SchedulerMode::Suspended);
    assert_eq!(status.active_units, 1);
    assert!(status.next_cycle.is_none());
    assert_eq!(units.online_units(), vec![0]);
    assert_eq!(units.ceiling(0), Some(PerformanceCeiling::Khz(702_000)));

    // No cycles while suspended, well past the startup delay.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(probe.samples_taken(), 0);

    handle.power_event(PowerEvent::LeaveLowPower).await.unwrap();
    let status = handle.status().await.unwrap();
    assert_eq!(status.mode, SchedulerMode::Running);
    assert_eq!(status.active_units, 4);
    assert!(status.last_transition.is_some());
    assert_eq!(units.ceiling(0), Some(PerformanceCeiling::NoLimit));

    // First cycle after resume is one base tick out, not 250ms.
    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(probe.samples_taken(), 0);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(probe.samples_taken(), 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn resume_restarts_the_cooldown_window() {
    let units = Arc::new(InMemoryUnits::new(4, 2));
    // 10 at four units is below the low tier (80).
    let probe = ScriptedProbe::constant(10);
    let tunables = Tunables {
        base_cooldown: Duration::from_secs(8),
        ..tunables()
    };
    let handle = spawn_with(tunables, &units, &probe);

    handle.power_event(PowerEvent::EnterLowPower).await.unwrap();
    handle.power_event(PowerEvent::LeaveLowPower).await.unwrap();
    handle.status().await.unwrap();
    units.clear_calls();

    // Window at four units is 2s from the resume; cycles start 1s out.
    tokio::time::sleep(Duration::from_millis(1900)).await;
    assert!(probe.samples_taken() >= 1);
    assert!(units.calls().is_empty());

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(
        units.calls(),
        vec![
            UnitCall::TakeOffline(1),
            UnitCall::TakeOffline(2),
            UnitCall::TakeOffline(3),
        ]
    );
    assert_eq!(units.online_units(), vec![0]);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn duplicate_enter_is_ignored() {
    let units = Arc::new(InMemoryUnits::new(3, 3));
    let probe = ScriptedProbe::constant(100);
    let handle = spawn(&units, &probe);

    handle.power_event(PowerEvent::EnterLowPower).await.unwrap();
    handle.status().await.unwrap();
    let after_first = units.calls().len();
    assert_eq!(after_first, 3);

    handle.power_event(PowerEvent::EnterLowPower).await.unwrap();
    handle.status().await.unwrap();
    assert_eq!(units.calls().len(), after_first);

    handle.shutdown().await.unwrap();
}

#[test]
fn spawn_outside_runtime_fails() {
    let units: Arc<dyn UnitController> = Arc::new(InMemoryUnits::new(2, 1));
    let scheduler =
        HotplugScheduler::new(tunables(), Box::new(ScriptedProbe::constant(0)), units).unwrap();

    assert!(matches!(
        GovernorHandle::spawn(scheduler),
        Err(GovernorError::Runtime(_))
    ));
}
