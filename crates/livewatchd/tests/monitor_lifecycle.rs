//! Integration tests for the monitor actor.
//!
//! These drive the monitor the way a host does: through `spawn_monitor()`
//! and the `MonitorHandle`, against a `SimulatedSession`.
//!
//! Tests CAN use `.unwrap()` and `.expect()` - this is allowed.

use std::sync::Arc;
use std::time::Duration;

use livewatch_core::{
    property, ClipSlotCoordinate, ConfigKey, Configuration, EntityPath, MonitorState,
    PropertyValue, SuccessRate,
};
use livewatchd::monitor::{spawn_monitor, MonitorHandle, READY_BANNER, RESTART_DELAY};
use livewatchd::{MemorySink, MonitorError, SimulatedSession};
use tokio::time::sleep;

// ============================================================================
// Test Helpers
// ============================================================================

fn spawn(tracks: usize, clips: usize, config: Configuration) -> (Arc<SimulatedSession>, MonitorHandle, MemorySink) {
    let session = Arc::new(SimulatedSession::with_grid(tracks, clips));
    let sink = MemorySink::new();
    let handle = spawn_monitor(session.clone(), config, Arc::new(sink.clone()));
    (session, handle, sink)
}

fn quiet_config() -> Configuration {
    let mut config = Configuration::default();
    config.set_periodic_display(false);
    config
}

fn small_grid_config(tracks: usize, clips: usize) -> Configuration {
    let mut config = quiet_config();
    config.set_max_tracks(tracks);
    config.set_max_clips(clips);
    config
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_load_prints_banner_and_stays_idle() {
    let (session, handle, sink) = spawn(2, 2, quiet_config());

    let status = handle.status().await.unwrap();

    assert_eq!(status.state, MonitorState::Idle);
    assert_eq!(status.observers, 0);
    assert_eq!(session.subscribe_calls(), 0);
    assert_eq!(sink.lines().first().map(String::as_str), Some(READY_BANNER));
}

#[tokio::test]
async fn test_start_stop_cycle() {
    let (session, handle, _sink) = spawn(2, 2, quiet_config());

    assert!(handle.start().await.unwrap());
    let status = handle.status().await.unwrap();
    assert_eq!(status.state, MonitorState::Active);
    assert_eq!(status.observers, 15);
    assert_eq!(status.clip_slots, 4);

    assert!(handle.stop().await.unwrap());
    let status = handle.status().await.unwrap();
    assert_eq!(status.state, MonitorState::Idle);
    assert_eq!(status.observers, 0);
    assert_eq!(session.active_subscriptions(), 0);
}

#[tokio::test]
async fn test_repeated_cycles_do_not_leak() {
    let (session, handle, _sink) = spawn(3, 3, quiet_config());

    for _ in 0..5 {
        handle.start().await.unwrap();
        handle.stop().await.unwrap();
    }

    assert_eq!(session.active_subscriptions(), 0);
    assert_eq!(session.subscribe_calls(), session.unsubscribe_calls());
}

#[tokio::test]
async fn test_observer_count_bounded_by_grid_limits() {
    let (_session, handle, _sink) = spawn(10, 10, small_grid_config(3, 2));

    handle.start().await.unwrap();
    let status = handle.status().await.unwrap();

    // 3 song observers + 2 per track + at most 2 per slot
    assert!(status.observers <= 3 + 2 * 3 + 2 * 3 * 2);
    assert_eq!(status.clip_slots, 6);
}

#[tokio::test]
async fn test_notifications_are_processed_before_later_commands() {
    let (session, handle, sink) = spawn(1, 1, quiet_config());
    handle.start().await.unwrap();

    session.set(&EntityPath::live_set(), property::IS_PLAYING, PropertyValue::Bool(true));
    let status = handle.status().await.unwrap();

    assert!(sink.contains("Transport: PLAYING"));
    assert_eq!(status.transport_rate, SuccessRate::Percent(100.0));
}

#[tokio::test]
async fn test_clip_launch_is_reported_with_one_based_coordinate() {
    let (session, handle, sink) = spawn(2, 3, quiet_config());
    handle.start().await.unwrap();

    let slot = EntityPath::clip_slot(ClipSlotCoordinate::new(1, 2));
    session.set(&slot, property::IS_TRIGGERED, PropertyValue::Bool(true));
    session.set(&slot, property::IS_PLAYING, PropertyValue::Bool(true));
    handle.status().await.unwrap();

    assert!(sink.contains("Clip [2:3] triggered"));
    assert!(sink.contains("Clip [2:3] playing"));
}

// ============================================================================
// Restart and Timers
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_restart_goes_idle_then_active() {
    let (session, handle, _sink) = spawn(1, 2, quiet_config());
    handle.start().await.unwrap();

    handle.restart().await.unwrap();
    let status = handle.status().await.unwrap();
    assert_eq!(status.state, MonitorState::Idle);
    assert!(status.restart_pending);
    assert_eq!(session.active_subscriptions(), 0);

    sleep(RESTART_DELAY + Duration::from_millis(10)).await;

    let status = handle.status().await.unwrap();
    assert_eq!(status.state, MonitorState::Active);
    assert!(!status.restart_pending);
    assert_eq!(session.active_subscriptions(), status.observers);
}

#[tokio::test(start_paused = true)]
async fn test_periodic_dashboard() {
    let mut config = Configuration::default();
    config.set_update_interval_ms(1000);
    let (_session, handle, sink) = spawn(1, 1, config);

    handle.start().await.unwrap();
    sleep(Duration::from_millis(3500)).await;
    handle.status().await.unwrap();
    assert_eq!(sink.count("=== Live status"), 3);

    handle.stop().await.unwrap();
    sleep(Duration::from_millis(3000)).await;
    handle.status().await.unwrap();
    assert_eq!(sink.count("=== Live status"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_config_interval_change_while_active() {
    let (session, handle, _sink) = spawn(2, 2, Configuration::default());
    handle.start().await.unwrap();
    let calls = session.subscribe_calls();

    let update = handle
        .set_config(ConfigKey::UpdateInterval, "500")
        .await
        .unwrap();
    assert!(update.clamped);
    assert_eq!(update.value, "1000 ms");

    let status = handle.status().await.unwrap();
    assert_eq!(status.state, MonitorState::Active);
    assert!(status.reporter_running);
    assert_eq!(session.subscribe_calls(), calls);
    assert_eq!(handle.config().await.unwrap().update_interval_ms(), 1000);
}

#[tokio::test]
async fn test_config_errors_are_returned() {
    let (_session, handle, _sink) = spawn(1, 1, quiet_config());

    let result = handle.set_config(ConfigKey::MaxTracks, "many").await;
    assert!(matches!(result, Err(MonitorError::Config(_))));
    assert!(handle.is_connected());
}

// ============================================================================
// One-shot Commands
// ============================================================================

#[tokio::test]
async fn test_quick_works_while_idle() {
    let (_session, handle, sink) = spawn(2, 1, quiet_config());

    let snapshot = handle.quick().await.unwrap();

    assert_eq!(snapshot.selected_track_name.as_deref(), Some("Track 1"));
    assert!(sink.contains("=== Quick status"));
    assert_eq!(handle.status().await.unwrap().state, MonitorState::Idle);
}

#[tokio::test]
async fn test_health_before_any_reads() {
    let (_session, handle, _sink) = spawn(1, 1, quiet_config());

    let summary = handle.health().await.unwrap();
    assert_eq!(summary, "Connection health: no reads attempted");
}

// ============================================================================
// Unload
// ============================================================================

#[tokio::test]
async fn test_unload_releases_everything_and_closes_handle() {
    let (session, handle, sink) = spawn(2, 2, quiet_config());
    handle.start().await.unwrap();

    handle.unload().await.unwrap();

    assert_eq!(session.active_subscriptions(), 0);
    assert!(sink.contains("livewatch unloaded"));
    assert!(matches!(
        handle.status().await,
        Err(MonitorError::ChannelClosed)
    ));
}

#[tokio::test]
async fn test_dropping_last_handle_unloads() {
    let (session, handle, sink) = spawn(1, 1, quiet_config());
    handle.start().await.unwrap();
    assert!(session.active_subscriptions() > 0);

    drop(handle);
    for _ in 0..50 {
        if sink.contains("livewatch unloaded") {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }

    assert!(sink.contains("livewatch unloaded"));
    assert_eq!(session.active_subscriptions(), 0);
}
