//! Resilience tests: the monitor against a session that misbehaves.
//!
//! Every failure here is one the host can produce at any time. None of them
//! may abort an operation or leave subscriptions behind.
//!
//! Tests CAN use `.unwrap()` and `.expect()` - this is allowed.

use std::sync::Arc;
use std::time::Duration;

use livewatch_core::{
    property, Configuration, EntityPath, HealthCategory, MonitorState, PropertyValue,
    SuccessRate,
};
use livewatchd::monitor::{spawn_monitor, MonitorHandle};
use livewatchd::{MemorySink, SimulatedSession};
use tokio::time::sleep;

fn spawn_with(session: SimulatedSession, config: Configuration) -> (Arc<SimulatedSession>, MonitorHandle, MemorySink) {
    let session = Arc::new(session);
    let sink = MemorySink::new();
    let handle = spawn_monitor(session.clone(), config, Arc::new(sink.clone()));
    (session, handle, sink)
}

fn quiet_config() -> Configuration {
    let mut config = Configuration::default();
    config.set_periodic_display(false);
    config
}

// ============================================================================
// Setup Failures
// ============================================================================

#[tokio::test]
async fn test_rejected_subscriptions_are_skipped() {
    let session = SimulatedSession::with_grid(2, 2);
    session.fail_subscriptions_to(property::IS_TRIGGERED);
    let (_session, handle, _sink) = spawn_with(session, quiet_config());

    assert!(handle.start().await.unwrap());
    let status = handle.status().await.unwrap();

    assert_eq!(status.state, MonitorState::Active);
    assert_eq!(status.observers, 3 + 4 + 4);
}

#[tokio::test]
async fn test_all_subscriptions_rejected_stays_idle() {
    let session = SimulatedSession::new();
    for prop in [property::IS_PLAYING, property::TEMPO, property::SELECTED_TRACK] {
        session.fail_subscriptions_to(prop);
    }
    let mut config = Configuration::default();
    config.set_update_interval_ms(1000);
    let (_session, handle, sink) = spawn_with(session, config);

    assert!(!handle.start().await.unwrap());
    let status = handle.status().await.unwrap();

    assert_eq!(status.state, MonitorState::Idle);
    assert_eq!(status.observers, 0);
    assert!(!status.reporter_running);
    assert!(sink.contains("No observers could be created"));
    assert!(!handle.stop().await.unwrap());
}

#[tokio::test]
async fn test_bulk_count_failure_falls_back_to_probing() {
    let session = SimulatedSession::with_grid(3, 2);
    session.fail_child_counts(true);
    session.remove_entity(&EntityPath::track(2));
    let (_session, handle, _sink) = spawn_with(session, quiet_config());

    handle.start().await.unwrap();
    let status = handle.status().await.unwrap();

    assert_eq!(status.clip_slots, 4);
}

#[tokio::test]
async fn test_unsubscribe_failures_do_not_block_stop() {
    let (session, handle, sink) = spawn_with(SimulatedSession::with_grid(2, 2), quiet_config());
    handle.start().await.unwrap();
    session.fail_unsubscribes(true);

    assert!(handle.stop().await.unwrap());

    let status = handle.status().await.unwrap();
    assert_eq!(status.state, MonitorState::Idle);
    assert_eq!(status.observers, 0);
    assert_eq!(session.unsubscribe_calls(), 15);
    assert!(sink.contains("15 observers released"));
}

// ============================================================================
// Read Failures
// ============================================================================

#[tokio::test]
async fn test_failing_tempo_only_blanks_tempo() {
    let session = SimulatedSession::with_grid(1, 1);
    session.fail_reads_of(property::TEMPO);
    let (_session, handle, sink) = spawn_with(session, quiet_config());

    let snapshot = handle.quick().await.unwrap();

    assert_eq!(snapshot.tempo_bpm, None);
    assert_eq!(snapshot.transport_playing, Some(false));
    assert_eq!(snapshot.available_fields(), 4);
    assert!(sink.contains("Tempo     : unavailable"));
    assert!(sink.contains("Transport : STOPPED"));
}

#[tokio::test(start_paused = true)]
async fn test_read_failures_show_in_success_rates() {
    let session = SimulatedSession::with_grid(1, 1);
    let mut config = Configuration::default();
    config.set_update_interval_ms(1000);
    let (session, handle, sink) = spawn_with(session, config);
    handle.start().await.unwrap();
    session.fail_reads_of(property::IS_PLAYING);

    sleep(Duration::from_millis(2500)).await;
    let status = handle.status().await.unwrap();

    assert_eq!(status.transport_rate, SuccessRate::Percent(0.0));
    assert_eq!(status.session_rate, SuccessRate::Percent(100.0));
    assert_eq!(sink.count("=== Live status"), 2);
    assert!(status.reporter_running);
}

#[tokio::test]
async fn test_health_resets_on_start_but_survives_stop() {
    let (session, handle, _sink) = spawn_with(SimulatedSession::with_grid(1, 1), quiet_config());
    handle.start().await.unwrap();
    session.set(&EntityPath::live_set(), property::IS_PLAYING, PropertyValue::Bool(true));
    handle.stop().await.unwrap();

    let summary = handle.health().await.unwrap();
    assert!(summary.contains(&format!("{}: 1/1 ok", HealthCategory::Transport)));

    handle.start().await.unwrap();
    let status = handle.status().await.unwrap();
    assert_eq!(status.transport_rate, SuccessRate::NotAvailable);
}

// ============================================================================
// Late Callbacks
// ============================================================================

#[tokio::test]
async fn test_in_flight_notifications_after_stop_are_ignored() {
    let (session, handle, sink) = spawn_with(SimulatedSession::with_grid(1, 1), quiet_config());
    handle.start().await.unwrap();
    handle.stop().await.unwrap();
    sink.clear();

    session.deliver_in_flight(
        &EntityPath::live_set(),
        property::TEMPO,
        PropertyValue::Float(140.0),
    );
    let status = handle.status().await.unwrap();

    assert!(sink.is_empty());
    assert_eq!(status.state, MonitorState::Idle);
}

#[tokio::test]
async fn test_in_flight_notifications_after_unload_are_dropped() {
    let (session, handle, _sink) = spawn_with(SimulatedSession::with_grid(1, 1), quiet_config());
    handle.start().await.unwrap();
    handle.unload().await.unwrap();

    let delivered = session.deliver_in_flight(
        &EntityPath::live_set(),
        property::IS_PLAYING,
        PropertyValue::Bool(true),
    );

    assert_eq!(delivered, 1);
    assert!(!handle.is_connected());
}
