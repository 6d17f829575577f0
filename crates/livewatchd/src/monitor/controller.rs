//! Monitor controller - the Idle/Active state machine.
//!
//! The controller owns every piece of mutable monitor state: the observer
//! registry, the clip grid, the health counters, the periodic reporter and
//! the configuration. It is driven by exactly one caller at a time (the
//! actor loop, or a test), so none of it needs locking.
//!
//! # Reentrancy
//!
//! Change notifications and timer ticks arrive through the same queue as
//! host commands. A notification can be queued by the session just before
//! `stop()` releases its subscription, so every event handler first checks
//! that the monitor is active and that the event still belongs to a live
//! observer or task.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Setup failures are isolated per step and never abort `start()`

use std::sync::Arc;
use std::time::Duration;

use livewatch_core::{
    property, ConfigKey, ConfigUpdate, Configuration, ConnectionHealthTracker, EntityPath,
    HealthCategory, LiveSession, MixerParameter, MonitorState, Pan, PropertyValue,
    StatusSnapshot, Volume, UNAVAILABLE,
};
use tracing::{debug, info, warn};

use super::commands::{EventSender, MonitorEvent, MonitorStatus};
use crate::error::MonitorError;
use crate::observer::{ObserverId, ObserverRegistry, ObserverRole, TeardownReport};
use crate::reporter::{render_dashboard, PeriodicStatusReporter, SnapshotReader};
use crate::scanner::{ClipGrid, ClipGridScanner, TrackResolution};
use crate::sink::StatusSink;
use crate::timer::TimerHandle;

/// Delay between the stop and start halves of a restart.
///
/// The host releases subscriptions asynchronously. Subscribing to the same
/// paths again before it has finished can leave the new observers dead.
pub const RESTART_DELAY: Duration = Duration::from_millis(100);

/// Printed when the monitor is loaded by the host.
pub const READY_BANNER: &str =
    "livewatch ready - type 'start' to begin monitoring, 'help' for commands";

/// Title of the recurring dashboard block.
const DASHBOARD_TITLE: &str = "Live status";

/// Title of the one-shot `quick` dashboard block.
const QUICK_TITLE: &str = "Quick status";

/// Top-level monitor state machine.
pub struct MonitorController {
    session: Arc<dyn LiveSession>,
    config: Configuration,
    state: MonitorState,
    registry: ObserverRegistry,
    grid: ClipGrid,
    health: ConnectionHealthTracker,
    reporter: PeriodicStatusReporter,
    pending_restart: Option<TimerHandle>,
    restart_generation: u64,
    events: EventSender,
    sink: Arc<dyn StatusSink>,
}

impl MonitorController {
    /// Creates an idle controller.
    ///
    /// Notifications and timer wakeups are posted to `events`; the owner is
    /// expected to feed them back through [`MonitorController::handle_event`].
    pub fn new(
        session: Arc<dyn LiveSession>,
        config: Configuration,
        events: EventSender,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            session,
            config,
            state: MonitorState::Idle,
            registry: ObserverRegistry::new(),
            grid: ClipGrid::new(),
            health: ConnectionHealthTracker::new(),
            reporter: PeriodicStatusReporter::new(),
            pending_restart: None,
            restart_generation: 0,
            events,
            sink,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn observer_count(&self) -> usize {
        self.registry.len()
    }

    pub fn registry(&self) -> &ObserverRegistry {
        &self.registry
    }

    pub fn grid(&self) -> &ClipGrid {
        &self.grid
    }

    pub fn health(&self) -> &ConnectionHealthTracker {
        &self.health
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn is_reporter_running(&self) -> bool {
        self.reporter.is_running()
    }

    pub fn is_restart_pending(&self) -> bool {
        self.pending_restart.is_some()
    }

    // ========================================================================
    // Host Hooks
    // ========================================================================

    /// Host loaded the monitor. Prints the banner; does not start.
    pub fn on_load(&self) {
        info!(
            interval_ms = self.config.update_interval_ms(),
            max_tracks = self.config.max_tracks(),
            max_clips = self.config.max_clips(),
            "Monitor loaded"
        );
        self.emit(READY_BANNER);
    }

    /// Host is removing the monitor.
    ///
    /// Tears everything down regardless of the tracked state, so no
    /// subscription can outlive the monitor.
    pub fn unload(&mut self) {
        self.cancel_pending_restart();
        let was_active = self.state.is_active();
        let report = self.teardown();
        info!(
            was_active,
            released = report.closed,
            failed = report.failed,
            "Monitor unloaded"
        );
        self.emit("livewatch unloaded");
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Enters the active state and sets up all observers.
    ///
    /// Returns false (and changes nothing) if already active. Also returns
    /// false, back in the idle state, when no observer could be created.
    pub fn start(&mut self) -> bool {
        if self.state.is_active() {
            warn!("Start requested while already active, ignoring");
            self.emit("Monitor is already running");
            return false;
        }

        self.cancel_pending_restart();
        self.state = MonitorState::Active;
        self.health.reset();
        self.grid.clear();

        info!(
            max_tracks = self.config.max_tracks(),
            max_clips = self.config.max_clips(),
            interval_ms = self.config.update_interval_ms(),
            "Monitor starting"
        );

        self.observe(
            EntityPath::live_set(),
            property::IS_PLAYING,
            ObserverRole::Transport,
        );
        self.observe(EntityPath::live_set(), property::TEMPO, ObserverRole::Tempo);
        self.observe(
            EntityPath::song_view(),
            property::SELECTED_TRACK,
            ObserverRole::SelectedTrack,
        );

        let tracks = ClipGridScanner::new(self.session.as_ref())
            .resolve_track_count(self.config.max_tracks());
        self.observe_mixer_parameters(tracks.count);
        self.observe_clip_grid(tracks);

        if self.registry.is_empty() {
            warn!("Every subscription was rejected, monitor not started");
            self.teardown();
            self.emit("No observers could be created - monitor not started");
            return false;
        }

        if self.config.periodic_display_enabled() {
            self.reporter
                .start(self.config.update_interval(), &self.events);
        }

        info!(
            observers = self.registry.len(),
            clip_slots = self.grid.len(),
            tracks = tracks.count,
            "Monitor started"
        );
        self.emit(&format!(
            "Monitor started: {} observers ({} clip slots on {} tracks)",
            self.registry.len(),
            self.grid.len(),
            tracks.count
        ));
        true
    }

    /// Tears down all observers and the reporter, then prints the health
    /// summary of the period that just ended.
    ///
    /// Returns false if there was nothing to stop.
    pub fn stop(&mut self) -> bool {
        let cancelled_restart = self.cancel_pending_restart();

        if !self.state.is_active() {
            if cancelled_restart {
                info!("Pending restart cancelled");
                self.emit("Pending restart cancelled");
                return true;
            }
            warn!("Stop requested while idle, ignoring");
            self.emit("Monitor is not running");
            return false;
        }

        let report = self.teardown();
        info!(
            released = report.closed,
            failed = report.failed,
            "Monitor stopped"
        );
        self.emit(&format!(
            "Monitor stopped ({} observers released)",
            report.total()
        ));
        self.emit(&self.health.summary());
        true
    }

    /// Stops now and schedules a start after [`RESTART_DELAY`].
    pub fn restart(&mut self) {
        info!("Restart requested");
        let was_active = self.state.is_active();
        if was_active {
            self.stop();
        } else {
            self.cancel_pending_restart();
        }

        self.restart_generation += 1;
        self.pending_restart = Some(TimerHandle::schedule(
            RESTART_DELAY,
            self.events.clone(),
            MonitorEvent::DeferredStart {
                generation: self.restart_generation,
            },
        ));
        let verb = if was_active { "Restarting" } else { "Starting" };
        self.emit(&format!("{verb} in {} ms", RESTART_DELAY.as_millis()));
    }

    /// Current state, observer count and success rates. No side effects.
    pub fn status(&self) -> MonitorStatus {
        MonitorStatus {
            state: self.state,
            observers: self.registry.len(),
            clip_slots: self.grid.len(),
            reporter_running: self.reporter.is_running(),
            restart_pending: self.pending_restart.is_some(),
            transport_rate: self.health.rate(HealthCategory::Transport),
            session_rate: self.health.rate(HealthCategory::Session),
        }
    }

    /// Takes and prints one snapshot without entering the active state.
    ///
    /// Reads made here do not count toward the health counters.
    pub fn quick(&self) -> StatusSnapshot {
        let snapshot = SnapshotReader::new(self.session.as_ref()).capture(None);
        self.emit(&render_dashboard(QUICK_TITLE, &snapshot, None));
        snapshot
    }

    /// Prints and returns the health summary.
    pub fn health_summary(&self) -> String {
        let summary = self.health.summary();
        self.emit(&summary);
        summary
    }

    /// Changes one configuration value.
    ///
    /// While active, reporter settings restart the periodic task only;
    /// observers are left alone. Grid limits apply from the next start.
    pub fn set_config(&mut self, key: ConfigKey, value: &str) -> Result<ConfigUpdate, MonitorError> {
        let update = self.config.set(key, value)?;
        info!(key = %key, value = %update.value, clamped = update.clamped, "Configuration changed");
        self.emit(&update.to_string());

        if self.state.is_active() && update.changed {
            if key.affects_reporter() {
                self.refresh_reporter();
            } else {
                self.emit("Grid limits take effect on next start");
            }
        }
        Ok(update)
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Handles a wakeup posted by the session or a timer.
    pub fn handle_event(&mut self, event: MonitorEvent) {
        match event {
            MonitorEvent::PropertyChanged { observer, value } => {
                self.on_property_changed(observer, value)
            }
            MonitorEvent::ReporterTick { generation } => self.on_reporter_tick(generation),
            MonitorEvent::DeferredStart { generation } => self.on_deferred_start(generation),
        }
    }

    fn on_property_changed(&mut self, observer: ObserverId, value: PropertyValue) {
        if !self.state.is_active() {
            debug!(%observer, "Ignoring notification while idle");
            return;
        }
        let Some(role) = self.registry.role_of(observer) else {
            debug!(%observer, "Ignoring notification from released observer");
            return;
        };

        if let Some(line) = self.describe_change(role, &value) {
            self.emit(&line);
        }
    }

    fn on_reporter_tick(&mut self, generation: u64) {
        if !self.state.is_active() {
            self.reporter.cancel();
            debug!(generation, "Reporter tick while idle, cancelled");
            return;
        }
        if !self.reporter.is_current(generation) {
            debug!(generation, "Ignoring tick from replaced reporter task");
            return;
        }

        let snapshot =
            SnapshotReader::new(self.session.as_ref()).capture(Some(&mut self.health));
        self.emit(&render_dashboard(DASHBOARD_TITLE, &snapshot, Some(&self.health)));

        if self.state.is_active() {
            self.reporter.reschedule(&self.events);
        }
    }

    fn on_deferred_start(&mut self, generation: u64) {
        if self.pending_restart.is_none() || generation != self.restart_generation {
            debug!(generation, "Ignoring superseded restart");
            return;
        }
        self.pending_restart = None;
        self.start();
    }

    /// Renders one change notification, recording health where a read is
    /// involved. Returns `None` for changes not worth printing.
    fn describe_change(&mut self, role: ObserverRole, value: &PropertyValue) -> Option<String> {
        match role {
            ObserverRole::Transport => {
                let playing = value.as_bool();
                self.health
                    .record(HealthCategory::Transport, playing.is_some());
                Some(match playing {
                    Some(true) => "Transport: PLAYING".to_string(),
                    Some(false) => "Transport: STOPPED".to_string(),
                    None => format!("Transport: {UNAVAILABLE}"),
                })
            }
            ObserverRole::Tempo => Some(match value.as_f64() {
                Some(bpm) => format!("Tempo: {bpm:.2} BPM"),
                None => format!("Tempo: {UNAVAILABLE}"),
            }),
            ObserverRole::SelectedTrack => {
                let reader = SnapshotReader::new(self.session.as_ref());
                let name = value
                    .expect_path(property::SELECTED_TRACK)
                    .and_then(|track| reader.track_name(&track));
                self.health.record(HealthCategory::Session, name.is_ok());
                Some(match name {
                    Ok(name) => format!("Selected track: {name}"),
                    Err(e) => {
                        debug!(error = %e, "Selected track name unavailable");
                        format!("Selected track: {UNAVAILABLE}")
                    }
                })
            }
            ObserverRole::Volume { track } => Some(match value.as_f64() {
                Some(raw) => format!("Track {} volume: {}", track + 1, Volume::clamped(raw)),
                None => format!("Track {} volume: {UNAVAILABLE}", track + 1),
            }),
            ObserverRole::Pan { track } => Some(match value.as_f64() {
                Some(raw) => format!("Track {} pan: {}", track + 1, Pan::clamped(raw)),
                None => format!("Track {} pan: {UNAVAILABLE}", track + 1),
            }),
            ObserverRole::ClipPlaying(slot) => {
                let coordinate = self.grid.get(slot)?;
                Some(match value.as_bool() {
                    Some(true) => format!("Clip {coordinate} playing"),
                    Some(false) => format!("Clip {coordinate} stopped"),
                    None => format!("Clip {coordinate}: {UNAVAILABLE}"),
                })
            }
            ObserverRole::ClipTriggered(slot) => {
                let coordinate = self.grid.get(slot)?;
                match value.as_bool() {
                    Some(true) => Some(format!("Clip {coordinate} triggered (launch pending)")),
                    Some(false) => None,
                    None => Some(format!("Clip {coordinate}: {UNAVAILABLE}")),
                }
            }
        }
    }

    // ========================================================================
    // Setup Steps
    // ========================================================================

    /// Subscribes one observer. A failure is logged and skipped.
    fn observe(&mut self, path: EntityPath, property: &str, role: ObserverRole) -> bool {
        match self.registry.subscribe(
            self.session.as_ref(),
            path,
            property,
            role,
            &self.events,
        ) {
            Ok(_) => true,
            Err(e) => {
                warn!(property, error = %e, "Could not observe property, skipping");
                false
            }
        }
    }

    fn observe_mixer_parameters(&mut self, tracks: usize) {
        for track in 0..tracks {
            self.observe(
                EntityPath::mixer_parameter(track, MixerParameter::Volume),
                property::VALUE,
                ObserverRole::Volume { track },
            );
            self.observe(
                EntityPath::mixer_parameter(track, MixerParameter::Pan),
                property::VALUE,
                ObserverRole::Pan { track },
            );
        }
    }

    /// Probes the clip grid and puts two observers on every slot found.
    fn observe_clip_grid(&mut self, tracks: TrackResolution) {
        if tracks.count == 0 {
            warn!("No tracks detected, skipping clip grid");
            self.emit("No tracks detected - clip grid skipped");
            return;
        }

        let scan = ClipGridScanner::new(self.session.as_ref())
            .scan_tracks(tracks, self.config.max_clips());

        for coordinate in scan.coordinates {
            let slot = self.grid.next_slot();
            let path = EntityPath::clip_slot(coordinate);
            let playing = self.observe(
                path.clone(),
                property::IS_PLAYING,
                ObserverRole::ClipPlaying(slot),
            );
            let triggered =
                self.observe(path, property::IS_TRIGGERED, ObserverRole::ClipTriggered(slot));
            // Only slots with at least one live observer count as monitored.
            if playing || triggered {
                self.grid.insert(coordinate);
            }
        }
    }

    // ========================================================================
    // Teardown Helpers
    // ========================================================================

    /// Releases observers, cancels the reporter and goes idle.
    fn teardown(&mut self) -> TeardownReport {
        let report = self.registry.unsubscribe_all(self.session.as_ref());
        self.reporter.cancel();
        self.grid.clear();
        self.state = MonitorState::Idle;
        report
    }

    /// Cancels a scheduled restart. Returns true if one was pending.
    fn cancel_pending_restart(&mut self) -> bool {
        match self.pending_restart.take() {
            Some(timer) => {
                timer.cancel();
                self.restart_generation += 1;
                true
            }
            None => false,
        }
    }

    fn refresh_reporter(&mut self) {
        self.reporter.cancel();
        if self.config.periodic_display_enabled() {
            self.reporter
                .start(self.config.update_interval(), &self.events);
        }
    }

    fn emit(&self, text: &str) {
        self.sink.emit(text);
    }
}
