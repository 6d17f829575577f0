//! Periodic status reporting.
//!
//! The reporter is a self-rescheduling task: each tick arms the next one
//! only after the current snapshot has been taken and printed, so ticks can
//! never overlap. Each tick gathers a [`StatusSnapshot`] from five isolated
//! reads. A failed read blanks only its own field.
//!
//! # Panic-Free Guarantees
//!
//! All code follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Read failures are converted to `None`, never propagated

use std::time::Duration;

use chrono::Local;
use livewatch_core::{
    property, ConnectionHealthTracker, EntityPath, HealthCategory, LiveSession, SessionResult,
    StatusSnapshot, TrackFlags,
};
use tracing::debug;

use crate::error::MonitorError;
use crate::monitor::{EventSender, MonitorEvent};
use crate::timer::TimerHandle;

// ============================================================================
// Snapshot Reads
// ============================================================================

/// Gathers status snapshots from a live session.
pub struct SnapshotReader<'a> {
    session: &'a dyn LiveSession,
}

impl<'a> SnapshotReader<'a> {
    pub fn new(session: &'a dyn LiveSession) -> Self {
        Self { session }
    }

    /// Reads a fresh snapshot.
    ///
    /// When `health` is given, the transport read counts toward the
    /// `transport` category and the selected track name read toward
    /// `session`.
    pub fn capture(&self, mut health: Option<&mut ConnectionHealthTracker>) -> StatusSnapshot {
        let live_set = EntityPath::live_set();

        let transport_playing = isolated("transport", || {
            self.session
                .read(&live_set, property::IS_PLAYING)?
                .expect_bool(property::IS_PLAYING)
        });
        if let Some(tracker) = health.as_deref_mut() {
            tracker.record(HealthCategory::Transport, transport_playing.is_some());
        }

        let tempo_bpm = isolated("tempo", || {
            self.session
                .read(&live_set, property::TEMPO)?
                .expect_f64(property::TEMPO)
        });

        let song_position_beats = isolated("song position", || {
            self.session
                .read(&live_set, property::CURRENT_SONG_TIME)?
                .expect_f64(property::CURRENT_SONG_TIME)
        });

        let selected_track = isolated("selected track", || self.selected_track());

        let selected_track_name = selected_track
            .as_ref()
            .and_then(|track| isolated("track name", || self.track_name(track)));
        if let Some(tracker) = health.as_deref_mut() {
            tracker.record(HealthCategory::Session, selected_track_name.is_some());
        }

        let selected_track_flags = selected_track
            .as_ref()
            .and_then(|track| isolated("track flags", || self.track_flags(track)));

        StatusSnapshot {
            transport_playing,
            tempo_bpm,
            song_position_beats,
            selected_track_name,
            selected_track_flags,
        }
    }

    /// Path of the track currently selected in the song view.
    pub fn selected_track(&self) -> SessionResult<EntityPath> {
        self.session
            .read(&EntityPath::song_view(), property::SELECTED_TRACK)?
            .expect_path(property::SELECTED_TRACK)
    }

    pub fn track_name(&self, track: &EntityPath) -> SessionResult<String> {
        self.session
            .read(track, property::NAME)?
            .expect_text(property::NAME)
    }

    pub fn track_flags(&self, track: &EntityPath) -> SessionResult<TrackFlags> {
        let flag = |name: &str| -> SessionResult<bool> {
            self.session.read(track, name)?.expect_bool(name)
        };
        Ok(TrackFlags {
            muted: flag(property::MUTE)?,
            solo: flag(property::SOLO)?,
            armed: flag(property::ARM)?,
        })
    }
}

/// Runs one read; a failure is logged and becomes `None`.
fn isolated<T>(field: &'static str, read: impl FnOnce() -> SessionResult<T>) -> Option<T> {
    match read() {
        Ok(value) => Some(value),
        Err(source) => {
            let err = MonitorError::Read { field, source };
            debug!(error = %err, "Snapshot field unavailable");
            None
        }
    }
}

/// Renders a snapshot as a dashboard block with a timestamp header and,
/// if given, a health footer.
pub fn render_dashboard(
    title: &str,
    snapshot: &StatusSnapshot,
    health: Option<&ConnectionHealthTracker>,
) -> String {
    let mut out = format!(
        "=== {title} @ {} ===\n{}",
        Local::now().format("%H:%M:%S"),
        snapshot.render()
    );
    if let Some(tracker) = health {
        out.push_str("\nHealth    : ");
        out.push_str(&tracker.rates_line());
    }
    out
}

// ============================================================================
// Periodic Reporter
// ============================================================================

/// Timer bookkeeping for the recurring status display.
///
/// Every (re)start bumps the generation. A tick carrying an older
/// generation was armed by a task that has since been replaced or
/// cancelled, and is ignored.
#[derive(Debug, Default)]
pub struct PeriodicStatusReporter {
    interval: Duration,
    generation: u64,
    timer: Option<TimerHandle>,
}

impl PeriodicStatusReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or replaces) the recurring task with `interval`.
    pub fn start(&mut self, interval: Duration, events: &EventSender) {
        self.cancel();
        self.interval = interval;
        self.arm(events);
        debug!(
            interval_ms = interval.as_millis() as u64,
            generation = self.generation,
            "Periodic reporter started"
        );
    }

    /// Arms the next tick with the current interval.
    pub fn reschedule(&mut self, events: &EventSender) {
        if self.timer.is_some() {
            self.arm(events);
        }
    }

    fn arm(&mut self, events: &EventSender) {
        self.timer = Some(TimerHandle::schedule(
            self.interval,
            events.clone(),
            MonitorEvent::ReporterTick {
                generation: self.generation,
            },
        ));
    }

    /// Cancels the pending tick, if any. Safe to call when not running.
    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
            debug!(generation = self.generation, "Periodic reporter cancelled");
        }
        self.generation += 1;
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// True if a tick with `generation` belongs to the running task.
    pub fn is_current(&self, generation: u64) -> bool {
        self.timer.is_some() && generation == self.generation
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
