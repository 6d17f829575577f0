//! Monitor actor commands, events, and status reports.
//!
//! This module defines the message types flowing into the `MonitorActor`:
//! - `MonitorCommand`: host requests, each answered through a oneshot channel
//! - `MonitorEvent`: wakeups raised by the session and by timers
//! - `MonitorStatus`: the read-only report returned by `status`

use std::fmt;

use livewatch_core::{
    ConfigKey, ConfigUpdate, Configuration, MonitorState, PropertyValue, StatusSnapshot,
    SuccessRate,
};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::error::MonitorError;
use crate::observer::ObserverId;

// ============================================================================
// Monitor Commands
// ============================================================================

/// Messages processed by the monitor actor, strictly one at a time.
#[derive(Debug)]
pub enum MonitorCommand {
    /// Enter the active state. Responds `true` if the state changed.
    Start { respond_to: oneshot::Sender<bool> },

    /// Leave the active state. Responds `true` if the state changed.
    Stop { respond_to: oneshot::Sender<bool> },

    /// Stop now and start again after the restart delay.
    Restart { respond_to: oneshot::Sender<()> },

    /// Report state, observer count and success rates.
    Status {
        respond_to: oneshot::Sender<MonitorStatus>,
    },

    /// Take and print a one-shot snapshot without entering the active state.
    Quick {
        respond_to: oneshot::Sender<StatusSnapshot>,
    },

    /// Print and return the health summary.
    Health { respond_to: oneshot::Sender<String> },

    /// Return the current configuration.
    GetConfig {
        respond_to: oneshot::Sender<Configuration>,
    },

    /// Change one configuration value.
    SetConfig {
        key: ConfigKey,
        value: String,
        respond_to: oneshot::Sender<Result<ConfigUpdate, MonitorError>>,
    },

    /// Host is removing the monitor: tear down unconditionally and exit.
    Unload { respond_to: oneshot::Sender<()> },

    /// Internal wakeup from the session or a timer.
    Event(MonitorEvent),
}

// ============================================================================
// Monitor Events
// ============================================================================

/// Wakeups that re-enter the monitor through its queue.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// An observed property changed.
    PropertyChanged {
        observer: ObserverId,
        value: PropertyValue,
    },

    /// The periodic reporter's timer expired.
    ReporterTick { generation: u64 },

    /// The restart delay elapsed.
    DeferredStart { generation: u64 },
}

/// Posts [`MonitorEvent`]s into the monitor queue without keeping it alive.
///
/// Session callbacks and timers hold one of these. Once every
/// [`MonitorHandle`](super::MonitorHandle) is gone the actor exits and
/// late sends are dropped.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::WeakUnboundedSender<MonitorCommand>,
}

impl EventSender {
    pub fn new(sender: &mpsc::UnboundedSender<MonitorCommand>) -> Self {
        Self {
            sender: sender.downgrade(),
        }
    }

    /// Queues `event`. Returns false if the monitor is gone.
    pub fn send(&self, event: MonitorEvent) -> bool {
        match self.sender.upgrade() {
            Some(sender) => sender.send(MonitorCommand::Event(event)).is_ok(),
            None => false,
        }
    }
}

// ============================================================================
// Status Report
// ============================================================================

/// Snapshot of the monitor's own state, returned by `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorStatus {
    pub state: MonitorState,
    pub observers: usize,
    pub clip_slots: usize,
    pub reporter_running: bool,
    pub restart_pending: bool,
    pub transport_rate: SuccessRate,
    pub session_rate: SuccessRate,
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Monitor {}", self.state)?;
        if self.restart_pending {
            f.write_str(" (restart pending)")?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "  observers: {} ({} clip slots)",
            self.observers, self.clip_slots
        )?;
        writeln!(
            f,
            "  periodic display: {}",
            if self.reporter_running { "running" } else { "off" }
        )?;
        write!(
            f,
            "  success rates: transport {} | session {}",
            self.transport_rate, self.session_rate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_sender_delivers_while_channel_open() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let events = EventSender::new(&tx);

        assert!(events.send(MonitorEvent::ReporterTick { generation: 3 }));
        assert!(matches!(
            rx.try_recv(),
            Ok(MonitorCommand::Event(MonitorEvent::ReporterTick { generation: 3 }))
        ));
    }

    #[test]
    fn test_event_sender_does_not_keep_channel_alive() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let events = EventSender::new(&tx);
        drop(tx);

        assert!(!events.send(MonitorEvent::DeferredStart { generation: 1 }));
    }

    #[test]
    fn test_status_display() {
        let status = MonitorStatus {
            state: MonitorState::Active,
            observers: 12,
            clip_slots: 4,
            reporter_running: true,
            restart_pending: false,
            transport_rate: SuccessRate::Percent(100.0),
            session_rate: SuccessRate::NotAvailable,
        };
        let text = status.to_string();
        assert!(text.starts_with("Monitor active"));
        assert!(text.contains("observers: 12 (4 clip slots)"));
        assert!(text.contains("transport 100.0% | session N/A"));
    }

    #[test]
    fn test_status_serializes() {
        let status = MonitorStatus {
            state: MonitorState::Idle,
            observers: 0,
            clip_slots: 0,
            reporter_running: false,
            restart_pending: true,
            transport_rate: SuccessRate::NotAvailable,
            session_rate: SuccessRate::Percent(30.0),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "idle");
        assert_eq!(json["session_rate"], "30.0%");
    }
}
