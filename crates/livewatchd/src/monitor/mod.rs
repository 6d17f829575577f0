//! Live session monitor using the actor pattern.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐  MonitorCommand   ┌────────────────┐   emit    ┌────────────┐
//! │ MonitorHandle │──────────────────▶│  MonitorActor  │──────────▶│ StatusSink │
//! └───────────────┘  (mpsc, ordered)  │ (controller)   │           └────────────┘
//!                                     └────────────────┘
//!         ┌──────────────────────┐       ▲        │ subscribe / read
//!         │ session callbacks    │───────┘        ▼
//!         │ timer wakeups        │  MonitorEvent ┌─────────────┐
//!         └──────────────────────┘◀──────────────│ LiveSession │
//!                                                 └─────────────┘
//! ```
//!
//! Callbacks and timers hold an [`EventSender`], a weak sender: they can
//! post into the queue but do not keep the actor alive.
//!
//! # Panic-Free Guarantees
//!
//! All operations in this module follow the panic-free policy:
//! - No `.unwrap()` or `.expect()` in production code
//! - Channel operations handle closure gracefully

use std::sync::Arc;

use livewatch_core::{Configuration, LiveSession};
use tokio::sync::mpsc;

use crate::sink::StatusSink;

mod actor;
mod commands;
mod controller;
mod handle;

pub use actor::MonitorActor;
pub use commands::{EventSender, MonitorCommand, MonitorEvent, MonitorStatus};
pub use controller::{MonitorController, READY_BANNER, RESTART_DELAY};
pub use handle::MonitorHandle;

/// Spawns the monitor actor and returns a handle for interaction.
///
/// The monitor starts idle; the banner is printed to `sink` as soon as
/// the actor runs. Must be called from within a tokio runtime.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use livewatch_core::Configuration;
/// use livewatchd::monitor::spawn_monitor;
/// use livewatchd::sim::SimulatedSession;
/// use livewatchd::sink::StdoutSink;
///
/// #[tokio::main]
/// async fn main() {
///     let session = Arc::new(SimulatedSession::with_grid(4, 4));
///     let handle = spawn_monitor(session, Configuration::default(), Arc::new(StdoutSink));
///
///     let _ = handle.start().await;
///     let _ = handle.unload().await;
/// }
/// ```
pub fn spawn_monitor(
    session: Arc<dyn LiveSession>,
    config: Configuration,
    sink: Arc<dyn StatusSink>,
) -> MonitorHandle {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

    let controller = MonitorController::new(session, config, EventSender::new(&cmd_tx), sink);
    tokio::spawn(MonitorActor::new(cmd_rx, controller).run());

    MonitorHandle::new(cmd_tx)
}
