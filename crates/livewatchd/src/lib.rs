//! livewatch monitor - observer lifecycle and periodic status reporting
//!
//! This crate implements the monitor that runs inside a live session host:
//! - `monitor` - the Idle/Active state machine behind a serializing actor
//! - `observer` - property subscriptions and the registry that owns them
//! - `scanner` - bounded discovery of tracks and clip slots
//! - `reporter` - snapshot reads and the recurring dashboard
//! - `timer` - cancellable wakeups posted back into the monitor queue
//! - `sim` - an in-memory session with failure injection
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      livewatch monitor                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐    │
//! │  │  MonitorHandle  │────▶│       MonitorActor          │    │
//! │  │ (host commands) │     │  (owns MonitorController)   │    │
//! │  └─────────────────┘     └──────┬───────────────┬──────┘    │
//! │                                 │               │           │
//! │           MonitorEvent ▲        │ subscribe     │ emit      │
//! │                        │        ▼               ▼           │
//! │  ┌─────────────────────┴─┐  ┌──────────────┐ ┌───────────┐  │
//! │  │ callbacks and timers  │◀─│ LiveSession  │ │StatusSink │  │
//! │  └───────────────────────┘  └──────────────┘ └───────────┘  │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Session failures degrade output and never abort an operation
//! - Channel operations handle closure gracefully

pub mod error;
pub mod monitor;
pub mod observer;
pub mod reporter;
pub mod scanner;
pub mod sim;
pub mod sink;
pub mod timer;

pub use error::MonitorError;
pub use monitor::{spawn_monitor, MonitorHandle, MonitorStatus};
pub use sim::SimulatedSession;
pub use sink::{MemorySink, StatusSink, StdoutSink};
