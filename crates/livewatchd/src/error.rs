//! Monitor error taxonomy.
//!
//! None of these are fatal. Each variant maps to a degradation policy:
//! - `Subscription`: warn, skip that observer, keep setting up the rest
//! - `Read`: the affected snapshot field becomes unavailable
//! - `Discovery`: fall back to linear track probing
//! - `Teardown`: swallowed, the remaining observers are still closed

use livewatch_core::{ConfigError, EntityPath, SessionError};
use thiserror::Error;

use crate::observer::ObserverId;

/// Errors raised by the monitor.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Creating an observer failed
    #[error("failed to observe '{property}' on {path}: {source}")]
    Subscription {
        path: EntityPath,
        property: String,
        #[source]
        source: SessionError,
    },

    /// A single snapshot read failed or returned an unusable value
    #[error("failed to read {field}: {source}")]
    Read {
        field: &'static str,
        #[source]
        source: SessionError,
    },

    /// The bulk track count query failed
    #[error("track discovery failed: {0}")]
    Discovery(#[source] SessionError),

    /// Closing one subscription failed during bulk teardown
    #[error("failed to release observer {observer}: {source}")]
    Teardown {
        observer: ObserverId,
        #[source]
        source: SessionError,
    },

    /// An observer for this path/property pair already exists
    #[error("already observing '{property}' on {path}")]
    DuplicateObserver { path: EntityPath, property: String },

    /// A config mutation was rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The monitor actor is no longer running
    #[error("monitor channel closed")]
    ChannelClosed,
}
