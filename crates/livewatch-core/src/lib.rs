//! livewatch core - shared types for live session monitoring
//!
//! This crate provides the domain types shared between the monitor
//! (`livewatchd`) and the command protocol (`livewatch-protocol`):
//! the [`LiveSession`] interface to the host, entity paths and values,
//! configuration, health counters and status snapshots.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod config;
pub mod coordinate;
pub mod error;
pub mod health;
pub mod path;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod value;

// Re-exports for convenience
pub use config::{
    default_config_path, ConfigKey, ConfigUpdate, Configuration, DEFAULT_UPDATE_INTERVAL_MS,
    MIN_UPDATE_INTERVAL_MS,
};
pub use coordinate::ClipSlotCoordinate;
pub use error::{ConfigError, SessionError, SessionResult};
pub use health::{ConnectionHealthTracker, HealthCategory, HealthCounter, SuccessRate};
pub use path::{property, EntityPath, MixerParameter, CLIP_SLOTS, TRACKS};
pub use session::{ChangeCallback, LiveSession, SubscriptionHandle};
pub use snapshot::{StatusSnapshot, TrackFlags, UNAVAILABLE};
pub use state::MonitorState;
pub use value::{Pan, PanDirection, PropertyValue, Volume};
