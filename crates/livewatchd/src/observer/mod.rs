//! Property observers and the registry that owns them.
//!
//! A [`PropertyObserver`] is one live subscription to one property of one
//! entity. The [`ObserverRegistry`] is the only owner of observers: it
//! creates them, routes their notifications into the monitor queue, and
//! tears them all down on stop.

use std::fmt;

use livewatch_core::{EntityPath, LiveSession, SessionResult, SubscriptionHandle};

use crate::scanner::SlotId;

mod registry;

pub use registry::{ObserverRegistry, TeardownReport};

/// Identity of an observer. Never reused within one monitor, so a
/// notification carrying the id of a torn-down observer cannot be
/// mistaken for a live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl ObserverId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obs#{}", self.0)
    }
}

/// What an observer watches, used to render its notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverRole {
    Transport,
    Tempo,
    SelectedTrack,
    Volume { track: usize },
    Pan { track: usize },
    ClipPlaying(SlotId),
    ClipTriggered(SlotId),
}

impl ObserverRole {
    pub fn is_clip_slot(&self) -> bool {
        matches!(self, Self::ClipPlaying(_) | Self::ClipTriggered(_))
    }
}

/// One subscription to one property of one entity.
#[derive(Debug)]
pub struct PropertyObserver {
    id: ObserverId,
    path: EntityPath,
    property: String,
    role: ObserverRole,
    handle: SubscriptionHandle,
}

impl PropertyObserver {
    pub fn id(&self) -> ObserverId {
        self.id
    }

    pub fn path(&self) -> &EntityPath {
        &self.path
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn role(&self) -> ObserverRole {
        self.role
    }

    pub fn handle(&self) -> SubscriptionHandle {
        self.handle
    }

    /// Releases the subscription with the session.
    pub fn close(self, session: &dyn LiveSession) -> SessionResult<()> {
        session.unsubscribe(self.handle)
    }
}
