//! Interface to the external live session.
//!
//! The session is owned by the host. The monitor only reads from it and
//! subscribes to change notifications; it never writes. Every call returns
//! immediately with a value or a [`SessionError`].

use std::fmt;

use serde::Serialize;

use crate::{EntityPath, PropertyValue, SessionResult};

/// Opaque token for an active subscription, issued by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Callback invoked by the session with the new value of an observed property.
///
/// The session may call it from any thread, including after the
/// subscription was released if a notification was already in flight.
pub type ChangeCallback = Box<dyn Fn(PropertyValue) + Send + Sync>;

/// Read/subscribe access to a hierarchical live session.
pub trait LiveSession: Send + Sync {
    /// Reads the current value of `property` on `path`.
    fn read(&self, path: &EntityPath, property: &str) -> SessionResult<PropertyValue>;

    /// Registers `callback` for changes of `property` on `path`.
    fn subscribe(
        &self,
        path: &EntityPath,
        property: &str,
        callback: ChangeCallback,
    ) -> SessionResult<SubscriptionHandle>;

    /// Releases a subscription created by [`LiveSession::subscribe`].
    fn unsubscribe(&self, handle: SubscriptionHandle) -> SessionResult<()>;

    /// Counts the entries of the `child` collection under `path`.
    fn count_children(&self, path: &EntityPath, child: &str) -> SessionResult<usize>;

    /// Returns true if `path` resolves to an entity.
    fn exists(&self, path: &EntityPath) -> bool;
}
