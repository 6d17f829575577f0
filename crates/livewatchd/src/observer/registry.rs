//! Observer registry - owns every active subscription.

use std::collections::{BTreeMap, HashSet};

use livewatch_core::{ChangeCallback, EntityPath, LiveSession};
use tracing::debug;

use super::{ObserverId, ObserverRole, PropertyObserver};
use crate::error::MonitorError;
use crate::monitor::{EventSender, MonitorEvent};

/// Outcome of [`ObserverRegistry::unsubscribe_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub closed: usize,
    pub failed: usize,
}

impl TeardownReport {
    pub fn total(&self) -> usize {
        self.closed + self.failed
    }
}

/// Set of active observers, keyed by identity.
///
/// Holds at most one observer per `(path, property)` pair.
#[derive(Debug, Default)]
pub struct ObserverRegistry {
    observers: BTreeMap<ObserverId, PropertyObserver>,
    targets: HashSet<(EntityPath, String)>,
    next_id: u64,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to `property` on `path` and registers the observer.
    ///
    /// Notifications are posted to `events` tagged with the new observer's
    /// id. On failure nothing is registered.
    ///
    /// # Errors
    ///
    /// - `MonitorError::DuplicateObserver` if the pair is already observed
    /// - `MonitorError::Subscription` if the session rejects the subscription
    pub fn subscribe(
        &mut self,
        session: &dyn LiveSession,
        path: EntityPath,
        property: &str,
        role: ObserverRole,
        events: &EventSender,
    ) -> Result<ObserverId, MonitorError> {
        let target = (path, property.to_string());
        if self.targets.contains(&target) {
            let (path, property) = target;
            return Err(MonitorError::DuplicateObserver { path, property });
        }
        let (path, property) = target;

        let id = ObserverId(self.next_id);
        self.next_id += 1;

        let sender = events.clone();
        let callback: ChangeCallback = Box::new(move |value| {
            sender.send(MonitorEvent::PropertyChanged {
                observer: id,
                value,
            });
        });

        let handle = session
            .subscribe(&path, &property, callback)
            .map_err(|source| MonitorError::Subscription {
                path: path.clone(),
                property: property.clone(),
                source,
            })?;

        debug!(observer = %id, %path, %property, %handle, "Observer registered");

        self.targets.insert((path.clone(), property.clone()));
        self.observers.insert(
            id,
            PropertyObserver {
                id,
                path,
                property,
                role,
                handle,
            },
        );
        Ok(id)
    }

    /// Closes every observer, best effort, and empties the registry.
    ///
    /// A failed close is logged and skipped. Calling this on an empty
    /// registry does nothing.
    pub fn unsubscribe_all(&mut self, session: &dyn LiveSession) -> TeardownReport {
        let mut report = TeardownReport::default();
        self.targets.clear();

        for (id, observer) in std::mem::take(&mut self.observers) {
            match observer.close(session) {
                Ok(()) => report.closed += 1,
                Err(source) => {
                    let err = MonitorError::Teardown {
                        observer: id,
                        source,
                    };
                    debug!(error = %err, "Ignoring teardown failure");
                    report.failed += 1;
                }
            }
        }

        if report.total() > 0 {
            debug!(
                closed = report.closed,
                failed = report.failed,
                "Observers released"
            );
        }
        report
    }

    /// Role of a registered observer, or `None` if it is not (or no longer)
    /// registered.
    pub fn role_of(&self, id: ObserverId) -> Option<ObserverRole> {
        self.observers.get(&id).map(PropertyObserver::role)
    }

    pub fn get(&self, id: ObserverId) -> Option<&PropertyObserver> {
        self.observers.get(&id)
    }

    pub fn is_observing(&self, path: &EntityPath, property: &str) -> bool {
        self.targets.contains(&(path.clone(), property.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyObserver> {
        self.observers.values()
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Number of observers attached to clip slots.
    pub fn clip_slot_observers(&self) -> usize {
        self.observers
            .values()
            .filter(|o| o.role().is_clip_slot())
            .count()
    }
}
