//! In-memory [`LiveSession`] for tests and the demo binary.
//!
//! Models a song with tracks, per-track mixer parameters and a clip grid.
//! Every failure mode the monitor must survive can be switched on:
//! rejected reads, rejected subscriptions, failing unsubscribes, a failing
//! bulk track count, and periodic read flakiness.
//!
//! Callbacks are invoked synchronously from [`SimulatedSession::set`], on
//! the caller's thread and outside the internal lock, the way a host would
//! call them from its own thread.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use livewatch_core::{
    property, ChangeCallback, ClipSlotCoordinate, EntityPath, LiveSession, MixerParameter,
    PropertyValue, SessionError, SessionResult, SubscriptionHandle, CLIP_SLOTS, TRACKS,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Default tempo of a fresh set.
pub const DEFAULT_TEMPO: f64 = 120.0;

/// Default fader position of a new track.
pub const DEFAULT_VOLUME: f64 = 0.85;

/// Released subscriptions kept for [`SimulatedSession::deliver_in_flight`].
/// The oldest are dropped first.
pub const RELEASED_CAPACITY: usize = 256;

type SharedCallback = Arc<dyn Fn(PropertyValue) + Send + Sync>;

struct Subscription {
    path: EntityPath,
    property: String,
    callback: SharedCallback,
}

impl Subscription {
    fn matches(&self, path: &EntityPath, property: &str) -> bool {
        self.path == *path && self.property == property
    }
}

#[derive(Default)]
struct SimState {
    entities: BTreeMap<EntityPath, BTreeMap<String, PropertyValue>>,
    /// Clip slot count per track, in track order
    tracks: Vec<usize>,
    active: HashMap<SubscriptionHandle, Subscription>,
    released: VecDeque<Subscription>,
    next_handle: u64,

    failing_reads: HashSet<String>,
    failing_subscriptions: HashSet<String>,
    fail_unsubscribes: bool,
    fail_child_counts: bool,
    flaky_every: Option<u64>,

    reads: u64,
    subscribe_calls: usize,
    unsubscribe_calls: usize,
}

impl SimState {
    fn put(&mut self, path: EntityPath, property: &str, value: PropertyValue) {
        self.entities
            .entry(path)
            .or_default()
            .insert(property.to_string(), value);
    }
}

/// Thread-safe simulated live session.
pub struct SimulatedSession {
    state: Mutex<SimState>,
}

impl Default for SimulatedSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSession {
    /// A set with no tracks: transport stopped at 120 BPM, nothing selected.
    pub fn new() -> Self {
        let session = Self {
            state: Mutex::new(SimState::default()),
        };
        {
            let mut state = session.lock();
            let live_set = EntityPath::live_set();
            state.put(live_set.clone(), property::IS_PLAYING, PropertyValue::Bool(false));
            state.put(live_set.clone(), property::TEMPO, PropertyValue::Float(DEFAULT_TEMPO));
            state.put(live_set, property::CURRENT_SONG_TIME, PropertyValue::Float(0.0));
            state.entities.entry(EntityPath::song_view()).or_default();
        }
        session
    }

    /// A set with `tracks` tracks named "Track 1".. each holding `clips`
    /// clip slots.
    pub fn with_grid(tracks: usize, clips: usize) -> Self {
        let session = Self::new();
        for index in 0..tracks {
            session.add_track(&format!("Track {}", index + 1), clips);
        }
        session
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // Building and Mutating the Set
    // ========================================================================

    /// Appends a track with `clips` clip slots and returns its index.
    ///
    /// The first track added becomes the selected track.
    pub fn add_track(&self, name: &str, clips: usize) -> usize {
        let mut state = self.lock();
        let index = state.tracks.len();
        let track = EntityPath::track(index);

        state.put(track.clone(), property::NAME, PropertyValue::Text(name.to_string()));
        for flag in [property::MUTE, property::SOLO, property::ARM] {
            state.put(track.clone(), flag, PropertyValue::Bool(false));
        }
        state.put(
            EntityPath::mixer_parameter(index, MixerParameter::Volume),
            property::VALUE,
            PropertyValue::Float(DEFAULT_VOLUME),
        );
        state.put(
            EntityPath::mixer_parameter(index, MixerParameter::Pan),
            property::VALUE,
            PropertyValue::Float(0.0),
        );
        for clip in 0..clips {
            let slot = EntityPath::clip_slot(ClipSlotCoordinate::new(index, clip));
            state.put(slot.clone(), property::IS_PLAYING, PropertyValue::Bool(false));
            state.put(slot, property::IS_TRIGGERED, PropertyValue::Bool(false));
        }

        let view = EntityPath::song_view();
        let has_selection = state
            .entities
            .get(&view)
            .is_some_and(|props| props.contains_key(property::SELECTED_TRACK));
        if !has_selection {
            state.put(view, property::SELECTED_TRACK, PropertyValue::Path(track));
        }

        state.tracks.push(clips);
        index
    }

    /// Sets a property and notifies its subscribers.
    ///
    /// Creates the entity if needed. Returns the number of callbacks run.
    pub fn set(&self, path: &EntityPath, property: &str, value: PropertyValue) -> usize {
        let callbacks: Vec<SharedCallback> = {
            let mut state = self.lock();
            state.put(path.clone(), property, value.clone());
            state
                .active
                .values()
                .filter(|sub| sub.matches(path, property))
                .map(|sub| Arc::clone(&sub.callback))
                .collect()
        };

        for callback in &callbacks {
            callback(value.clone());
        }
        callbacks.len()
    }

    /// Removes an entity so that reads fail and existence probes miss it.
    pub fn remove_entity(&self, path: &EntityPath) {
        self.lock().entities.remove(path);
    }

    /// Fires callbacks of subscriptions that were already released,
    /// modelling a notification that was in flight during teardown.
    ///
    /// Returns the number of callbacks run.
    pub fn deliver_in_flight(&self, path: &EntityPath, property: &str, value: PropertyValue) -> usize {
        let callbacks: Vec<SharedCallback> = self
            .lock()
            .released
            .iter()
            .filter(|sub| sub.matches(path, property))
            .map(|sub| Arc::clone(&sub.callback))
            .collect();

        for callback in &callbacks {
            callback(value.clone());
        }
        callbacks.len()
    }

    /// Drops every released subscription, so late deliveries reach nobody.
    pub fn forget_released(&self) {
        self.lock().released.clear();
    }

    // ========================================================================
    // Failure Injection
    // ========================================================================

    /// Every read of `property` fails from now on.
    pub fn fail_reads_of(&self, property: &str) {
        self.lock().failing_reads.insert(property.to_string());
    }

    /// Every subscription to `property` is rejected from now on.
    pub fn fail_subscriptions_to(&self, property: &str) {
        self.lock()
            .failing_subscriptions
            .insert(property.to_string());
    }

    pub fn fail_unsubscribes(&self, fail: bool) {
        self.lock().fail_unsubscribes = fail;
    }

    /// Makes the bulk track count fail, forcing the probing fallback.
    pub fn fail_child_counts(&self, fail: bool) {
        self.lock().fail_child_counts = fail;
    }

    /// Every `every`-th read fails. `0` turns flakiness off.
    pub fn flaky_reads(&self, every: u64) {
        self.lock().flaky_every = (every > 0).then_some(every);
    }

    /// Turns every injected failure off.
    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.failing_reads.clear();
        state.failing_subscriptions.clear();
        state.fail_unsubscribes = false;
        state.fail_child_counts = false;
        state.flaky_every = None;
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    pub fn active_subscriptions(&self) -> usize {
        self.lock().active.len()
    }

    /// True if some active subscription watches `property` on `path`.
    pub fn is_subscribed(&self, path: &EntityPath, property: &str) -> bool {
        self.lock()
            .active
            .values()
            .any(|sub| sub.matches(path, property))
    }

    pub fn subscribe_calls(&self) -> usize {
        self.lock().subscribe_calls
    }

    pub fn unsubscribe_calls(&self) -> usize {
        self.lock().unsubscribe_calls
    }

    pub fn track_count(&self) -> usize {
        self.lock().tracks.len()
    }

    /// Current value of a property, bypassing failure injection.
    pub fn peek(&self, path: &EntityPath, property: &str) -> Option<PropertyValue> {
        self.lock()
            .entities
            .get(path)
            .and_then(|props| props.get(property))
            .cloned()
    }
}

impl LiveSession for SimulatedSession {
    fn read(&self, path: &EntityPath, property: &str) -> SessionResult<PropertyValue> {
        let mut state = self.lock();
        state.reads += 1;

        let rejected = |reason: &str| SessionError::ReadRejected {
            path: path.clone(),
            property: property.to_string(),
            reason: reason.to_string(),
        };

        if state.failing_reads.contains(property) {
            return Err(rejected("injected failure"));
        }
        if let Some(every) = state.flaky_every {
            if state.reads % every == 0 {
                return Err(rejected("flaky connection"));
            }
        }

        let props = state
            .entities
            .get(path)
            .ok_or_else(|| SessionError::NotFound(path.clone()))?;
        props
            .get(property)
            .cloned()
            .ok_or_else(|| rejected("no such property"))
    }

    fn subscribe(
        &self,
        path: &EntityPath,
        property: &str,
        callback: ChangeCallback,
    ) -> SessionResult<SubscriptionHandle> {
        let mut state = self.lock();
        state.subscribe_calls += 1;

        if state.failing_subscriptions.contains(property) {
            return Err(SessionError::SubscribeRejected {
                path: path.clone(),
                property: property.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        if !state.entities.contains_key(path) {
            return Err(SessionError::NotFound(path.clone()));
        }

        state.next_handle += 1;
        let handle = SubscriptionHandle::new(state.next_handle);
        state.active.insert(
            handle,
            Subscription {
                path: path.clone(),
                property: property.to_string(),
                callback: Arc::from(callback),
            },
        );
        Ok(handle)
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) -> SessionResult<()> {
        let mut state = self.lock();
        state.unsubscribe_calls += 1;

        if state.fail_unsubscribes {
            return Err(SessionError::UnsubscribeFailed {
                handle,
                reason: "injected failure".to_string(),
            });
        }
        match state.active.remove(&handle) {
            Some(sub) => {
                if state.released.len() == RELEASED_CAPACITY {
                    state.released.pop_front();
                }
                state.released.push_back(sub);
                Ok(())
            }
            None => Err(SessionError::UnsubscribeFailed {
                handle,
                reason: "unknown handle".to_string(),
            }),
        }
    }

    fn count_children(&self, path: &EntityPath, child: &str) -> SessionResult<usize> {
        let state = self.lock();
        let unavailable = |reason: &str| SessionError::CountUnavailable {
            path: path.clone(),
            child: child.to_string(),
            reason: reason.to_string(),
        };

        if state.fail_child_counts {
            return Err(unavailable("injected failure"));
        }
        if *path == EntityPath::live_set() && child == TRACKS {
            return Ok(state.tracks.len());
        }
        if child == CLIP_SLOTS {
            if let Some(clips) = (0..state.tracks.len())
                .find(|index| EntityPath::track(*index) == *path)
                .and_then(|index| state.tracks.get(index))
            {
                return Ok(*clips);
            }
        }
        Err(unavailable("unknown collection"))
    }

    fn exists(&self, path: &EntityPath) -> bool {
        self.lock().entities.contains_key(path)
    }
}

// ============================================================================
// Demo Performance
// ============================================================================

/// Plays a scripted performance on `sim` until `cancel` fires.
///
/// Every `step` the song position advances one beat. Over a cycle of
/// steps the driver toggles the transport, nudges the tempo, launches clips
/// round-robin (triggered first, playing on the next step), moves faders
/// and pans, and changes the selected track.
pub async fn perform(sim: Arc<SimulatedSession>, cancel: CancellationToken, step: Duration) {
    let tracks = sim.track_count();
    info!(tracks, step_ms = step.as_millis() as u64, "Simulated performance started");

    let live_set = EntityPath::live_set();
    let mut beat = 0.0_f64;
    let mut tick: usize = 0;
    let mut launching: Option<ClipSlotCoordinate> = None;
    let mut playing: Option<ClipSlotCoordinate> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(step) => {}
        }
        tick += 1;

        if tick % 16 == 1 {
            let running = tick % 32 == 1;
            sim.set(&live_set, property::IS_PLAYING, PropertyValue::Bool(running));
        }

        beat += 1.0;
        sim.set(&live_set, property::CURRENT_SONG_TIME, PropertyValue::Float(beat));

        if tick % 10 == 0 {
            let bpm = DEFAULT_TEMPO + (tick % 7) as f64 - 3.0;
            sim.set(&live_set, property::TEMPO, PropertyValue::Float(bpm));
        }

        if tracks == 0 {
            continue;
        }
        let track = tick % tracks;

        // A clip triggered on the previous step starts playing now.
        if let Some(coordinate) = launching.take() {
            let slot = EntityPath::clip_slot(coordinate);
            if let Some(previous) = playing.replace(coordinate) {
                sim.set(
                    &EntityPath::clip_slot(previous),
                    property::IS_PLAYING,
                    PropertyValue::Bool(false),
                );
            }
            sim.set(&slot, property::IS_TRIGGERED, PropertyValue::Bool(false));
            sim.set(&slot, property::IS_PLAYING, PropertyValue::Bool(true));
        } else if tick % 4 == 0 {
            let coordinate = ClipSlotCoordinate::new(track, (tick / 4) % 4);
            let slot = EntityPath::clip_slot(coordinate);
            if sim.exists(&slot) {
                sim.set(&slot, property::IS_TRIGGERED, PropertyValue::Bool(true));
                launching = Some(coordinate);
            }
        }

        if tick % 6 == 0 {
            let level = 0.5 + 0.05 * (tick % 10) as f64;
            sim.set(
                &EntityPath::mixer_parameter(track, MixerParameter::Volume),
                property::VALUE,
                PropertyValue::Float(level),
            );
        }
        if tick % 9 == 0 {
            let pan = ((tick % 5) as f64 - 2.0) * 0.25;
            sim.set(
                &EntityPath::mixer_parameter(track, MixerParameter::Pan),
                property::VALUE,
                PropertyValue::Float(pan),
            );
        }
        if tick % 12 == 0 {
            sim.set(
                &EntityPath::song_view(),
                property::SELECTED_TRACK,
                PropertyValue::Path(EntityPath::track(track)),
            );
        }
    }

    debug!(tick, "Simulated performance stopped");
}
