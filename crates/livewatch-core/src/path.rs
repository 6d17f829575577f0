//! Entity paths into the live session's object tree.
//!
//! Paths are space-separated segments rooted at `live_set`, e.g.
//! `live_set tracks 2 clip_slots 0`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ClipSlotCoordinate;

/// Child collection holding the set's tracks.
pub const TRACKS: &str = "tracks";

/// Child collection holding a track's clip slots.
pub const CLIP_SLOTS: &str = "clip_slots";

/// Well-known property names read or observed by the monitor.
pub mod property {
    pub const IS_PLAYING: &str = "is_playing";
    pub const TEMPO: &str = "tempo";
    pub const CURRENT_SONG_TIME: &str = "current_song_time";
    pub const SELECTED_TRACK: &str = "selected_track";
    pub const NAME: &str = "name";
    pub const MUTE: &str = "mute";
    pub const SOLO: &str = "solo";
    pub const ARM: &str = "arm";
    pub const VALUE: &str = "value";
    pub const IS_TRIGGERED: &str = "is_triggered";
}

/// One of the per-track mixer parameters the monitor observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MixerParameter {
    Volume,
    Pan,
}

impl MixerParameter {
    /// Path segment naming this parameter under `mixer_device`.
    pub fn segment(&self) -> &'static str {
        match self {
            Self::Volume => "volume",
            Self::Pan => "panning",
        }
    }
}

/// Path to an entity in the session tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityPath(String);

impl EntityPath {
    /// Wraps a raw path string.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The song root.
    pub fn live_set() -> Self {
        Self::new("live_set")
    }

    /// The song view, which owns the track selection.
    pub fn song_view() -> Self {
        Self::new("live_set view")
    }

    /// Track at `index` in the set's track list.
    pub fn track(index: usize) -> Self {
        Self(format!("live_set {TRACKS} {index}"))
    }

    /// Mixer parameter of the track at `index`.
    pub fn mixer_parameter(track: usize, parameter: MixerParameter) -> Self {
        Self(format!(
            "live_set {TRACKS} {track} mixer_device {}",
            parameter.segment()
        ))
    }

    /// Clip slot at the given grid coordinate.
    pub fn clip_slot(coordinate: ClipSlotCoordinate) -> Self {
        Self(format!(
            "live_set {TRACKS} {} {CLIP_SLOTS} {}",
            coordinate.track_index, coordinate.clip_index
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
