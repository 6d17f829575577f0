//! Clip grid coordinates.

use std::fmt;

use serde::Serialize;

/// Position of a clip slot in the session grid (zero-based).
///
/// A coordinate only says where a slot *could* be; whether the session
/// actually has a slot there must be probed before subscribing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClipSlotCoordinate {
    pub track_index: usize,
    pub clip_index: usize,
}

impl ClipSlotCoordinate {
    pub fn new(track_index: usize, clip_index: usize) -> Self {
        Self {
            track_index,
            clip_index,
        }
    }
}

/// Displays one-based, the way the host numbers tracks and scenes.
impl fmt::Display for ClipSlotCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.track_index + 1, self.clip_index + 1)
    }
}
