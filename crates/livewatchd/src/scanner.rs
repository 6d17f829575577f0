//! Clip grid discovery - finds which clip slots exist.
//!
//! The session makes no promise that a coordinate within the configured
//! bounds actually has a slot behind it, so every candidate is probed
//! before anything subscribes to it.
//!
//! # Strategy
//!
//! 1. Ask the session once for the number of tracks, clamped to the limit.
//! 2. If that query fails, probe track 0, 1, 2, ... and stop at the first
//!    gap. This can undercount but never reports a track that is not there.
//! 3. Probe each `(track, clip)` pair within the resolved bounds. Missing
//!    slots are an expected outcome and are skipped without complaint.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Discovery errors are logged but never fatal

use std::fmt;

use livewatch_core::{ClipSlotCoordinate, EntityPath, LiveSession, TRACKS};
use tracing::{debug, info, warn};

use crate::error::MonitorError;

// ============================================================================
// Result Types
// ============================================================================

/// How the track count was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountStrategy {
    /// One bulk child-count query
    Bulk,
    /// Linear existence probing after the bulk query failed
    Probed,
}

impl fmt::Display for CountStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bulk => f.write_str("bulk count"),
            Self::Probed => f.write_str("probing"),
        }
    }
}

/// Number of tracks the monitor will work with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackResolution {
    pub count: usize,
    pub strategy: CountStrategy,
}

/// Result of a clip grid scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub tracks: TrackResolution,
    /// Coordinates confirmed to exist, in track-major order
    pub coordinates: Vec<ClipSlotCoordinate>,
    /// Number of candidate coordinates probed
    pub probed: usize,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}

// ============================================================================
// Scanner
// ============================================================================

/// Bounded discovery of tracks and clip slots.
pub struct ClipGridScanner<'a> {
    session: &'a dyn LiveSession,
}

impl<'a> ClipGridScanner<'a> {
    pub fn new(session: &'a dyn LiveSession) -> Self {
        Self { session }
    }

    /// Resolves how many tracks exist, up to `max_tracks`.
    pub fn resolve_track_count(&self, max_tracks: usize) -> TrackResolution {
        match self
            .session
            .count_children(&EntityPath::live_set(), TRACKS)
        {
            Ok(count) => {
                let clamped = count.min(max_tracks);
                debug!(reported = count, used = clamped, "Track count from bulk query");
                TrackResolution {
                    count: clamped,
                    strategy: CountStrategy::Bulk,
                }
            }
            Err(source) => {
                let err = MonitorError::Discovery(source);
                warn!(error = %err, "Falling back to track probing");
                TrackResolution {
                    count: self.probe_track_count(max_tracks),
                    strategy: CountStrategy::Probed,
                }
            }
        }
    }

    /// Counts tracks by probing indices from zero until the first gap.
    fn probe_track_count(&self, max_tracks: usize) -> usize {
        (0..max_tracks)
            .take_while(|index| self.session.exists(&EntityPath::track(*index)))
            .count()
    }

    /// Full scan: resolve tracks, then probe every slot within bounds.
    pub fn scan(&self, max_tracks: usize, max_clips: usize) -> ScanResult {
        let tracks = self.resolve_track_count(max_tracks);
        self.scan_tracks(tracks, max_clips)
    }

    /// Probes clip slots for an already resolved track count.
    pub fn scan_tracks(&self, tracks: TrackResolution, max_clips: usize) -> ScanResult {
        let mut coordinates = Vec::new();
        let mut probed = 0;

        for track_index in 0..tracks.count {
            for clip_index in 0..max_clips {
                let coordinate = ClipSlotCoordinate::new(track_index, clip_index);
                probed += 1;
                if self.session.exists(&EntityPath::clip_slot(coordinate)) {
                    coordinates.push(coordinate);
                } else {
                    debug!(%coordinate, "No clip slot at coordinate");
                }
            }
        }

        info!(
            tracks = tracks.count,
            strategy = %tracks.strategy,
            probed,
            found = coordinates.len(),
            "Clip grid scan complete"
        );

        ScanResult {
            tracks,
            coordinates,
            probed,
        }
    }
}

// ============================================================================
// Clip Grid Arena
// ============================================================================

/// Index of a coordinate in a [`ClipGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

/// Arena of discovered clip slot coordinates.
///
/// Clip observers refer to their slot by [`SlotId`]; the coordinate is
/// looked up here when a notification arrives.
#[derive(Debug, Clone, Default)]
pub struct ClipGrid {
    slots: Vec<ClipSlotCoordinate>,
}

impl ClipGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next [`ClipGrid::insert`] will return.
    pub fn next_slot(&self) -> SlotId {
        SlotId(self.slots.len())
    }

    pub fn insert(&mut self, coordinate: ClipSlotCoordinate) -> SlotId {
        self.slots.push(coordinate);
        SlotId(self.slots.len() - 1)
    }

    pub fn get(&self, slot: SlotId) -> Option<ClipSlotCoordinate> {
        self.slots.get(slot.0).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
