//! Point-in-time status snapshot of the live session.

use std::fmt;

use serde::Serialize;

/// Placeholder rendered for any field whose read failed.
pub const UNAVAILABLE: &str = "unavailable";

/// Mixer state flags of the selected track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrackFlags {
    pub muted: bool,
    pub solo: bool,
    pub armed: bool,
}

impl TrackFlags {
    pub fn is_empty(&self) -> bool {
        !(self.muted || self.solo || self.armed)
    }
}

impl fmt::Display for TrackFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = [
            (self.muted, "MUTED"),
            (self.solo, "SOLO"),
            (self.armed, "ARMED"),
        ]
        .iter()
        .filter_map(|(set, name)| set.then_some(*name))
        .collect();
        f.write_str(&names.join(" "))
    }
}

/// Status gathered in one reporter tick.
///
/// Every field is read fresh; `None` means that read failed this time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub transport_playing: Option<bool>,
    pub tempo_bpm: Option<f64>,
    pub song_position_beats: Option<f64>,
    pub selected_track_name: Option<String>,
    pub selected_track_flags: Option<TrackFlags>,
}

impl StatusSnapshot {
    /// Number of fields that were read successfully.
    pub fn available_fields(&self) -> usize {
        [
            self.transport_playing.is_some(),
            self.tempo_bpm.is_some(),
            self.song_position_beats.is_some(),
            self.selected_track_name.is_some(),
            self.selected_track_flags.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }

    /// Dashboard body, one line per field, placeholders for missing ones.
    pub fn render(&self) -> String {
        let transport = match self.transport_playing {
            Some(true) => "PLAYING".to_string(),
            Some(false) => "STOPPED".to_string(),
            None => UNAVAILABLE.to_string(),
        };
        let tempo = or_unavailable(self.tempo_bpm.map(|bpm| format!("{bpm:.2} BPM")));
        let position = or_unavailable(self.song_position_beats.map(|b| format!("{b:.2} beats")));
        let track = or_unavailable(self.selected_track_name.clone());
        let flags = or_unavailable(self.selected_track_flags.map(|f| f.to_string()));

        format!(
            "Transport : {transport}\n\
             Tempo     : {tempo}\n\
             Position  : {position}\n\
             Track     : {track}\n\
             Flags     : {flags}"
        )
    }
}

fn or_unavailable(value: Option<String>) -> String {
    value.unwrap_or_else(|| UNAVAILABLE.to_string())
}
