//! Monitor configuration.
//!
//! The configuration outlives start/stop cycles. All mutation goes through
//! the setters so that every value, whether it came from a TOML file, a CLI
//! flag or a runtime `config` command, is clamped the same way.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ConfigError;

// ============================================================================
// Constants
// ============================================================================

/// Lower bound for the periodic display interval.
pub const MIN_UPDATE_INTERVAL_MS: u64 = 1000;

/// Default periodic display interval.
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 2000;

/// Default number of tracks scanned for clip slots and mixer observers.
pub const DEFAULT_MAX_TRACKS: usize = 8;

/// Default number of clip slots probed per track.
pub const DEFAULT_MAX_CLIPS: usize = 8;

/// Upper bound for either grid dimension.
pub const MAX_GRID_DIMENSION: usize = 64;

// ============================================================================
// Config Keys
// ============================================================================

/// Keys accepted by `config <key> <value>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    UpdateInterval,
    MaxTracks,
    MaxClips,
    PeriodicDisplay,
}

impl ConfigKey {
    pub const ALL: [Self; 4] = [
        Self::UpdateInterval,
        Self::MaxTracks,
        Self::MaxClips,
        Self::PeriodicDisplay,
    ];

    /// Canonical name, matching the TOML field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UpdateInterval => "update_interval_ms",
            Self::MaxTracks => "max_tracks",
            Self::MaxClips => "max_clips",
            Self::PeriodicDisplay => "enable_periodic_display",
        }
    }

    /// True for keys that only affect the periodic reporter.
    pub fn affects_reporter(&self) -> bool {
        matches!(self, Self::UpdateInterval | Self::PeriodicDisplay)
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "interval" | "update_interval" | "update_interval_ms" => Ok(Self::UpdateInterval),
            "tracks" | "max_tracks" => Ok(Self::MaxTracks),
            "clips" | "max_clips" => Ok(Self::MaxClips),
            "display" | "periodic" | "enable_periodic_display" => Ok(Self::PeriodicDisplay),
            _ => Err(ConfigError::UnknownKey(s.to_string())),
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a single `Configuration::set` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub key: ConfigKey,
    /// Value now in effect, formatted for display
    pub value: String,
    /// The requested value was out of range and has been clamped
    pub clamped: bool,
    /// The effective value differs from the previous one
    pub changed: bool,
}

impl fmt::Display for ConfigUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.key, self.value)?;
        if self.clamped {
            f.write_str(" (clamped)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Process-wide monitor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Configuration {
    update_interval_ms: u64,
    max_tracks: usize,
    max_clips: usize,
    enable_periodic_display: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            max_tracks: DEFAULT_MAX_TRACKS,
            max_clips: DEFAULT_MAX_CLIPS,
            enable_periodic_display: true,
        }
    }
}

impl Configuration {
    /// Parses TOML text. Missing keys fall back to defaults; out-of-range
    /// values are clamped. Unrecognised keys are an error.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: Configuration = toml::from_str(text)?;
        let mut config = Configuration::default();
        config.set_update_interval_ms(raw.update_interval_ms);
        config.set_max_tracks(raw.max_tracks);
        config.set_max_clips(raw.max_clips);
        config.set_periodic_display(raw.enable_periodic_display);
        Ok(config)
    }

    /// Loads a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded configuration file");
        Self::from_toml_str(&text)
    }

    /// Loads `path` if given, else the default location.
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn update_interval_ms(&self) -> u64 {
        self.update_interval_ms
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn max_tracks(&self) -> usize {
        self.max_tracks
    }

    pub fn max_clips(&self) -> usize {
        self.max_clips
    }

    pub fn periodic_display_enabled(&self) -> bool {
        self.enable_periodic_display
    }

    /// Sets the interval, raising it to [`MIN_UPDATE_INTERVAL_MS`] if lower.
    /// Returns the effective value.
    pub fn set_update_interval_ms(&mut self, ms: u64) -> u64 {
        let effective = ms.max(MIN_UPDATE_INTERVAL_MS);
        if effective != ms {
            warn!(
                requested = ms,
                effective, "Update interval below minimum, clamped"
            );
        }
        self.update_interval_ms = effective;
        effective
    }

    /// Sets the track limit, clamped to `1..=MAX_GRID_DIMENSION`.
    pub fn set_max_tracks(&mut self, tracks: usize) -> usize {
        self.max_tracks = clamp_dimension("max_tracks", tracks);
        self.max_tracks
    }

    /// Sets the per-track clip slot limit, clamped to `1..=MAX_GRID_DIMENSION`.
    pub fn set_max_clips(&mut self, clips: usize) -> usize {
        self.max_clips = clamp_dimension("max_clips", clips);
        self.max_clips
    }

    pub fn set_periodic_display(&mut self, enabled: bool) {
        self.enable_periodic_display = enabled;
    }

    /// Parses `raw` for `key` and applies it through the matching setter.
    pub fn set(&mut self, key: ConfigKey, raw: &str) -> Result<ConfigUpdate, ConfigError> {
        let raw = raw.trim();
        let (value, clamped, changed) = match key {
            ConfigKey::UpdateInterval => {
                let requested = parse_number(key, raw)?;
                let before = self.update_interval_ms;
                let effective = self.set_update_interval_ms(requested);
                (format!("{effective} ms"), effective != requested, effective != before)
            }
            ConfigKey::MaxTracks => {
                let requested = parse_number(key, raw)?;
                let before = self.max_tracks;
                let effective = self.set_max_tracks(requested as usize);
                (
                    effective.to_string(),
                    effective as u64 != requested,
                    effective != before,
                )
            }
            ConfigKey::MaxClips => {
                let requested = parse_number(key, raw)?;
                let before = self.max_clips;
                let effective = self.set_max_clips(requested as usize);
                (
                    effective.to_string(),
                    effective as u64 != requested,
                    effective != before,
                )
            }
            ConfigKey::PeriodicDisplay => {
                let enabled = parse_switch(key, raw)?;
                let before = self.enable_periodic_display;
                self.set_periodic_display(enabled);
                (on_off(enabled).to_string(), false, enabled != before)
            }
        };

        Ok(ConfigUpdate {
            key,
            value,
            clamped,
            changed,
        })
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration:")?;
        writeln!(f, "  update_interval_ms      = {}", self.update_interval_ms)?;
        writeln!(f, "  max_tracks              = {}", self.max_tracks)?;
        writeln!(f, "  max_clips               = {}", self.max_clips)?;
        write!(
            f,
            "  enable_periodic_display = {}",
            on_off(self.enable_periodic_display)
        )
    }
}

/// Default config file location (`<config dir>/livewatch/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("livewatch").join("config.toml"))
}

// ============================================================================
// Helpers
// ============================================================================

fn clamp_dimension(name: &'static str, requested: usize) -> usize {
    let effective = requested.clamp(1, MAX_GRID_DIMENSION);
    if effective != requested {
        warn!(key = name, requested, effective, "Grid limit out of range, clamped");
    }
    effective
}

fn parse_number(key: ConfigKey, raw: &str) -> Result<u64, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.name(),
        value: raw.to_string(),
        expected: "a whole number",
    })
}

fn parse_switch(key: ConfigKey, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.name(),
            value: raw.to_string(),
            expected: "on or off",
        }),
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();
        assert_eq!(config.update_interval_ms(), DEFAULT_UPDATE_INTERVAL_MS);
        assert_eq!(config.max_tracks(), DEFAULT_MAX_TRACKS);
        assert_eq!(config.max_clips(), DEFAULT_MAX_CLIPS);
        assert!(config.periodic_display_enabled());
    }

    #[test]
    fn test_interval_lower_bound() {
        let mut config = Configuration::default();
        assert_eq!(config.set_update_interval_ms(250), MIN_UPDATE_INTERVAL_MS);
        assert_eq!(config.update_interval(), Duration::from_millis(1000));
        assert_eq!(config.set_update_interval_ms(5000), 5000);
    }

    #[test]
    fn test_grid_limits_clamped() {
        let mut config = Configuration::default();
        assert_eq!(config.set_max_tracks(0), 1);
        assert_eq!(config.set_max_clips(500), MAX_GRID_DIMENSION);
    }

    #[test]
    fn test_key_aliases() {
        assert_eq!("interval".parse::<ConfigKey>().unwrap(), ConfigKey::UpdateInterval);
        assert_eq!("TRACKS".parse::<ConfigKey>().unwrap(), ConfigKey::MaxTracks);
        assert_eq!("max_clips".parse::<ConfigKey>().unwrap(), ConfigKey::MaxClips);
        assert_eq!("display".parse::<ConfigKey>().unwrap(), ConfigKey::PeriodicDisplay);
        assert!(matches!(
            "colour".parse::<ConfigKey>(),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_set_reports_clamping_and_change() {
        let mut config = Configuration::default();

        let update = config.set(ConfigKey::UpdateInterval, "500").unwrap();
        assert_eq!(update.value, "1000 ms");
        assert!(update.clamped);
        assert!(update.changed);
        assert_eq!(update.to_string(), "update_interval_ms = 1000 ms (clamped)");

        let update = config.set(ConfigKey::UpdateInterval, "1000").unwrap();
        assert!(!update.clamped);
        assert!(!update.changed);

        let update = config.set(ConfigKey::PeriodicDisplay, "off").unwrap();
        assert_eq!(update.value, "off");
        assert!(!config.periodic_display_enabled());
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Configuration::default();
        assert!(matches!(
            config.set(ConfigKey::MaxTracks, "lots"),
            Err(ConfigError::InvalidValue { key: "max_tracks", .. })
        ));
        assert!(matches!(
            config.set(ConfigKey::PeriodicDisplay, "maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(config, Configuration::default());
    }

    #[test]
    fn test_from_toml_clamps_and_defaults() {
        let config = Configuration::from_toml_str(
            "update_interval_ms = 100\nmax_tracks = 4\n",
        )
        .unwrap();
        assert_eq!(config.update_interval_ms(), MIN_UPDATE_INTERVAL_MS);
        assert_eq!(config.max_tracks(), 4);
        assert_eq!(config.max_clips(), DEFAULT_MAX_CLIPS);
        assert!(config.periodic_display_enabled());
    }

    #[test]
    fn test_from_toml_rejects_wrong_types() {
        let result = Configuration::from_toml_str("max_tracks = \"eight\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_from_toml_rejects_unknown_keys() {
        let result = Configuration::from_toml_str("interval_ms = 500\n");
        match result {
            Err(ConfigError::Parse(e)) => assert!(e.to_string().contains("interval_ms")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_clips = 3").unwrap();
        writeln!(file, "enable_periodic_display = false").unwrap();

        let config = Configuration::load(file.path()).unwrap();
        assert_eq!(config.max_clips(), 3);
        assert!(!config.periodic_display_enabled());
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Configuration::load_or_default(Some(&missing)),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_display_lists_all_keys() {
        let text = Configuration::default().to_string();
        for key in ConfigKey::ALL {
            assert!(text.contains(key.name()), "missing {key}");
        }
    }
}
