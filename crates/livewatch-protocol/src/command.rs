//! Typed host commands.

use std::fmt;

use livewatch_core::ConfigKey;

/// Help text printed for the `help` command.
pub const HELP_TEXT: &str = "\
livewatch commands:
  start                 begin monitoring (observers + periodic display)
  stop                  stop monitoring and print connection health
  restart               stop, then start again after a short delay
  status                show state, observer count and success rates
  quick                 print a one-shot status snapshot
  health                print connection health counters
  config                show the current configuration
  config <key> <value>  change a setting
                        keys: interval (ms, min 1000), tracks, clips,
                              display (on/off)
  help                  show this help
  quit                  unload the monitor and exit";

/// A command sent by the host to the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Restart,
    Status,
    Help,
    /// One-shot snapshot without entering the active state
    Quick,
    Health,
    ShowConfig,
    SetConfig {
        key: ConfigKey,
        value: String,
    },
    /// Host is removing the monitor
    Quit,
}

impl Command {
    /// Command word as typed by the host.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Status => "status",
            Self::Help => "help",
            Self::Quick => "quick",
            Self::Health => "health",
            Self::ShowConfig | Self::SetConfig { .. } => "config",
            Self::Quit => "quit",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetConfig { key, value } => write!(f, "config {key} {value}"),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_mentions_every_command() {
        for word in [
            "start", "stop", "restart", "status", "quick", "health", "config", "help", "quit",
        ] {
            assert!(HELP_TEXT.contains(word), "help text missing {word}");
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::Quick.to_string(), "quick");
        let cmd = Command::SetConfig {
            key: ConfigKey::MaxTracks,
            value: "4".to_string(),
        };
        assert_eq!(cmd.to_string(), "config max_tracks 4");
        assert_eq!(cmd.name(), "config");
    }
}
