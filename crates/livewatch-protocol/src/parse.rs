//! Parsing host command lines.

use livewatch_core::{ConfigError, ConfigKey};
use thiserror::Error;

use crate::Command;

/// Errors produced while parsing a command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),

    #[error("'{command}' takes no arguments")]
    UnexpectedArguments { command: String },

    #[error("unknown config key '{0}' (try 'help')")]
    UnknownConfigKey(String),

    #[error("missing value for config key '{0}'")]
    MissingValue(String),
}

/// Parses one host command line.
///
/// Words are separated by whitespace and matched case-insensitively.
/// Config values are passed through unparsed; the configuration validates
/// them when applied.
pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(ParseError::Empty);
    };
    let head = head.to_ascii_lowercase();
    let rest: Vec<&str> = words.collect();

    let command = match head.as_str() {
        "start" => Command::Start,
        "stop" => Command::Stop,
        "restart" => Command::Restart,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quick" => Command::Quick,
        "health" => Command::Health,
        "quit" | "exit" | "unload" => Command::Quit,
        "config" => return parse_config(&rest),
        _ => return Err(ParseError::UnknownCommand(head)),
    };

    if !rest.is_empty() {
        return Err(ParseError::UnexpectedArguments { command: head });
    }
    Ok(command)
}

fn parse_config(args: &[&str]) -> Result<Command, ParseError> {
    let Some((raw_key, values)) = args.split_first() else {
        return Ok(Command::ShowConfig);
    };

    let key: ConfigKey = raw_key.parse().map_err(|e| match e {
        ConfigError::UnknownKey(k) => ParseError::UnknownConfigKey(k),
        _ => ParseError::UnknownConfigKey(raw_key.to_string()),
    })?;

    if values.is_empty() {
        return Err(ParseError::MissingValue(key.name().to_string()));
    }

    Ok(Command::SetConfig {
        key,
        value: values.join(" "),
    })
}
