//! Command protocol for livewatch.
//!
//! The host triggers the monitor with short text commands (`start`,
//! `stop`, `config interval 1500`, ...). This crate turns those lines into
//! typed [`Command`] values.

pub mod command;
pub mod parse;

pub use command::{Command, HELP_TEXT};
pub use parse::{parse_command, ParseError};
