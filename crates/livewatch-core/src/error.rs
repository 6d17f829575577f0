//! Domain-specific error types following panic-free policy.

use std::path::PathBuf;

use thiserror::Error;

use crate::{EntityPath, SubscriptionHandle};

/// Failures reported by the external live session.
///
/// The session is a black box that may reject any call at any time. None of
/// these are fatal: callers degrade the affected output and carry on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// A property read was rejected by the host
    #[error("read of '{property}' on {path} rejected: {reason}")]
    ReadRejected {
        path: EntityPath,
        property: String,
        reason: String,
    },

    /// A change subscription was rejected by the host
    #[error("subscription to '{property}' on {path} rejected: {reason}")]
    SubscribeRejected {
        path: EntityPath,
        property: String,
        reason: String,
    },

    /// Releasing a subscription failed
    #[error("unsubscribe of {handle} failed: {reason}")]
    UnsubscribeFailed {
        handle: SubscriptionHandle,
        reason: String,
    },

    /// The entity path does not resolve to anything
    #[error("entity not found: {0}")]
    NotFound(EntityPath),

    /// A bulk child count could not be produced
    #[error("cannot count '{child}' under {path}: {reason}")]
    CountUnavailable {
        path: EntityPath,
        child: String,
        reason: String,
    },

    /// The value has the wrong shape for the property
    #[error("unexpected value for '{property}': expected {expected}, got {actual}")]
    UnexpectedValue {
        property: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Result type for calls into the live session.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised while loading or mutating the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML, or has unknown or wrongly typed keys
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Key name not recognised by `config <key> <value>`
    #[error("unknown configuration key: {0}")]
    UnknownKey(String),

    /// Value could not be parsed for the key
    #[error("invalid value for {key}: '{value}' (expected {expected})")]
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}
