//! Client interface for interacting with the MonitorActor.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Channel errors are mapped to `MonitorError::ChannelClosed`

use livewatch_core::{ConfigKey, ConfigUpdate, Configuration, StatusSnapshot};
use tokio::sync::{mpsc, oneshot};

use super::commands::{MonitorCommand, MonitorStatus};
use crate::error::MonitorError;

// ============================================================================
// Monitor Handle
// ============================================================================

/// Cheap-to-clone handle to a running monitor.
///
/// Every method queues one command and waits for the actor to answer it.
/// Commands from all clones are handled in the order they were sent.
///
/// The actor keeps running while at least one handle exists. Dropping the
/// last handle has the same effect as [`MonitorHandle::unload`].
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    sender: mpsc::UnboundedSender<MonitorCommand>,
}

impl MonitorHandle {
    pub fn new(sender: mpsc::UnboundedSender<MonitorCommand>) -> Self {
        Self { sender }
    }

    /// Sends a command built around a fresh response channel and awaits
    /// the answer.
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> MonitorCommand,
    ) -> Result<T, MonitorError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .map_err(|_| MonitorError::ChannelClosed)?;
        rx.await.map_err(|_| MonitorError::ChannelClosed)
    }

    /// Enters the active state. Returns `false` if it was already active.
    pub async fn start(&self) -> Result<bool, MonitorError> {
        self.request(|respond_to| MonitorCommand::Start { respond_to })
            .await
    }

    /// Leaves the active state. Returns `false` if there was nothing to stop.
    pub async fn stop(&self) -> Result<bool, MonitorError> {
        self.request(|respond_to| MonitorCommand::Stop { respond_to })
            .await
    }

    /// Stops now and schedules a start after the restart delay.
    pub async fn restart(&self) -> Result<(), MonitorError> {
        self.request(|respond_to| MonitorCommand::Restart { respond_to })
            .await
    }

    pub async fn status(&self) -> Result<MonitorStatus, MonitorError> {
        self.request(|respond_to| MonitorCommand::Status { respond_to })
            .await
    }

    /// Takes and prints a one-shot snapshot.
    pub async fn quick(&self) -> Result<StatusSnapshot, MonitorError> {
        self.request(|respond_to| MonitorCommand::Quick { respond_to })
            .await
    }

    /// Prints and returns the connection health summary.
    pub async fn health(&self) -> Result<String, MonitorError> {
        self.request(|respond_to| MonitorCommand::Health { respond_to })
            .await
    }

    pub async fn config(&self) -> Result<Configuration, MonitorError> {
        self.request(|respond_to| MonitorCommand::GetConfig { respond_to })
            .await
    }

    /// Changes one configuration value.
    ///
    /// # Errors
    ///
    /// - `MonitorError::Config` if the value does not parse for `key`
    /// - `MonitorError::ChannelClosed` if the actor has shut down
    pub async fn set_config(
        &self,
        key: ConfigKey,
        value: impl Into<String>,
    ) -> Result<ConfigUpdate, MonitorError> {
        let value = value.into();
        self.request(|respond_to| MonitorCommand::SetConfig {
            key,
            value,
            respond_to,
        })
        .await?
    }

    /// Tears the monitor down and stops the actor.
    ///
    /// Later calls on any clone fail with `MonitorError::ChannelClosed`.
    pub async fn unload(&self) -> Result<(), MonitorError> {
        self.request(|respond_to| MonitorCommand::Unload { respond_to })
            .await
    }

    /// True while the actor is still accepting commands.
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}
