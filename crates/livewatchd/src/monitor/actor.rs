//! Monitor actor - serializes every entry point into the controller.
//!
//! Host commands, change notifications and timer wakeups all arrive on one
//! channel and are handled to completion, one at a time, in arrival order.
//! This is the whole concurrency story: no handler can observe another
//! handler's partial work.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Response send failures are ignored (the caller may have gone away)

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::commands::MonitorCommand;
use super::controller::MonitorController;

/// Owns the controller and drives it from the command queue.
pub struct MonitorActor {
    receiver: mpsc::UnboundedReceiver<MonitorCommand>,
    controller: MonitorController,
}

impl MonitorActor {
    pub fn new(
        receiver: mpsc::UnboundedReceiver<MonitorCommand>,
        controller: MonitorController,
    ) -> Self {
        Self {
            receiver,
            controller,
        }
    }

    /// Runs until `Unload` is received or every handle has been dropped.
    ///
    /// Either way the controller is unloaded before returning, so no
    /// subscription outlives the actor.
    pub async fn run(mut self) {
        self.controller.on_load();

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                MonitorCommand::Unload { respond_to } => {
                    self.controller.unload();
                    let _ = respond_to.send(());
                    info!("Monitor actor stopped (unload)");
                    return;
                }
                cmd => self.handle_command(cmd),
            }
        }

        debug!("All monitor handles dropped");
        self.controller.unload();
        info!("Monitor actor stopped (channel closed)");
    }

    fn handle_command(&mut self, cmd: MonitorCommand) {
        match cmd {
            MonitorCommand::Start { respond_to } => {
                let _ = respond_to.send(self.controller.start());
            }
            MonitorCommand::Stop { respond_to } => {
                let _ = respond_to.send(self.controller.stop());
            }
            MonitorCommand::Restart { respond_to } => {
                self.controller.restart();
                let _ = respond_to.send(());
            }
            MonitorCommand::Status { respond_to } => {
                let _ = respond_to.send(self.controller.status());
            }
            MonitorCommand::Quick { respond_to } => {
                let _ = respond_to.send(self.controller.quick());
            }
            MonitorCommand::Health { respond_to } => {
                let _ = respond_to.send(self.controller.health_summary());
            }
            MonitorCommand::GetConfig { respond_to } => {
                let _ = respond_to.send(self.controller.config().clone());
            }
            MonitorCommand::SetConfig {
                key,
                value,
                respond_to,
            } => {
                let _ = respond_to.send(self.controller.set_config(key, &value));
            }
            MonitorCommand::Unload { respond_to } => {
                // Handled in `run`, which exits afterwards.
                self.controller.unload();
                let _ = respond_to.send(());
            }
            MonitorCommand::Event(event) => self.controller.handle_event(event),
        }
    }
}
