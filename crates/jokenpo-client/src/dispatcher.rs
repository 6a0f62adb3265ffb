//! Command dispatch.
//!
//! Commands are fire-and-forget from the frontend's point of view: each is
//! sent from a background task, its acknowledgement is classified into a
//! [`CommandReport`], and a resync is requested so the next display update
//! does not wait out a full poll interval. Command failures surface as
//! reports, never as poll-loop errors.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::{Command, StatusApi};
use crate::poller::ResyncHandle;

/// Outcome of one dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReport {
    /// The backend acknowledged the command.
    Accepted { command: Command, message: String },
    /// The backend answered `status == "error"`; the user should be told.
    Rejected { command: Command, message: String },
    /// The command never reached the backend, or the ack was unreadable.
    Unreachable { command: Command, error: String },
}

impl CommandReport {
    /// The command this report is about.
    pub fn command(&self) -> Command {
        match self {
            CommandReport::Accepted { command, .. }
            | CommandReport::Rejected { command, .. }
            | CommandReport::Unreachable { command, .. } => *command,
        }
    }
}

/// Sends commands in the background and requests the follow-up resync.
///
/// Construct with [`CommandDispatcher::new`], which also returns the
/// receiving end of the report channel.
pub struct CommandDispatcher<A> {
    api: Arc<A>,
    resync: ResyncHandle,
    reports: mpsc::UnboundedSender<CommandReport>,
}

impl<A: StatusApi> CommandDispatcher<A> {
    pub fn new(
        api: Arc<A>,
        resync: ResyncHandle,
    ) -> (Self, mpsc::UnboundedReceiver<CommandReport>) {
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        (
            Self {
                api,
                resync,
                reports: report_tx,
            },
            report_rx,
        )
    }

    /// Send `command` in the background. Non-blocking; the report arrives
    /// on the channel returned by [`CommandDispatcher::new`], and a resync
    /// is requested whether the command succeeded or not.
    pub fn dispatch(&self, command: Command) {
        let api = self.api.clone();
        let resync = self.resync.clone();
        let reports = self.reports.clone();
        tokio::spawn(async move {
            let report = send_once(api.as_ref(), command).await;
            resync.resync();
            let _ = reports.send(report);
        });
    }
}

/// Issue one command and classify its acknowledgement.
async fn send_once<A: StatusApi>(api: &A, command: Command) -> CommandReport {
    match api.send_command(command).await {
        Ok(ack) if ack.is_error() => {
            let message = ack
                .message
                .unwrap_or_else(|| "command rejected".to_string());
            tracing::warn!(command = command.label(), %message, "command rejected");
            CommandReport::Rejected { command, message }
        }
        Ok(ack) => CommandReport::Accepted {
            command,
            message: ack.message.unwrap_or_default(),
        },
        Err(error) => {
            tracing::error!(command = command.label(), %error, "command failed");
            CommandReport::Unreachable {
                command,
                error: error.to_string(),
            }
        }
    }
}
