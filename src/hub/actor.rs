//! Hub actor
//!
//! One task owns the [`SessionHub`] and applies commands in arrival order.
//! Connection tasks talk to it only through a cloneable [`HubHandle`].

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::broadcast::Outbound;
use crate::error::{Error, Result};
use crate::protocol::ClientCommand;
use crate::session::{ConnectionId, SessionContext};
use crate::stats::HubStats;

use super::state::SessionHub;

/// Messages accepted by the hub actor
#[derive(Debug)]
pub enum HubCommand {
    /// A connection completed its handshake
    Connect {
        context: SessionContext,
        tx: mpsc::Sender<Outbound>,
    },
    /// A validated client command
    Client {
        connection: ConnectionId,
        command: ClientCommand,
    },
    /// A connection's socket closed
    Disconnect { connection: ConnectionId },
    /// Read the current statistics
    Stats { reply: oneshot::Sender<HubStats> },
}

/// Cloneable sender side of the hub actor
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Attach a connection and its writer queue
    pub async fn connect(&self, context: SessionContext, tx: mpsc::Sender<Outbound>) -> Result<()> {
        self.send(HubCommand::Connect { context, tx }).await
    }

    /// Forward a client command
    pub async fn command(&self, connection: ConnectionId, command: ClientCommand) -> Result<()> {
        self.send(HubCommand::Client {
            connection,
            command,
        })
        .await
    }

    /// Report a closed connection
    pub async fn disconnect(&self, connection: ConnectionId) -> Result<()> {
        self.send(HubCommand::Disconnect { connection }).await
    }

    /// Fetch statistics
    pub async fn stats(&self) -> Result<HubStats> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Stats { reply }).await?;
        rx.await.map_err(|_| Error::HubClosed)
    }

    async fn send(&self, command: HubCommand) -> Result<()> {
        self.tx.send(command).await.map_err(|_| Error::HubClosed)
    }
}

/// Spawn the hub actor
///
/// The actor stops once every [`HubHandle`] has been dropped.
pub fn spawn(hub: SessionHub, capacity: usize) -> (HubHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let task = tokio::spawn(run(hub, rx));
    (HubHandle { tx }, task)
}

async fn run(mut hub: SessionHub, mut rx: mpsc::Receiver<HubCommand>) {
    tracing::debug!("Hub actor started");

    while let Some(command) = rx.recv().await {
        match command {
            HubCommand::Connect { context, tx } => hub.connect(context, tx),
            HubCommand::Client {
                connection,
                command,
            } => hub.apply(connection, command),
            HubCommand::Disconnect { connection } => hub.disconnect(connection),
            HubCommand::Stats { reply } => {
                let _ = reply.send(hub.stats());
            }
        }
    }

    tracing::debug!("Hub actor stopped");
}
