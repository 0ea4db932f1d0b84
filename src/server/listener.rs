//! WebSocket server listener
//!
//! Handles the TCP accept loop and spawns connection handlers.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::hub::{self, HubHandle, SessionHub};
use crate::server::config::ServerConfig;
use crate::server::connection::Connection;
use crate::session::ConnectionId;

/// Live poll server
///
/// Binding spawns the hub actor; [`run`](Self::run) or
/// [`run_until`](Self::run_until) then accepts WebSocket clients.
pub struct PollServer {
    config: ServerConfig,
    listener: TcpListener,
    hub: HubHandle,
    hub_task: JoinHandle<()>,
    next_connection_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl PollServer {
    /// Bind the listen socket and start the hub
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_addr).await?;

        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        let (hub, hub_task) = hub::spawn(
            SessionHub::with_chat_limit(config.chat_history_limit),
            config.command_queue_capacity,
        );

        Ok(Self {
            config,
            listener,
            hub,
            hub_task,
            next_connection_id: AtomicU64::new(1),
            connection_semaphore,
        })
    }

    /// Address actually bound, useful with port 0
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle to the hub actor
    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    /// Get the configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run the server
    ///
    /// This method blocks until the listener fails.
    pub async fn run(&self) -> Result<()> {
        tracing::info!(addr = %self.local_addr()?, "Poll server listening");
        self.accept_loop().await
    }

    /// Run the server with graceful shutdown
    ///
    /// Stops accepting once `shutdown` resolves. Open connections are left to
    /// finish on their own.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        tracing::info!(addr = %self.local_addr()?, "Poll server listening");

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop() => result,
        }
    }

    async fn accept_loop(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        let connection_id = ConnectionId(self.next_connection_id.fetch_add(1, Ordering::Relaxed));

        tracing::debug!(
            connection_id = %connection_id,
            peer = %peer_addr,
            "New connection"
        );

        if let Err(e) = socket.set_nodelay(true) {
            tracing::error!(error = %e, "Failed to configure socket");
            return;
        }

        let config = self.config.clone();
        let hub = self.hub.clone();

        tokio::spawn(async move {
            let _permit = permit;
            let connection = Connection::new(connection_id, socket, peer_addr, config, hub);

            if let Err(e) = connection.run().await {
                tracing::debug!(
                    connection_id = %connection_id,
                    error = %e,
                    "Connection error"
                );
            }

            tracing::debug!(connection_id = %connection_id, "Connection closed");
        });
    }

    /// Stop the hub actor
    ///
    /// Connection tasks still hold hub handles, so the actor is aborted
    /// rather than drained.
    pub fn shutdown(self) {
        self.hub_task.abort();
    }
}
