//! Error types for the server surface
//!
//! Core state transitions never fail; rejected commands are dropped silently.
//! These errors only cover binding, accepting and speaking WebSocket.

use tokio_tungstenite::tungstenite;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the listener and connection tasks
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket bind/accept failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket protocol failure on a connection
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// Upgrade refused during the handshake
    #[error("handshake rejected: {0}")]
    HandshakeRejected(String),

    /// The hub actor has stopped and no longer accepts commands
    #[error("hub is shut down")]
    HubClosed,
}
