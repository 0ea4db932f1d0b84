//! Connection identity types
//!
//! Every accepted socket gets a [`ConnectionId`] from the listener and carries
//! the opaque [`Identity`] token supplied during the upgrade request.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Transport-assigned handle for one live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Opaque per-user token, stable across reconnects
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Wrap a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

/// Read-only facts about a connection, fixed at handshake time
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Connection handle
    pub connection_id: ConnectionId,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Identity token from the upgrade request
    pub identity: Identity,

    /// `Origin` header, if the client sent one
    pub origin: Option<String>,
}

impl SessionContext {
    /// Create a new context
    pub fn new(connection_id: ConnectionId, peer_addr: SocketAddr, identity: Identity) -> Self {
        Self {
            connection_id,
            peer_addr,
            identity,
            origin: None,
        }
    }

    /// Attach the origin the client presented
    pub fn with_origin(mut self, origin: Option<String>) -> Self {
        self.origin = origin;
        self
    }
}
