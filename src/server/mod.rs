//! WebSocket server
//!
//! The listener accepts TCP connections and hands each one to a
//! [`Connection`](connection::Connection) task, which upgrades it and
//! bridges frames to and from the hub actor.

pub mod config;
pub mod connection;
pub mod handshake;
pub mod listener;

pub use config::ServerConfig;
pub use handshake::{HandshakeRejection, UpgradeInfo};
pub use listener::PollServer;
