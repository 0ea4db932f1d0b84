//! Per-connection session types

pub mod context;
pub mod state;

pub use context::{ConnectionId, Identity, SessionContext};
pub use state::{SessionPhase, SessionState};
