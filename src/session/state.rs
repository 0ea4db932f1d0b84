//! Connection lifecycle state
//!
//! Tracks one WebSocket connection from accept to close. Owned by the
//! connection task; the hub never sees it.

use std::time::Instant;

use super::context::SessionContext;

/// Connection lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Upgrade accepted, hub not yet notified
    Handshaken,
    /// Attached to the hub, exchanging frames
    Active,
    /// Close requested by either side
    Closing,
    /// Socket gone
    Closed,
}

/// Per-connection bookkeeping
#[derive(Debug)]
pub struct SessionState {
    /// Handshake facts
    pub context: SessionContext,

    /// Current phase
    pub phase: SessionPhase,

    /// Accept time
    pub connected_at: Instant,

    /// Last inbound frame (any kind, including pongs)
    pub last_seen: Instant,

    /// Text frames received
    pub frames_received: u64,

    /// Frames that failed to decode as a command
    pub frames_rejected: u64,
}

impl SessionState {
    /// Create state for a freshly upgraded connection
    pub fn new(context: SessionContext) -> Self {
        let now = Instant::now();
        Self {
            context,
            phase: SessionPhase::Handshaken,
            connected_at: now,
            last_seen: now,
            frames_received: 0,
            frames_rejected: 0,
        }
    }

    /// Hub has accepted the connection
    pub fn activate(&mut self) {
        if self.phase == SessionPhase::Handshaken {
            self.phase = SessionPhase::Active;
        }
    }

    /// Record any inbound activity
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Record an inbound text frame and whether it decoded
    pub fn on_frame(&mut self, accepted: bool) {
        self.touch();
        self.frames_received += 1;
        if !accepted {
            self.frames_rejected += 1;
        }
    }

    /// Start closing
    pub fn close(&mut self) {
        if self.phase != SessionPhase::Closed {
            self.phase = SessionPhase::Closing;
        }
    }

    /// Mark the socket as gone
    pub fn finish(&mut self) {
        self.phase = SessionPhase::Closed;
    }

    /// Time since accept
    pub fn duration(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }

    /// Check if the connection is exchanging frames
    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ConnectionId, Identity};
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    fn state() -> SessionState {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 5050);
        SessionState::new(SessionContext::new(ConnectionId(1), addr, Identity::new("u1")))
    }

    #[test]
    fn test_session_lifecycle() {
        let mut state = state();
        assert_eq!(state.phase, SessionPhase::Handshaken);

        state.activate();
        assert!(state.is_active());

        state.close();
        assert_eq!(state.phase, SessionPhase::Closing);

        state.finish();
        assert_eq!(state.phase, SessionPhase::Closed);

        // Closing after close does not resurrect
        state.close();
        assert_eq!(state.phase, SessionPhase::Closed);
    }

    #[test]
    fn test_frame_counters() {
        let mut state = state();
        state.on_frame(true);
        state.on_frame(false);
        state.on_frame(true);

        assert_eq!(state.frames_received, 3);
        assert_eq!(state.frames_rejected, 1);
    }
}
