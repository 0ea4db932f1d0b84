//! Statistics for the session hub

use std::time::{Duration, Instant};

/// Counters maintained by the hub actor
#[derive(Debug, Clone)]
pub struct HubCounters {
    /// When the hub started
    pub started_at: Instant,
    /// Connections ever attached
    pub total_connections: u64,
    /// Polls created by presenters (the seeded poll is not counted)
    pub polls_created: u64,
    /// Votes that landed on an existing option
    pub votes_cast: u64,
    /// Chat messages appended
    pub messages_posted: u64,
    /// Commands dropped by authorization
    pub unauthorized_commands: u64,
}

impl HubCounters {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            total_connections: 0,
            polls_created: 0,
            votes_cast: 0,
            messages_posted: 0,
            unauthorized_commands: 0,
        }
    }
}

impl Default for HubCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the hub
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubStats {
    /// Connections ever attached
    pub total_connections: u64,
    /// Currently live connections
    pub active_connections: u64,
    /// Currently registered participants, presenters included
    pub registered_participants: u64,
    /// Polls created by presenters
    pub polls_created: u64,
    /// Votes that landed on an existing option
    pub votes_cast: u64,
    /// Chat messages appended
    pub messages_posted: u64,
    /// Messages currently retained in the chat log
    pub chat_log_len: u64,
    /// Commands dropped by authorization
    pub unauthorized_commands: u64,
    /// Outbound frames dropped on full or closed queues
    pub frames_dropped: u64,
    /// Hub uptime
    pub uptime: Duration,
}

impl HubStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of live connections that have registered
    pub fn registration_ratio(&self) -> f64 {
        if self.active_connections == 0 {
            0.0
        } else {
            self.registered_participants as f64 / self.active_connections as f64
        }
    }
}
