//! Participant record types

use serde::{Deserialize, Serialize};

use crate::session::{ConnectionId, Identity};

/// Role a connection registers with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Creates polls and removes participants
    Presenter,
    /// Votes and chats
    Participant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Presenter => f.write_str("presenter"),
            Role::Participant => f.write_str("participant"),
        }
    }
}

/// One registered connection
///
/// Keyed by connection handle, so the same identity reconnecting gets a new
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Identity the client registered with
    pub identity: Identity,

    /// Name shown in the participant list
    pub display_name: String,

    /// Registered role
    pub role: Role,

    /// Handle the presenter uses to target removal
    pub connection_handle: ConnectionId,
}

impl Participant {
    /// Create a record
    pub fn new(
        connection_handle: ConnectionId,
        identity: Identity,
        display_name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            identity,
            display_name: display_name.into(),
            role,
            connection_handle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_wire_shape() {
        let p = Participant::new(ConnectionId(3), Identity::new("id-1"), "alice", Role::Presenter);
        let json = serde_json::to_value(&p).unwrap();

        assert_eq!(json["identity"], "id-1");
        assert_eq!(json["displayName"], "alice");
        assert_eq!(json["role"], "presenter");
        assert_eq!(json["connectionHandle"], 3);
        assert_eq!(p.role, Role::Presenter);
    }
}
