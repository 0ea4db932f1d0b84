//! Outbound events
//!
//! Events serialize as `{"event": "...", "data": ...}` and are encoded once
//! per broadcast; every recipient gets a clone of the same frame.

use serde::Serialize;
use tokio_tungstenite::tungstenite::Message;

use crate::chat::ChatMessage;
use crate::poll::PollSnapshot;
use crate::registry::Participant;

/// Event pushed from the hub to connections
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Full chat log, oldest first
    ChatLog(Vec<ChatMessage>),
    /// Current poll with tallies
    PollState(PollSnapshot),
    /// Registered connections, deduplicated
    ParticipantList(Vec<Participant>),
    /// The receiving connection was removed by the presenter
    RemovedNotice,
}

impl ServerEvent {
    /// Wire name, for logging
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::ChatLog(_) => "chat-log",
            ServerEvent::PollState(_) => "poll-state",
            ServerEvent::ParticipantList(_) => "participant-list",
            ServerEvent::RemovedNotice => "removed-notice",
        }
    }

    /// Encode as a WebSocket text frame
    ///
    /// `Message` clones share the encoded buffer.
    pub fn encode(&self) -> Result<Message, serde_json::Error> {
        serde_json::to_string(self).map(Message::text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::Poll;
    use crate::registry::Role;
    use crate::session::{ConnectionId, Identity};

    fn decode(message: Message) -> serde_json::Value {
        match message {
            Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
            other => panic!("expected text frame, got {:?}", other),
        }
    }

    #[test]
    fn test_removed_notice_has_no_data() {
        let json = decode(ServerEvent::RemovedNotice.encode().unwrap());
        assert_eq!(json, serde_json::json!({ "event": "removed-notice" }));
    }

    #[test]
    fn test_chat_log_encoding() {
        let event = ServerEvent::ChatLog(vec![
            ChatMessage::new("alice", "hi"),
            ChatMessage::new("bob", "yo"),
        ]);
        let json = decode(event.encode().unwrap());

        assert_eq!(json["event"], "chat-log");
        assert_eq!(json["data"][0]["displayName"], "alice");
        assert_eq!(json["data"][1]["text"], "yo");
    }

    #[test]
    fn test_participant_list_encoding() {
        let event = ServerEvent::ParticipantList(vec![Participant::new(
            ConnectionId(4),
            Identity::new("u4"),
            "Ravi",
            Role::Participant,
        )]);
        let json = decode(event.encode().unwrap());

        assert_eq!(json["event"], "participant-list");
        assert_eq!(json["data"][0]["connectionHandle"], 4);
        assert_eq!(json["data"][0]["role"], "participant");
    }

    #[test]
    fn test_poll_state_encoding() {
        let event = ServerEvent::PollState(Poll::seeded().snapshot());
        assert_eq!(event.name(), "poll-state");

        let json = decode(event.encode().unwrap());
        assert_eq!(json["data"]["options"].as_array().unwrap().len(), 4);
    }
}
