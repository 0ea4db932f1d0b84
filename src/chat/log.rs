//! Shared chat log
//!
//! Messages are appended in arrival order and never edited. The whole log is
//! replayed to late joiners, so the optional cap drops from the front.

use std::collections::VecDeque;

use serde::Serialize;

/// One chat line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Message body
    pub text: String,
    /// Sender's display name
    pub display_name: String,
}

impl ChatMessage {
    /// Create a message
    pub fn new(display_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            display_name: display_name.into(),
        }
    }
}

/// Append-only ordered log shared by every connection
#[derive(Debug, Default)]
pub struct ChatLog {
    /// Messages, oldest first
    messages: VecDeque<ChatMessage>,
    /// Retention cap (None = unbounded)
    max_messages: Option<usize>,
    /// Messages dropped by the cap
    evicted: u64,
}

impl ChatLog {
    /// Create an unbounded log
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log that keeps at most `max_messages` recent messages
    pub fn with_limit(max_messages: Option<usize>) -> Self {
        Self {
            messages: VecDeque::new(),
            max_messages,
            evicted: 0,
        }
    }

    /// Append a message
    ///
    /// Returns `false` for empty or whitespace-only text, leaving the log
    /// untouched.
    pub fn append(&mut self, display_name: &str, text: &str) -> bool {
        if text.trim().is_empty() {
            tracing::debug!(display_name = display_name, "Empty chat message ignored");
            return false;
        }

        self.messages.push_back(ChatMessage::new(display_name, text));

        if let Some(max) = self.max_messages {
            while self.messages.len() > max {
                self.messages.pop_front();
                self.evicted += 1;
            }
        }

        tracing::debug!(
            display_name = display_name,
            messages = self.messages.len(),
            "Chat message appended"
        );
        true
    }

    /// Full ordered copy of the log
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }

    /// Number of retained messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages dropped by the retention cap
    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut log = ChatLog::new();
        assert!(log.append("alice", "hi"));
        assert!(log.append("bob", "yo"));

        assert_eq!(
            log.snapshot(),
            vec![ChatMessage::new("alice", "hi"), ChatMessage::new("bob", "yo")]
        );
    }

    #[test]
    fn test_empty_text_rejected() {
        let mut log = ChatLog::new();
        assert!(!log.append("alice", ""));
        assert!(!log.append("alice", "   "));
        assert!(log.is_empty());
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let mut log = ChatLog::with_limit(Some(2));
        log.append("a", "1");
        log.append("b", "2");
        log.append("c", "3");

        let texts: Vec<_> = log.snapshot().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["2", "3"]);
        assert_eq!(log.evicted(), 1);
    }

    #[test]
    fn test_message_wire_shape() {
        let json = serde_json::to_value(ChatMessage::new("alice", "hi")).unwrap();
        assert_eq!(json["text"], "hi");
        assert_eq!(json["displayName"], "alice");
    }
}
