//! Inbound commands
//!
//! Frames arrive as `{"type": "...", "data": {...}}`. [`decode`] parses the
//! wire form and validates it into a [`ClientCommand`]; anything that fails
//! never reaches the hub.

use serde::Deserialize;

use crate::poll::NewPoll;
use crate::session::{ConnectionId, Identity};

/// Boundary errors for inbound frames
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Frame is not valid JSON or does not match any command shape
    #[error("malformed command: {0}")]
    Malformed(String),

    /// Poll question is blank
    #[error("poll question is empty")]
    EmptyQuestion,

    /// Fewer than two non-empty options
    #[error("poll needs at least two non-empty options, got {0}")]
    NotEnoughOptions(usize),

    /// Correct marker does not name one of the submitted options
    #[error("correct option {marker} is out of range 1..={options}")]
    CorrectOptionOutOfRange { marker: u32, options: usize },

    /// Correct marker names a blank option
    #[error("correct option {0} is blank")]
    CorrectOptionBlank(u32),
}

/// Registration payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    pub identity: Identity,
    pub display_name: String,
}

/// Removal payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovePayload {
    pub target_connection_handle: ConnectionId,
}

/// Vote payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotePayload {
    pub option_id: u32,
}

/// Chat payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub text: String,
    pub display_name: String,
}

/// Unvalidated poll creation payload
///
/// `correct_option_index` is the 1-based position of the correct option in
/// `options` as submitted, blanks included.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollDraft {
    pub question: String,
    pub options: Vec<String>,
    pub correct_option_index: u32,
    #[serde(default)]
    pub duration_hint: Option<u64>,
}

impl PollDraft {
    /// Check the draft, trim its texts and drop blank options
    ///
    /// The correct marker is renumbered to the option's id after blanks are
    /// removed.
    pub fn validate(self) -> Result<NewPoll, CommandError> {
        let question = self.question.trim().to_string();
        if question.is_empty() {
            return Err(CommandError::EmptyQuestion);
        }

        let marker = self.correct_option_index;
        let submitted = self.options.len();
        if marker == 0 || marker as usize > submitted {
            return Err(CommandError::CorrectOptionOutOfRange {
                marker,
                options: submitted,
            });
        }

        let mut options = Vec::with_capacity(submitted);
        let mut correct_option = None;
        for (index, text) in self.options.iter().enumerate() {
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            options.push(text.to_string());
            if index + 1 == marker as usize {
                correct_option = Some(options.len() as u32);
            }
        }

        if options.len() < 2 {
            return Err(CommandError::NotEnoughOptions(options.len()));
        }
        let correct_option = correct_option.ok_or(CommandError::CorrectOptionBlank(marker))?;

        Ok(NewPoll {
            question,
            options,
            correct_option,
            duration_hint: self.duration_hint,
        })
    }
}

/// Wire form of an inbound frame
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
enum WireCommand {
    RegisterPresenter(RegisterPayload),
    RegisterParticipant(RegisterPayload),
    RemoveParticipant(RemovePayload),
    GetPoll,
    SubmitVote(VotePayload),
    CreatePoll(PollDraft),
    PostMessage(MessagePayload),
    RequestChatLog,
}

/// A validated command, ready for the hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    RegisterPresenter {
        identity: Identity,
        display_name: String,
    },
    RegisterParticipant {
        identity: Identity,
        display_name: String,
    },
    RemoveParticipant {
        target: ConnectionId,
    },
    GetPoll,
    SubmitVote {
        option_id: u32,
    },
    CreatePoll(NewPoll),
    PostMessage {
        text: String,
        display_name: String,
    },
    RequestChatLog,
}

impl ClientCommand {
    /// Wire name, for logging
    pub fn name(&self) -> &'static str {
        match self {
            ClientCommand::RegisterPresenter { .. } => "register-presenter",
            ClientCommand::RegisterParticipant { .. } => "register-participant",
            ClientCommand::RemoveParticipant { .. } => "remove-participant",
            ClientCommand::GetPoll => "get-poll",
            ClientCommand::SubmitVote { .. } => "submit-vote",
            ClientCommand::CreatePoll(_) => "create-poll",
            ClientCommand::PostMessage { .. } => "post-message",
            ClientCommand::RequestChatLog => "request-chat-log",
        }
    }
}

impl WireCommand {
    fn validate(self) -> Result<ClientCommand, CommandError> {
        Ok(match self {
            WireCommand::RegisterPresenter(p) => ClientCommand::RegisterPresenter {
                identity: p.identity,
                display_name: p.display_name,
            },
            WireCommand::RegisterParticipant(p) => ClientCommand::RegisterParticipant {
                identity: p.identity,
                display_name: p.display_name,
            },
            WireCommand::RemoveParticipant(p) => ClientCommand::RemoveParticipant {
                target: p.target_connection_handle,
            },
            WireCommand::GetPoll => ClientCommand::GetPoll,
            WireCommand::SubmitVote(p) => ClientCommand::SubmitVote {
                option_id: p.option_id,
            },
            WireCommand::CreatePoll(draft) => ClientCommand::CreatePoll(draft.validate()?),
            WireCommand::PostMessage(p) => ClientCommand::PostMessage {
                text: p.text,
                display_name: p.display_name,
            },
            WireCommand::RequestChatLog => ClientCommand::RequestChatLog,
        })
    }
}

/// Parse and validate one text frame
pub fn decode(text: &str) -> Result<ClientCommand, CommandError> {
    let wire: WireCommand =
        serde_json::from_str(text).map_err(|e| CommandError::Malformed(e.to_string()))?;
    wire.validate()
}
