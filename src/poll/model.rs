//! Poll value types
//!
//! A [`Poll`] is replaced wholesale on creation; only vote sets change in
//! place.

use serde::Serialize;

use crate::session::Identity;

/// A validated poll request, ready to replace the current poll
///
/// Built by `PollDraft::validate` at the protocol boundary. The engine trusts
/// it: at least two options, and `correct_option` is a 1-based id within
/// range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPoll {
    /// Question text
    pub question: String,
    /// Option texts in display order
    pub options: Vec<String>,
    /// 1-based id of the correct option
    pub correct_option: u32,
    /// Advisory countdown in seconds
    pub duration_hint: Option<u64>,
}

/// One answer choice with its vote set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOption {
    /// 1-based id, assigned in input order
    pub id: u32,
    /// Choice text
    pub text: String,
    /// Identities that voted for this option, in vote order
    pub(super) votes: Vec<Identity>,
}

impl PollOption {
    pub(super) fn new(id: u32, text: String) -> Self {
        Self {
            id,
            text,
            votes: Vec::new(),
        }
    }

    /// Number of votes
    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }

    /// Identities that voted for this option
    pub fn voters(&self) -> &[Identity] {
        &self.votes
    }

    /// Check whether an identity voted for this option
    pub fn has_vote(&self, identity: &Identity) -> bool {
        self.votes.contains(identity)
    }
}

/// The single live poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poll {
    /// Question text
    pub question: String,
    /// Choices in display order
    pub options: Vec<PollOption>,
    /// Id of the correct option
    pub correct_option: u32,
    /// Advisory countdown in seconds
    pub duration_hint: Option<u64>,
}

impl Poll {
    /// Build a poll with empty vote sets, numbering options from 1
    pub fn from_new(new_poll: NewPoll) -> Self {
        let options = new_poll
            .options
            .into_iter()
            .zip(1u32..)
            .map(|(text, id)| PollOption::new(id, text))
            .collect();

        Self {
            question: new_poll.question,
            options,
            correct_option: new_poll.correct_option,
            duration_hint: new_poll.duration_hint,
        }
    }

    /// Sample poll the process starts with
    pub fn seeded() -> Self {
        Self::from_new(NewPoll {
            question: "Which team won IPL 2025?".into(),
            options: vec!["RCB".into(), "CSK".into(), "DC".into(), "PBKS".into()],
            correct_option: 1,
            duration_hint: None,
        })
    }

    /// Look up an option by id
    pub fn option(&self, id: u32) -> Option<&PollOption> {
        self.options.iter().find(|o| o.id == id)
    }

    /// Sum of all vote set sizes
    pub fn total_votes(&self) -> usize {
        self.options.iter().map(PollOption::vote_count).sum()
    }

    /// Wire snapshot
    pub fn snapshot(&self) -> PollSnapshot {
        PollSnapshot {
            question: self.question.clone(),
            options: self
                .options
                .iter()
                .map(|o| OptionSnapshot {
                    id: o.id,
                    text: o.text.clone(),
                    votes: o.votes.clone(),
                    count: o.vote_count(),
                })
                .collect(),
            correct_option_id: self.correct_option,
            duration_hint: self.duration_hint,
            total_votes: self.total_votes(),
        }
    }
}

/// Serialized form of an option
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionSnapshot {
    /// 1-based option id
    pub id: u32,
    /// Choice text
    pub text: String,
    /// Identities that voted for this option, in vote order
    pub votes: Vec<Identity>,
    /// Size of `votes`
    pub count: usize,
}

/// Serialized form of the current poll, sent as `poll-state`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSnapshot {
    /// Question text
    pub question: String,
    /// Choices with tallies, in display order
    pub options: Vec<OptionSnapshot>,
    /// Id of the correct option
    pub correct_option_id: u32,
    /// Advisory countdown in seconds, omitted when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_hint: Option<u64>,
    /// Votes across all options
    pub total_votes: usize,
}
