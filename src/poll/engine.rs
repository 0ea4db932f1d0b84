//! Poll engine
//!
//! Holds exactly one live poll. Creation swaps the whole value; voting moves
//! an identity between vote sets.

use crate::session::Identity;

use super::model::{NewPoll, Poll, PollSnapshot};

/// Owner of the current poll
#[derive(Debug)]
pub struct PollEngine {
    current: Poll,
}

impl PollEngine {
    /// Create an engine holding the seeded sample poll
    pub fn new() -> Self {
        Self::with_poll(Poll::seeded())
    }

    /// Create an engine holding a specific poll
    pub fn with_poll(poll: Poll) -> Self {
        Self { current: poll }
    }

    /// Replace the current poll
    ///
    /// Prior votes are discarded, never merged. The caller must have
    /// validated `new_poll` and authorized the presenter.
    pub fn create_poll(&mut self, new_poll: NewPoll) -> &Poll {
        let previous_votes = self.current.total_votes();
        self.current = Poll::from_new(new_poll);

        tracing::info!(
            question = %self.current.question,
            options = self.current.options.len(),
            correct_option = self.current.correct_option,
            duration_hint = ?self.current.duration_hint,
            discarded_votes = previous_votes,
            "Poll created"
        );

        &self.current
    }

    /// Record a vote, moving any earlier vote by the same identity
    ///
    /// The identity is first removed from every option. If `option_id` does
    /// not exist nothing is added. Returns whether the vote landed.
    pub fn submit_vote(&mut self, identity: &Identity, option_id: u32) -> bool {
        for option in &mut self.current.options {
            option.votes.retain(|voter| voter != identity);
        }

        match self.current.options.iter_mut().find(|o| o.id == option_id) {
            Some(option) => {
                option.votes.push(identity.clone());
                tracing::debug!(
                    identity = %identity,
                    option_id = option_id,
                    option_votes = option.vote_count(),
                    "Vote recorded"
                );
                true
            }
            None => {
                tracing::debug!(
                    identity = %identity,
                    option_id = option_id,
                    "Vote for unknown option ignored"
                );
                false
            }
        }
    }

    /// Current poll
    pub fn current(&self) -> &Poll {
        &self.current
    }

    /// Wire snapshot of the current poll
    pub fn snapshot(&self) -> PollSnapshot {
        self.current.snapshot()
    }
}

impl Default for PollEngine {
    fn default() -> Self {
        Self::new()
    }
}
