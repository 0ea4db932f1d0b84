//! Identity and connection registry
//!
//! Maps connection handles to the participant record created on first
//! registration. The registry is the authorization source for presenter-only
//! commands.
//!
//! # Keying
//!
//! ```text
//!   conn-1 ──► { identity: "u-17", name: "Ms. K", role: presenter }
//!   conn-4 ──► { identity: "u-03", name: "Ravi",  role: participant }
//!   conn-6 ──► { identity: "u-03", name: "Ravi",  role: participant }   (same user, second tab)
//! ```
//!
//! Records are keyed by connection, never by identity, so a reconnect always
//! produces a fresh record and the old one disappears with its socket.

pub mod participant;
pub mod store;

pub use participant::{Participant, Role};
pub use store::ParticipantRegistry;
