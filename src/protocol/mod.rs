//! Wire protocol
//!
//! JSON text frames in both directions. Inbound frames are tagged with
//! `type`, outbound frames with `event`; both carry their payload in `data`.

pub mod command;
pub mod event;

pub use command::{decode, ClientCommand, CommandError, PollDraft};
pub use event::ServerEvent;
