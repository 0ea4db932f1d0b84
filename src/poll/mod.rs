//! Poll engine and poll value types

pub mod engine;
pub mod model;

pub use engine::PollEngine;
pub use model::{NewPoll, OptionSnapshot, Poll, PollOption, PollSnapshot};
