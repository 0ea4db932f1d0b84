//! Chat log

pub mod log;

pub use log::{ChatLog, ChatMessage};
