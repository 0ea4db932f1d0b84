//! poll-hub: live poll and chat session server over WebSocket
//!
//! A presenter runs a single multiple-choice poll for a room of participants.
//! Everyone sees vote counts and the shared chat update in real time, and the
//! presenter can remove participants.
//!
//! # Example
//!
//! ```no_run
//! use poll_hub::{PollServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let server = PollServer::bind(config).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! Clients connect with `ws://host:5050/?token=<identity>` and exchange JSON
//! text frames. Commands look like `{"type":"submit-vote","data":{"optionId":2}}`;
//! events look like `{"event":"poll-state","data":{...}}`.

pub mod broadcast;
pub mod chat;
pub mod error;
pub mod hub;
pub mod poll;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;

pub use error::{Error, Result};
pub use hub::{HubHandle, SessionHub};
pub use protocol::{ClientCommand, ServerEvent};
pub use server::{PollServer, ServerConfig};
pub use stats::HubStats;
