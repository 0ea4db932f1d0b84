//! Serialized session core
//!
//! # Architecture
//!
//! ```text
//!   [connection task]   [connection task]   [connection task]
//!          │                    │                    │
//!          └──── HubCommand ────┼────────────────────┘
//!                               ▼
//!                     mpsc::Receiver (FIFO)
//!                               │
//!                     ┌─────────▼─────────┐
//!                     │    SessionHub     │
//!                     │  registry         │
//!                     │  poll engine      │
//!                     │  chat log         │
//!                     │  broadcaster ─────┼──► per-connection queues
//!                     └───────────────────┘
//! ```
//!
//! Only the actor task touches session state, so the invariants hold without
//! locks: one poll, one vote per identity, one record per connection.

pub mod actor;
pub mod state;

pub use actor::{spawn, HubCommand, HubHandle};
pub use state::SessionHub;
