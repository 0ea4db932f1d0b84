//! Broadcast hub for pushing events to connections
//!
//! # Architecture
//!
//! ```text
//!                   hub actor (owns Broadcaster)
//!              ┌──────────────────────────────────┐
//!              │ connections: BTreeMap<ConnId,    │
//!              │   mpsc::Sender<Outbound>>        │
//!              └───────────────┬──────────────────┘
//!                   try_send   │   (never awaits)
//!         ┌────────────────────┼────────────────────┐
//!         ▼                    ▼                    ▼
//!   [writer task]        [writer task]        [writer task]
//!   rx.recv()            rx.recv()            rx.recv()
//!         │                    │                    │
//!         └──► ws.send() ──► TCP
//! ```
//!
//! Each event is serialized once. Message clones share the encoded buffer,
//! so fan-out cost is one enqueue per connection.

pub mod frame;
pub mod hub;

pub use frame::Outbound;
pub use hub::Broadcaster;
