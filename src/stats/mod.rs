//! Hub statistics

pub mod metrics;

pub use metrics::{HubCounters, HubStats};
