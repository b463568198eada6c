//! Session statistics.
//!
//! Counts what a slicing session received, skipped, decoded and emitted.

pub mod counters;

// Re-export commonly used types
pub use counters::{create_shared_stats, SessionStats, SessionStatsSnapshot, SharedSessionStats};
