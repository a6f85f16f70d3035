//! Collection loop and aggregations for Community Pulse.
//!
//! - [`collector`]: cursor pagination with dedup and a trailing time window
//! - [`leaderboard`]: per-author engagement counters in first-seen order
//! - [`daily`]: posts per UTC day, ascending
//! - [`snapshot`]: JSON snapshot load/save
//! - [`pipeline`]: the end-to-end run used by the binary
pub mod collector;
pub mod daily;
pub mod leaderboard;
pub mod pipeline;
pub mod snapshot;

pub use collector::{Collection, Collector, CollectorSettings, StopReason};
pub use daily::{DailyEntry, DailyStats, build_daily_stats};
pub use leaderboard::{EngagementCounters, Leaderboard, build_leaderboard};
pub use pipeline::{RunSummary, rebuild_from_snapshot, run, run_with, write_aggregates};
