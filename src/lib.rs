// Library crate for the Stronghold statistics service
// This file exposes the public API for integration tests

pub mod config;
pub mod leaderboard;
pub mod stats;

// Re-export commonly used types for easier access in tests
pub use config::{connect_pool, StatsConfig};
pub use leaderboard::{LeaderboardEntry, LeaderboardService};
pub use stats::{
    InMemoryMatchHistoryRepository, InMemoryStatsRepository, MatchHistoryRepository, MatchResult,
    MatchSubmission, PlayerStats, StatsError, StatsRepository, StatsService, StatsUpdate,
};
