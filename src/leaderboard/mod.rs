pub mod models;
pub mod service;

pub use models::LeaderboardEntry;
pub use service::{LeaderboardService, DEFAULT_LEADERBOARD_LIMIT, DEFAULT_TOP_COUNT};
