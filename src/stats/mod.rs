pub mod history;
pub mod models;
pub mod repository;
pub mod service;

mod errors;

pub use errors::StatsError;
pub use history::{
    InMemoryMatchHistoryRepository, MatchHistoryRepository, PostgresMatchHistoryRepository,
};
pub use models::*;
pub use repository::{InMemoryStatsRepository, PostgresStatsRepository, StatsRepository};
pub use service::{StatsService, DEFAULT_HISTORY_LIMIT};
