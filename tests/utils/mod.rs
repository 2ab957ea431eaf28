//! Shared setup and builders for integration tests
#![allow(dead_code)] // Test utilities may not all be used in every test

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use stronghold_stats::{
    InMemoryMatchHistoryRepository, InMemoryStatsRepository, LeaderboardService, MatchSubmission,
    StatsService,
};

/// Installs a tracing subscriber once per test binary so failures come with
/// log output. Safe to call from every test.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stronghold_stats=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

pub struct TestSetup {
    pub stats_repository: Arc<InMemoryStatsRepository>,
    pub history_repository: Arc<InMemoryMatchHistoryRepository>,
    pub stats_service: Arc<StatsService>,
    pub leaderboard: LeaderboardService,
}

/// Wires the in-memory stores into both services, sharing one stats store
/// so leaderboard reads observe ingestion writes.
pub fn setup() -> TestSetup {
    init_tracing();

    let stats_repository = Arc::new(InMemoryStatsRepository::new());
    let history_repository = Arc::new(InMemoryMatchHistoryRepository::new());
    let stats_service = Arc::new(StatsService::new(
        stats_repository.clone(),
        history_repository.clone(),
    ));
    let leaderboard = LeaderboardService::new(stats_repository.clone());

    TestSetup {
        stats_repository,
        history_repository,
        stats_service,
        leaderboard,
    }
}

/// Fluent builder for match submissions with sensible defaults.
pub struct SubmissionBuilder {
    submission: MatchSubmission,
}

impl SubmissionBuilder {
    pub fn for_player(player_id: Uuid) -> Self {
        Self {
            submission: MatchSubmission {
                match_id: "match-1".to_string(),
                player_id,
                username: None,
                is_win: true,
                match_date: None,
                duration_seconds: 600,
                units_killed: 0,
                units_lost: 0,
                base_destroyed: false,
                opponent_id: None,
            },
        }
    }

    pub fn match_id(mut self, match_id: &str) -> Self {
        self.submission.match_id = match_id.to_string();
        self
    }

    pub fn username(mut self, username: &str) -> Self {
        self.submission.username = Some(username.to_string());
        self
    }

    pub fn win(mut self) -> Self {
        self.submission.is_win = true;
        self
    }

    pub fn loss(mut self) -> Self {
        self.submission.is_win = false;
        self
    }

    pub fn kills(mut self, kills: i32) -> Self {
        self.submission.units_killed = kills;
        self
    }

    pub fn played_at(mut self, when: DateTime<Utc>) -> Self {
        self.submission.match_date = Some(when);
        self
    }

    pub fn against(mut self, opponent_id: Uuid) -> Self {
        self.submission.opponent_id = Some(opponent_id);
        self
    }

    pub fn build(self) -> MatchSubmission {
        self.submission
    }
}
