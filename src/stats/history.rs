use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::models::MatchResult;
use super::StatsError;

/// Trait for the append-only match history store.
///
/// History is the immutable source of truth for submitted results: rows are
/// inserted once and never updated. Resubmission of the same `match_id` is
/// deliberately not deduplicated; each call appends a new row.
#[async_trait]
pub trait MatchHistoryRepository: Send + Sync {
    async fn append(&self, result: &MatchResult) -> Result<(), StatsError>;

    /// The player's most recent matches, newest first, bounded by `limit`.
    async fn recent_for_player(
        &self,
        player_id: Uuid,
        limit: u32,
    ) -> Result<Vec<MatchResult>, StatsError>;
}

/// In-memory implementation of MatchHistoryRepository for development and
/// testing. Keeps results in insertion order; lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryMatchHistoryRepository {
    matches: RwLock<Vec<MatchResult>>,
}

impl InMemoryMatchHistoryRepository {
    pub fn new() -> Self {
        Self {
            matches: RwLock::new(Vec::new()),
        }
    }

    /// Total rows across all players (useful in tests).
    pub async fn len(&self) -> usize {
        self.matches.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.matches.read().await.is_empty()
    }
}

#[async_trait]
impl MatchHistoryRepository for InMemoryMatchHistoryRepository {
    #[instrument(skip(self, result), fields(match_id = %result.match_id, player_id = %result.player_id))]
    async fn append(&self, result: &MatchResult) -> Result<(), StatsError> {
        let mut matches = self.matches.write().await;
        matches.push(result.clone());

        debug!("Appended match result in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn recent_for_player(
        &self,
        player_id: Uuid,
        limit: u32,
    ) -> Result<Vec<MatchResult>, StatsError> {
        let matches = self.matches.read().await;

        // Walk newest insertion first so that equal timestamps keep the
        // later submission ahead after the stable sort.
        let mut rows: Vec<MatchResult> = matches
            .iter()
            .rev()
            .filter(|m| m.player_id == player_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.match_date.cmp(&a.match_date));
        rows.truncate(limit as usize);

        Ok(rows)
    }
}

/// PostgreSQL implementation of the match history store.
///
/// Expects a `match_results` table indexed on `player_id` and `match_date`.
pub struct PostgresMatchHistoryRepository {
    pool: PgPool,
}

impl PostgresMatchHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn match_from_row(row: &PgRow) -> MatchResult {
    MatchResult {
        match_id: row.get("match_id"),
        player_id: row.get("player_id"),
        is_win: row.get("is_win"),
        match_date: row.get("match_date"),
        duration_seconds: row.get("duration_seconds"),
        units_killed: row.get("units_killed"),
        units_lost: row.get("units_lost"),
        base_destroyed: row.get("base_destroyed"),
        opponent_id: row.get("opponent_id"),
    }
}

#[async_trait]
impl MatchHistoryRepository for PostgresMatchHistoryRepository {
    #[instrument(skip(self, result), fields(match_id = %result.match_id, player_id = %result.player_id))]
    async fn append(&self, result: &MatchResult) -> Result<(), StatsError> {
        debug!("Appending match result in database");

        sqlx::query(
            "INSERT INTO match_results \
                 (match_id, player_id, is_win, match_date, duration_seconds, \
                  units_killed, units_lost, base_destroyed, opponent_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&result.match_id)
        .bind(result.player_id)
        .bind(result.is_win)
        .bind(result.match_date)
        .bind(result.duration_seconds)
        .bind(result.units_killed)
        .bind(result.units_lost)
        .bind(result.base_destroyed)
        .bind(result.opponent_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to append match result in database");
            StatsError::Storage(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn recent_for_player(
        &self,
        player_id: Uuid,
        limit: u32,
    ) -> Result<Vec<MatchResult>, StatsError> {
        let rows = sqlx::query(
            "SELECT match_id, player_id, is_win, match_date, duration_seconds, \
                    units_killed, units_lost, base_destroyed, opponent_id \
             FROM match_results \
             WHERE player_id = $1 \
             ORDER BY match_date DESC \
             LIMIT $2",
        )
        .bind(player_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, %player_id, "Failed to fetch match history from database");
            StatsError::Storage(e.to_string())
        })?;

        Ok(rows.iter().map(match_from_row).collect())
    }
}
