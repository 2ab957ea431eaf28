use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::models::{PlayerStats, StatsUpdate};
use super::StatsError;

/// Trait for the aggregate stats store.
///
/// The store owns per-player atomicity: `apply_match` must perform the
/// bootstrap-if-missing plus increment arithmetic inside one transactional
/// scope, so that two concurrent submissions for the same player can never
/// lose an update. Updates for different players need no coordination.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn apply_match(&self, update: &StatsUpdate) -> Result<PlayerStats, StatsError>;
    async fn get_stats(&self, player_id: Uuid) -> Result<Option<PlayerStats>, StatsError>;

    /// One leaderboard page, ordered by `wins` descending, then
    /// `total_matches` descending, then `player_id` ascending as the stable
    /// final key. A zero `limit` or an `offset` past the end returns an
    /// empty page, not an error.
    async fn list_page(&self, limit: u32, offset: u32) -> Result<Vec<PlayerStats>, StatsError>;

    /// Number of players strictly better under the leaderboard ordering:
    /// more wins, or equal wins and more total matches.
    async fn count_outranking(&self, stats: &PlayerStats) -> Result<u64, StatsError>;

    async fn count_players(&self) -> Result<u64, StatsError>;
}

/// In-memory implementation of StatsRepository for development and testing
///
/// The write guard on the map serializes all updates, which over-satisfies
/// the per-player requirement. Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryStatsRepository {
    players: RwLock<HashMap<Uuid, PlayerStats>>,
}

impl InMemoryStatsRepository {
    pub fn new() -> Self {
        Self {
            players: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl StatsRepository for InMemoryStatsRepository {
    #[instrument(skip(self, update), fields(player_id = %update.player_id))]
    async fn apply_match(&self, update: &StatsUpdate) -> Result<PlayerStats, StatsError> {
        let now = Utc::now();
        let mut players = self.players.write().await;

        let stats = players
            .entry(update.player_id)
            .or_insert_with(|| PlayerStats::new(update.player_id, update.username.clone(), now));
        stats.record_outcome(&update.username, update.is_win, update.kills, now);

        debug!(
            total_matches = stats.total_matches,
            wins = stats.wins,
            "Applied match result in memory"
        );
        Ok(stats.clone())
    }

    #[instrument(skip(self))]
    async fn get_stats(&self, player_id: Uuid) -> Result<Option<PlayerStats>, StatsError> {
        let players = self.players.read().await;
        Ok(players.get(&player_id).cloned())
    }

    #[instrument(skip(self))]
    async fn list_page(&self, limit: u32, offset: u32) -> Result<Vec<PlayerStats>, StatsError> {
        let players = self.players.read().await;

        let mut rows: Vec<PlayerStats> = players.values().cloned().collect();
        rows.sort_by(|a, b| {
            b.wins
                .cmp(&a.wins)
                .then_with(|| b.total_matches.cmp(&a.total_matches))
                .then_with(|| a.player_id.cmp(&b.player_id))
        });

        Ok(rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    #[instrument(skip(self, stats), fields(player_id = %stats.player_id))]
    async fn count_outranking(&self, stats: &PlayerStats) -> Result<u64, StatsError> {
        let players = self.players.read().await;

        let better = players
            .values()
            .filter(|p| {
                p.wins > stats.wins
                    || (p.wins == stats.wins && p.total_matches > stats.total_matches)
            })
            .count();
        Ok(better as u64)
    }

    #[instrument(skip(self))]
    async fn count_players(&self) -> Result<u64, StatsError> {
        let players = self.players.read().await;
        Ok(players.len() as u64)
    }
}

/// PostgreSQL implementation of the stats store.
///
/// Expects a `player_stats` table unique on `player_id` with the counter
/// columns used below. `apply_match` runs as a single
/// `INSERT .. ON CONFLICT DO UPDATE` statement, so the read-modify-write
/// happens row-atomically inside Postgres and concurrent submissions for
/// one player serialize on the row lock.
pub struct PostgresStatsRepository {
    pool: PgPool,
}

impl PostgresStatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn stats_from_row(row: &PgRow) -> PlayerStats {
    PlayerStats {
        player_id: row.get("player_id"),
        username: row.get("username"),
        wins: row.get("wins"),
        losses: row.get("losses"),
        total_matches: row.get("total_matches"),
        kills: row.get("kills"),
        win_streak: row.get("win_streak"),
        max_win_streak: row.get("max_win_streak"),
        last_updated: row.get("last_updated"),
    }
}

const STATS_COLUMNS: &str = "player_id, username, wins, losses, total_matches, kills, win_streak, max_win_streak, last_updated";

#[async_trait]
impl StatsRepository for PostgresStatsRepository {
    #[instrument(skip(self, update), fields(player_id = %update.player_id))]
    async fn apply_match(&self, update: &StatsUpdate) -> Result<PlayerStats, StatsError> {
        debug!("Applying match result in database");

        let row = sqlx::query(
            "INSERT INTO player_stats \
                 (player_id, username, wins, losses, total_matches, kills, win_streak, max_win_streak, last_updated) \
             VALUES \
                 ($1, $2, \
                  CASE WHEN $3 THEN 1 ELSE 0 END, \
                  CASE WHEN $3 THEN 0 ELSE 1 END, \
                  1, $4, \
                  CASE WHEN $3 THEN 1 ELSE 0 END, \
                  CASE WHEN $3 THEN 1 ELSE 0 END, \
                  $5) \
             ON CONFLICT (player_id) DO UPDATE SET \
                 username = EXCLUDED.username, \
                 wins = player_stats.wins + CASE WHEN $3 THEN 1 ELSE 0 END, \
                 losses = player_stats.losses + CASE WHEN $3 THEN 0 ELSE 1 END, \
                 total_matches = player_stats.total_matches + 1, \
                 kills = player_stats.kills + $4, \
                 win_streak = CASE WHEN $3 THEN player_stats.win_streak + 1 ELSE 0 END, \
                 max_win_streak = GREATEST(player_stats.max_win_streak, \
                                           CASE WHEN $3 THEN player_stats.win_streak + 1 ELSE 0 END), \
                 last_updated = $5 \
             RETURNING player_id, username, wins, losses, total_matches, kills, win_streak, max_win_streak, last_updated",
        )
        .bind(update.player_id)
        .bind(&update.username)
        .bind(update.is_win)
        .bind(update.kills)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to apply match result in database");
            StatsError::Storage(e.to_string())
        })?;

        Ok(stats_from_row(&row))
    }

    #[instrument(skip(self))]
    async fn get_stats(&self, player_id: Uuid) -> Result<Option<PlayerStats>, StatsError> {
        let row = sqlx::query(&format!(
            "SELECT {STATS_COLUMNS} FROM player_stats WHERE player_id = $1"
        ))
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, %player_id, "Failed to fetch player stats from database");
            StatsError::Storage(e.to_string())
        })?;

        Ok(row.as_ref().map(stats_from_row))
    }

    #[instrument(skip(self))]
    async fn list_page(&self, limit: u32, offset: u32) -> Result<Vec<PlayerStats>, StatsError> {
        let rows = sqlx::query(&format!(
            "SELECT {STATS_COLUMNS} FROM player_stats \
             ORDER BY wins DESC, total_matches DESC, player_id ASC \
             LIMIT $1 OFFSET $2"
        ))
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch leaderboard page from database");
            StatsError::Storage(e.to_string())
        })?;

        Ok(rows.iter().map(stats_from_row).collect())
    }

    #[instrument(skip(self, stats), fields(player_id = %stats.player_id))]
    async fn count_outranking(&self, stats: &PlayerStats) -> Result<u64, StatsError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS better FROM player_stats \
             WHERE wins > $1 OR (wins = $1 AND total_matches > $2)",
        )
        .bind(stats.wins)
        .bind(stats.total_matches)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to count outranking players in database");
            StatsError::Storage(e.to_string())
        })?;

        let better: i64 = row.get("better");
        Ok(better as u64)
    }

    #[instrument(skip(self))]
    async fn count_players(&self) -> Result<u64, StatsError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM player_stats")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to count players in database");
                StatsError::Storage(e.to_string())
            })?;

        let total: i64 = row.get("total");
        Ok(total as u64)
    }
}
