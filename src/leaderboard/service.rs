use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::stats::{StatsError, StatsRepository};

use super::models::LeaderboardEntry;

/// Suggested page size for full leaderboard reads.
pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 100;
/// Suggested size for top-player summaries.
pub const DEFAULT_TOP_COUNT: u32 = 10;

/// Computes rankings on demand from the current stats store snapshot.
///
/// Ordering is wins descending, then total matches descending, with
/// `player_id` as the stable final key for pagination. Nothing is cached:
/// if the store is unreachable the query fails rather than serving a stale
/// or fabricated ranking.
pub struct LeaderboardService {
    stats: Arc<dyn StatsRepository>,
}

impl LeaderboardService {
    pub fn new(stats: Arc<dyn StatsRepository>) -> Self {
        Self { stats }
    }

    /// One page of the global leaderboard. Ranks are positional within the
    /// requested slice: `offset + 1, offset + 2, ...`.
    #[instrument(skip(self))]
    pub async fn global_leaderboard(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<LeaderboardEntry>, StatsError> {
        let page = self.stats.list_page(limit, offset).await?;

        Ok(page
            .iter()
            .enumerate()
            .map(|(index, stats)| {
                LeaderboardEntry::from_stats(offset as u64 + index as u64 + 1, stats)
            })
            .collect())
    }

    /// The first `count` leaderboard entries.
    pub async fn top_players(&self, count: u32) -> Result<Vec<LeaderboardEntry>, StatsError> {
        self.global_leaderboard(count, 0).await
    }

    /// The player's entry with a rank computed independently of any page:
    /// one plus the number of players strictly better under the ordering.
    /// Players tied on both keys share a rank.
    #[instrument(skip(self))]
    pub async fn player_rank(&self, player_id: Uuid) -> Result<LeaderboardEntry, StatsError> {
        let stats = self
            .stats
            .get_stats(player_id)
            .await?
            .ok_or_else(|| StatsError::NotFound(format!("no stats recorded for player {player_id}")))?;

        let better = self.stats.count_outranking(&stats).await?;
        Ok(LeaderboardEntry::from_stats(better + 1, &stats))
    }

    /// Count of distinct ranked players, for pagination bounds.
    pub async fn total_players(&self) -> Result<u64, StatsError> {
        self.stats.count_players().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{InMemoryStatsRepository, StatsUpdate};

    struct Setup {
        repo: Arc<InMemoryStatsRepository>,
        service: LeaderboardService,
    }

    fn setup() -> Setup {
        let repo = Arc::new(InMemoryStatsRepository::new());
        let service = LeaderboardService::new(repo.clone());
        Setup { repo, service }
    }

    async fn seed_player(repo: &InMemoryStatsRepository, name: &str, wins: u32, losses: u32) -> Uuid {
        let player_id = Uuid::new_v4();
        for _ in 0..wins {
            repo.apply_match(&StatsUpdate {
                player_id,
                username: name.to_string(),
                is_win: true,
                kills: 0,
            })
            .await
            .unwrap();
        }
        for _ in 0..losses {
            repo.apply_match(&StatsUpdate {
                player_id,
                username: name.to_string(),
                is_win: false,
                kills: 0,
            })
            .await
            .unwrap();
        }
        player_id
    }

    #[tokio::test]
    async fn leaderboard_orders_by_wins_then_total_matches() {
        let setup = setup();

        seed_player(&setup.repo, "bronze", 1, 0).await;
        seed_player(&setup.repo, "gold", 4, 1).await;
        seed_player(&setup.repo, "silver", 1, 3).await;

        let board = setup.service.global_leaderboard(10, 0).await.unwrap();

        let names: Vec<&str> = board.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, vec!["gold", "silver", "bronze"]);

        let ranks: Vec<u64> = board.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn page_ranks_continue_from_offset() {
        let setup = setup();

        for wins in 1..=5 {
            seed_player(&setup.repo, &format!("p{wins}"), wins, 0).await;
        }

        let page = setup.service.global_leaderboard(2, 2).await.unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(page[0].rank, 3);
        assert_eq!(page[1].rank, 4);
        assert_eq!(page[0].username, "p3");
    }

    #[tokio::test]
    async fn zero_limit_and_far_offset_return_empty() {
        let setup = setup();
        seed_player(&setup.repo, "only", 1, 0).await;

        assert!(setup.service.global_leaderboard(0, 0).await.unwrap().is_empty());
        assert!(setup.service.global_leaderboard(10, 50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn top_players_is_the_first_page() {
        let setup = setup();

        for wins in 1..=4 {
            seed_player(&setup.repo, &format!("p{wins}"), wins, 0).await;
        }

        let top = setup.service.top_players(2).await.unwrap();
        let page = setup.service.global_leaderboard(2, 0).await.unwrap();

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].player_id, page[0].player_id);
        assert_eq!(top[1].player_id, page[1].player_id);
    }

    #[tokio::test]
    async fn player_rank_for_top_player_is_one() {
        let setup = setup();

        let best = seed_player(&setup.repo, "best", 9, 0).await;
        seed_player(&setup.repo, "rest", 2, 2).await;

        let entry = setup.service.player_rank(best).await.unwrap();
        assert_eq!(entry.rank, 1);
        assert_eq!(entry.wins, 9);
    }

    #[tokio::test]
    async fn player_rank_is_correct_outside_any_page() {
        let setup = setup();

        for wins in 1..=6 {
            seed_player(&setup.repo, &format!("p{wins}"), wins, 0).await;
        }
        let worst = seed_player(&setup.repo, "worst", 0, 1).await;

        let entry = setup.service.player_rank(worst).await.unwrap();
        assert_eq!(entry.rank, 7);
    }

    #[tokio::test]
    async fn fully_tied_players_share_a_rank() {
        let setup = setup();

        seed_player(&setup.repo, "ahead", 5, 0).await;
        let tied_a = seed_player(&setup.repo, "tied-a", 3, 1).await;
        let tied_b = seed_player(&setup.repo, "tied-b", 3, 1).await;

        let rank_a = setup.service.player_rank(tied_a).await.unwrap().rank;
        let rank_b = setup.service.player_rank(tied_b).await.unwrap().rank;

        assert_eq!(rank_a, 2);
        assert_eq!(rank_b, 2);
    }

    #[tokio::test]
    async fn unknown_player_rank_is_not_found() {
        let setup = setup();
        seed_player(&setup.repo, "someone", 1, 0).await;

        let result = setup.service.player_rank(Uuid::new_v4()).await;
        assert!(matches!(result, Err(StatsError::NotFound(_))));
    }

    #[tokio::test]
    async fn total_players_counts_distinct_rows() {
        let setup = setup();

        seed_player(&setup.repo, "a", 2, 1).await;
        seed_player(&setup.repo, "b", 0, 1).await;

        assert_eq!(setup.service.total_players().await.unwrap(), 2);
    }
}
