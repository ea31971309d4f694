use tracing::debug;

use tally_types::models::RankedEntry;

use crate::store::{Result, Store};
use crate::{Database, keys};

impl<S: Store> Database<S> {
    // -- Score leaderboard --

    /// Sets `username`'s score, replacing any previous one.
    pub async fn submit_score(&self, username: &str, score: f64) -> Result<()> {
        self.store
            .zadd(keys::SCORE_LEADERBOARD, username, score)
            .await?;
        debug!("Score for {} set to {}", username, score);
        Ok(())
    }

    pub async fn top_scores(&self, n: usize) -> Result<Vec<RankedEntry>> {
        self.top_of(keys::SCORE_LEADERBOARD, n).await
    }

    /// 1-based position among all scores (highest first) and the score
    /// itself, or `None` if the user has no entry.
    pub async fn rank(&self, username: &str) -> Result<Option<RankedEntry>> {
        let Some(position) = self.store.zrevrank(keys::SCORE_LEADERBOARD, username).await? else {
            return Ok(None);
        };
        // The entry can vanish between the two lookups.
        let Some(score) = self.store.zscore(keys::SCORE_LEADERBOARD, username).await? else {
            return Ok(None);
        };

        Ok(Some(RankedEntry {
            rank: position + 1,
            username: username.to_string(),
            score,
        }))
    }

    /// Returns whether an entry existed.
    pub async fn remove_score(&self, username: &str) -> Result<bool> {
        let removed = self.store.zrem(keys::SCORE_LEADERBOARD, username).await?;
        debug!("Remove score for {}: existed={}", username, removed);
        Ok(removed)
    }
}
