use tracing::debug;

use tally_types::models::{RankedEntry, UserProfile};

use crate::store::{Result, Store};
use crate::{Database, keys};

impl<S: Store> Database<S> {
    // -- View tracker --

    /// Counts one view for `username` and returns the new total.
    ///
    /// The counter is incremented first and its returned value is what gets
    /// written to the leaderboard, so a concurrent view for the same user can
    /// briefly leave the leaderboard one step behind the counter.
    pub async fn record_view(
        &self,
        username: &str,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<i64> {
        let views = self.store.incr(&keys::views(username), 1).await?;

        let fields: Vec<(&str, &str)> = [("name", name), ("email", email)]
            .into_iter()
            .filter_map(|(field, value)| value.map(|v| (field, v)))
            .collect();
        if !fields.is_empty() {
            self.store.hset_multiple(&keys::user(username), &fields).await?;
        }

        self.store.sadd(keys::UNIQUE_USERS, username).await?;
        self.store
            .zadd(keys::VIEW_LEADERBOARD, username, views as f64)
            .await?;

        debug!("View recorded for {} (total {})", username, views);
        Ok(views)
    }

    /// Metadata and view count. Unknown users come back with no metadata and
    /// zero views.
    pub async fn get_user(&self, username: &str) -> Result<UserProfile> {
        let mut fields = self.store.hgetall(&keys::user(username)).await?;
        let views = self.store.get_int(&keys::views(username)).await?;

        Ok(UserProfile {
            username: username.to_string(),
            name: fields.remove("name"),
            email: fields.remove("email"),
            views: views.unwrap_or(0),
        })
    }

    pub async fn unique_users(&self) -> Result<Vec<String>> {
        self.store.smembers(keys::UNIQUE_USERS).await
    }

    pub async fn top_viewers(&self, n: usize) -> Result<Vec<RankedEntry>> {
        self.top_of(keys::VIEW_LEADERBOARD, n).await
    }

    /// The first `n` members of a sorted set, highest score first.
    pub(crate) async fn top_of(&self, key: &str, n: usize) -> Result<Vec<RankedEntry>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let stop = isize::try_from(n - 1).unwrap_or(isize::MAX);
        let entries = self.store.zrevrange_withscores(key, 0, stop).await?;

        Ok(entries
            .into_iter()
            .enumerate()
            .map(|(i, (username, score))| RankedEntry {
                rank: i as u64 + 1,
                username,
                score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, MemoryStore, Store, keys};

    fn db() -> Database<MemoryStore> {
        Database::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn repeated_views_accumulate() {
        let db = db();
        for expected in 1..=7 {
            assert_eq!(db.record_view("ann", None, None).await.unwrap(), expected);
        }

        let user = db.get_user("ann").await.unwrap();
        assert_eq!(user.views, 7);

        let score = db.store().zscore(keys::VIEW_LEADERBOARD, "ann").await.unwrap();
        assert_eq!(score, Some(7.0));
    }

    #[tokio::test]
    async fn metadata_is_upserted() {
        let db = db();
        db.record_view("ann", Some("Ann"), None).await.unwrap();
        db.record_view("ann", None, Some("ann@example.com")).await.unwrap();
        db.record_view("ann", Some("Annie"), None).await.unwrap();

        let user = db.get_user("ann").await.unwrap();
        assert_eq!(user.name.as_deref(), Some("Annie"));
        assert_eq!(user.email.as_deref(), Some("ann@example.com"));
        assert_eq!(user.views, 3);
    }

    #[tokio::test]
    async fn unknown_user_has_zero_views() {
        let user = db().get_user("ghost").await.unwrap();
        assert_eq!(user.username, "ghost");
        assert_eq!(user.views, 0);
        assert!(user.name.is_none());
        assert!(user.email.is_none());
    }

    #[tokio::test]
    async fn unique_users_are_deduplicated() {
        let db = db();
        db.record_view("ann", None, None).await.unwrap();
        db.record_view("bob", None, None).await.unwrap();
        db.record_view("ann", None, None).await.unwrap();

        let mut users = db.unique_users().await.unwrap();
        users.sort();
        assert_eq!(users, ["ann", "bob"]);
    }

    #[tokio::test]
    async fn top_viewers_are_ranked_by_views() {
        let db = db();
        for (user, views) in [("ann", 2), ("bob", 5), ("cat", 1)] {
            for _ in 0..views {
                db.record_view(user, None, None).await.unwrap();
            }
        }

        let top = db.top_viewers(2).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!((top[0].rank, top[0].username.as_str(), top[0].score), (1, "bob", 5.0));
        assert_eq!((top[1].rank, top[1].username.as_str(), top[1].score), (2, "ann", 2.0));

        assert!(db.top_viewers(0).await.unwrap().is_empty());
    }
}
