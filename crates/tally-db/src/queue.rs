use std::time::Duration;

use tracing::{debug, warn};

use tally_types::models::QueueMessage;

use crate::store::{Result, Store};
use crate::{Database, keys};

impl<S: Store> Database<S> {
    // -- Message queue --

    /// Appends a message to the tail and trims the list to the newest
    /// `queue_capacity` entries. Returns the stored message and the queue
    /// length after trimming.
    ///
    /// Trimming drops the oldest entries whether or not they were consumed.
    pub async fn enqueue(&self, user: &str, content: &str) -> Result<(QueueMessage, u64)> {
        let message = QueueMessage::new(user, content);
        let encoded = serde_json::to_string(&message)?;

        let pushed = self.store.rpush(keys::QUEUE, &encoded).await?;
        let capacity = self.queue_capacity as u64;
        let keep = isize::try_from(self.queue_capacity).unwrap_or(isize::MAX);
        self.store.ltrim(keys::QUEUE, -keep, -1).await?;

        if pushed > capacity {
            warn!(
                "Queue over capacity, dropped {} oldest message(s)",
                pushed - capacity
            );
        }

        debug!("Enqueued message {} from {}", message.id, message.user);
        Ok((message, pushed.min(capacity)))
    }

    /// Pops the oldest message, or `None` if the queue is empty.
    pub async fn dequeue(&self) -> Result<Option<QueueMessage>> {
        match self.store.lpop(keys::QUEUE).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Like [`Database::dequeue`] but waits up to `timeout` for a message.
    /// `None` means the wait elapsed with nothing to pop.
    pub async fn dequeue_blocking(&self, timeout: Duration) -> Result<Option<QueueMessage>> {
        match self.store.blpop(keys::QUEUE, timeout).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Every queued message, oldest first, without removing any.
    pub async fn peek_all(&self) -> Result<Vec<QueueMessage>> {
        let raw = self.store.lrange(keys::QUEUE, 0, -1).await?;

        Ok(raw
            .iter()
            .filter_map(|entry| {
                serde_json::from_str::<QueueMessage>(entry)
                    .map_err(|e| warn!("Skipping malformed queue entry: {}", e))
                    .ok()
            })
            .collect())
    }

    pub async fn queue_length(&self) -> Result<u64> {
        self.store.llen(keys::QUEUE).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crate::{Database, MemoryStore, Store, StoreError, keys};

    fn db() -> Database<MemoryStore> {
        Database::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn fifo_order() {
        let db = db();
        db.enqueue("ann", "A").await.unwrap();
        db.enqueue("bob", "B").await.unwrap();

        assert_eq!(db.dequeue().await.unwrap().unwrap().content, "A");
        assert_eq!(db.dequeue().await.unwrap().unwrap().content, "B");
        assert!(db.dequeue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn keeps_only_newest_hundred() {
        let db = db();
        for i in 0..150 {
            let (_, length) = db.enqueue("ann", &i.to_string()).await.unwrap();
            assert_eq!(length, (i + 1).min(100));
        }

        assert_eq!(db.queue_length().await.unwrap(), 100);

        let contents: Vec<String> = db
            .peek_all()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        let expected: Vec<String> = (50..150).map(|i| i.to_string()).collect();
        assert_eq!(contents, expected);
    }

    #[tokio::test]
    async fn custom_capacity() {
        let db = db().with_queue_capacity(3);
        for content in ["a", "b", "c", "d", "e"] {
            db.enqueue("ann", content).await.unwrap();
        }
        let contents: Vec<_> = db.peek_all().await.unwrap().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, ["c", "d", "e"]);
    }

    #[tokio::test]
    async fn peek_does_not_consume() {
        let db = db();
        let (sent, _) = db.enqueue("ann", "hello").await.unwrap();

        let peeked = db.peek_all().await.unwrap();
        assert_eq!(peeked, vec![sent.clone()]);
        assert_eq!(db.queue_length().await.unwrap(), 1);
        assert_eq!(db.dequeue().await.unwrap(), Some(sent));
    }

    #[tokio::test]
    async fn blocking_dequeue_times_out() {
        let db = db();
        let started = Instant::now();
        let popped = db.dequeue_blocking(Duration::from_millis(150)).await.unwrap();
        assert!(popped.is_none());
        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn blocking_dequeue_returns_existing_message() {
        let db = db();
        db.enqueue("ann", "ready").await.unwrap();
        let popped = db.dequeue_blocking(Duration::from_secs(1)).await.unwrap();
        assert_eq!(popped.unwrap().content, "ready");
    }

    #[tokio::test]
    async fn malformed_entries() {
        let db = db();
        db.store().rpush(keys::QUEUE, "not json").await.unwrap();
        db.enqueue("ann", "ok").await.unwrap();

        let peeked = db.peek_all().await.unwrap();
        assert_eq!(peeked.len(), 1);
        assert_eq!(peeked[0].content, "ok");

        assert!(matches!(db.dequeue().await, Err(StoreError::Codec(_))));
    }
}
