pub mod keys;
pub mod leaderboard;
pub mod memory;
pub mod queue;
pub mod redis_store;
pub mod store;
pub mod views;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::{Result, Store, StoreError};

use tracing::info;

/// Default number of messages retained by the queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// View tracker, message queue and score leaderboard over a shared store.
///
/// Each operation is a short sequence of independent store commands. Nothing
/// is wrapped in a transaction: per-command atomicity is whatever the store
/// provides.
pub struct Database<S> {
    store: S,
    queue_capacity: usize,
}

impl<S: Store> Database<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// A capacity of zero is raised to one.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        info!("Queue capacity set to {}", self.queue_capacity);
        self
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }
}
