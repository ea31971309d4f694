use std::collections::HashMap;
use std::time::Duration;

use redis::{
    AsyncCommands, AsyncConnectionConfig, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use tracing::{debug, info};

use crate::store::{Result, Store};

const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// Extra time granted to the blocking connection beyond the BLPOP timeout
/// before the client gives up on the reply.
const BLOCKING_GRACE: Duration = Duration::from_secs(1);

/// Store backed by a Redis server.
///
/// Regular commands share one auto-reconnecting multiplexed connection.
/// BLPOP would stall every request pipelined behind it on that connection,
/// so each blocking pop opens its own.
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
    manager: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(CONNECT_TIMEOUT);

        let client = Client::open(redis_url)?;
        let manager = client.get_connection_manager_with_config(config).await?;

        info!("Connected to Redis at {}", redis_url);
        Ok(Self { client, manager })
    }

    fn conn(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

/// Connection settings for a single BLPOP. A zero timeout blocks
/// indefinitely, so no response deadline is set for it.
fn blocking_config(timeout: Duration) -> AsyncConnectionConfig {
    let config = AsyncConnectionConfig::new().set_connection_timeout(CONNECT_TIMEOUT);
    if timeout.is_zero() {
        config
    } else {
        config.set_response_timeout(timeout + BLOCKING_GRACE)
    }
}

impl Store for RedisStore {
    async fn ping(&self) -> Result<()> {
        let _: String = redis::cmd("PING").query_async(&mut self.conn()).await?;
        Ok(())
    }

    async fn incr(&self, key: &str, delta: i64) -> Result<i64> {
        Ok(self.conn().incr(key, delta).await?)
    }

    async fn get_int(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.conn().get(key).await?)
    }

    async fn hset_multiple(&self, key: &str, fields: &[(&str, &str)]) -> Result<()> {
        let _: () = self.conn().hset_multiple(key, fields).await?;
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        Ok(self.conn().hgetall(key).await?)
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        let added: u64 = self.conn().sadd(key, member).await?;
        Ok(added > 0)
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        Ok(self.conn().smembers(key).await?)
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        let _: u64 = self.conn().zadd(key, member, score).await?;
        Ok(())
    }

    async fn zrevrange_withscores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<(String, f64)>> {
        Ok(self.conn().zrevrange_withscores(key, start, stop).await?)
    }

    async fn zrevrank(&self, key: &str, member: &str) -> Result<Option<u64>> {
        Ok(self.conn().zrevrank(key, member).await?)
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>> {
        Ok(self.conn().zscore(key, member).await?)
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<bool> {
        let removed: u64 = self.conn().zrem(key, member).await?;
        Ok(removed > 0)
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<u64> {
        Ok(self.conn().rpush(key, value).await?)
    }

    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<()> {
        let _: () = self.conn().ltrim(key, start, stop).await?;
        Ok(())
    }

    async fn lpop(&self, key: &str) -> Result<Option<String>> {
        Ok(self.conn().lpop(key, None).await?)
    }

    async fn blpop(&self, key: &str, timeout: Duration) -> Result<Option<String>> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection_with_config(&blocking_config(timeout))
            .await?;

        debug!("BLPOP {} for up to {:?}", key, timeout);
        let popped: Option<(String, String)> = conn.blpop(key, timeout.as_secs_f64()).await?;
        Ok(popped.map(|(_, value)| value))
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        Ok(self.conn().lrange(key, start, stop).await?)
    }

    async fn llen(&self, key: &str) -> Result<u64> {
        Ok(self.conn().llen(key).await?)
    }
}
