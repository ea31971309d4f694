//! The subset of data-structure store commands the service relies on.
//!
//! Every method maps onto exactly one native command and keeps its
//! semantics: missing keys read as empty, writes create keys on demand and
//! range indices may be negative (counted from the tail).

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("WRONGTYPE Operation against a key holding the wrong kind of value: {0}")]
    WrongType(String),

    #[error("Value at {0} is not an integer or out of range")]
    NotAnInteger(String),

    #[error("Malformed stored value: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

pub trait Store: Send + Sync + 'static {
    /// Round-trip check used by the health endpoint.
    fn ping(&self) -> impl Future<Output = Result<()>> + Send;

    // -- Strings --

    fn incr(&self, key: &str, delta: i64) -> impl Future<Output = Result<i64>> + Send;

    fn get_int(&self, key: &str) -> impl Future<Output = Result<Option<i64>>> + Send;

    // -- Hashes --

    fn hset_multiple(
        &self,
        key: &str,
        fields: &[(&str, &str)],
    ) -> impl Future<Output = Result<()>> + Send;

    fn hgetall(&self, key: &str) -> impl Future<Output = Result<HashMap<String, String>>> + Send;

    // -- Sets --

    /// Returns true if the member was newly added.
    fn sadd(&self, key: &str, member: &str) -> impl Future<Output = Result<bool>> + Send;

    fn smembers(&self, key: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    // -- Sorted sets --

    fn zadd(&self, key: &str, member: &str, score: f64) -> impl Future<Output = Result<()>> + Send;

    /// Members with scores, highest score first, inclusive index range.
    fn zrevrange_withscores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> impl Future<Output = Result<Vec<(String, f64)>>> + Send;

    /// 0-based position in descending order.
    fn zrevrank(&self, key: &str, member: &str) -> impl Future<Output = Result<Option<u64>>> + Send;

    fn zscore(&self, key: &str, member: &str) -> impl Future<Output = Result<Option<f64>>> + Send;

    /// Returns true if the member existed.
    fn zrem(&self, key: &str, member: &str) -> impl Future<Output = Result<bool>> + Send;

    // -- Lists --

    /// Appends to the tail, returning the new length.
    fn rpush(&self, key: &str, value: &str) -> impl Future<Output = Result<u64>> + Send;

    fn ltrim(&self, key: &str, start: isize, stop: isize) -> impl Future<Output = Result<()>> + Send;

    fn lpop(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Pops from the head, waiting up to `timeout` for a value to arrive.
    /// A zero timeout waits indefinitely.
    fn blpop(
        &self,
        key: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    fn lrange(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    fn llen(&self, key: &str) -> impl Future<Output = Result<u64>> + Send;
}
