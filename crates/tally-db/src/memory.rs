//! In-process store with Redis command semantics.
//!
//! Holds every key in a single map behind a mutex. Values are typed the way
//! Redis types them, so using a key as the wrong kind fails with
//! `WrongType` instead of silently overwriting it. Containers that become
//! empty are removed, matching Redis' behaviour of deleting empty keys.
//!
//! Blocking pops park on a `Notify` that every push signals.

use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::Range;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{Instant, timeout_at};

use crate::store::{Result, Store, StoreError};

enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    Set(HashSet<String>),
    ZSet(HashMap<String, f64>),
    List(VecDeque<String>),
}

type Data = HashMap<String, Value>;

#[derive(Default)]
struct Shared {
    data: Mutex<Data>,
    pushed: Notify,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_data<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Data) -> Result<T>,
    {
        let mut data = self.shared.data.lock().map_err(|_| StoreError::Poisoned)?;
        f(&mut data)
    }
}

fn wrong_type(key: &str) -> StoreError {
    StoreError::WrongType(key.to_string())
}

fn parse_int(key: &str, raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| StoreError::NotAnInteger(key.to_string()))
}

fn hash_mut<'a>(data: &'a mut Data, key: &str) -> Result<&'a mut HashMap<String, String>> {
    match data
        .entry(key.to_string())
        .or_insert_with(|| Value::Hash(HashMap::new()))
    {
        Value::Hash(hash) => Ok(hash),
        _ => Err(wrong_type(key)),
    }
}

fn set_mut<'a>(data: &'a mut Data, key: &str) -> Result<&'a mut HashSet<String>> {
    match data
        .entry(key.to_string())
        .or_insert_with(|| Value::Set(HashSet::new()))
    {
        Value::Set(set) => Ok(set),
        _ => Err(wrong_type(key)),
    }
}

fn zset_mut<'a>(data: &'a mut Data, key: &str) -> Result<&'a mut HashMap<String, f64>> {
    match data
        .entry(key.to_string())
        .or_insert_with(|| Value::ZSet(HashMap::new()))
    {
        Value::ZSet(zset) => Ok(zset),
        _ => Err(wrong_type(key)),
    }
}

fn list_mut<'a>(data: &'a mut Data, key: &str) -> Result<&'a mut VecDeque<String>> {
    match data
        .entry(key.to_string())
        .or_insert_with(|| Value::List(VecDeque::new()))
    {
        Value::List(list) => Ok(list),
        _ => Err(wrong_type(key)),
    }
}

fn zset_ref<'a>(data: &'a Data, key: &str) -> Result<Option<&'a HashMap<String, f64>>> {
    match data.get(key) {
        None => Ok(None),
        Some(Value::ZSet(zset)) => Ok(Some(zset)),
        Some(_) => Err(wrong_type(key)),
    }
}

fn list_ref<'a>(data: &'a Data, key: &str) -> Result<Option<&'a VecDeque<String>>> {
    match data.get(key) {
        None => Ok(None),
        Some(Value::List(list)) => Ok(Some(list)),
        Some(_) => Err(wrong_type(key)),
    }
}

/// Members ordered the way ZREVRANGE returns them: score descending, ties
/// broken by member descending.
fn descending(zset: &HashMap<String, f64>) -> Vec<(&String, f64)> {
    let mut entries: Vec<_> = zset.iter().map(|(member, score)| (member, *score)).collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| b.0.cmp(a.0)));
    entries
}

/// Converts an inclusive start/stop pair (negative = from the tail) into a
/// half-open range over `len` items. `None` means the range selects nothing.
fn resolve_range(len: usize, start: isize, stop: isize) -> Option<Range<usize>> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if start > stop || start >= len {
        return None;
    }
    Some(start as usize..stop as usize + 1)
}

impl Store for MemoryStore {
    async fn ping(&self) -> Result<()> {
        self.with_data(|_| Ok(()))
    }

    async fn incr(&self, key: &str, delta: i64) -> Result<i64> {
        self.with_data(|data| {
            let current = match data.get(key) {
                None => 0,
                Some(Value::Str(raw)) => parse_int(key, raw)?,
                Some(_) => return Err(wrong_type(key)),
            };
            let next = current
                .checked_add(delta)
                .ok_or_else(|| StoreError::NotAnInteger(key.to_string()))?;
            data.insert(key.to_string(), Value::Str(next.to_string()));
            Ok(next)
        })
    }

    async fn get_int(&self, key: &str) -> Result<Option<i64>> {
        self.with_data(|data| match data.get(key) {
            None => Ok(None),
            Some(Value::Str(raw)) => parse_int(key, raw).map(Some),
            Some(_) => Err(wrong_type(key)),
        })
    }

    async fn hset_multiple(&self, key: &str, fields: &[(&str, &str)]) -> Result<()> {
        self.with_data(|data| {
            let hash = hash_mut(data, key)?;
            for (field, value) in fields {
                hash.insert(field.to_string(), value.to_string());
            }
            if hash.is_empty() {
                data.remove(key);
            }
            Ok(())
        })
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        self.with_data(|data| match data.get(key) {
            None => Ok(HashMap::new()),
            Some(Value::Hash(hash)) => Ok(hash.clone()),
            Some(_) => Err(wrong_type(key)),
        })
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        self.with_data(|data| Ok(set_mut(data, key)?.insert(member.to_string())))
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        self.with_data(|data| match data.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(_) => Err(wrong_type(key)),
        })
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        self.with_data(|data| {
            zset_mut(data, key)?.insert(member.to_string(), score);
            Ok(())
        })
    }

    async fn zrevrange_withscores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<(String, f64)>> {
        self.with_data(|data| {
            let Some(zset) = zset_ref(data, key)? else {
                return Ok(Vec::new());
            };
            let entries = descending(zset);
            let Some(range) = resolve_range(entries.len(), start, stop) else {
                return Ok(Vec::new());
            };
            Ok(entries[range]
                .iter()
                .map(|(member, score)| (member.to_string(), *score))
                .collect())
        })
    }

    async fn zrevrank(&self, key: &str, member: &str) -> Result<Option<u64>> {
        self.with_data(|data| {
            let Some(zset) = zset_ref(data, key)? else {
                return Ok(None);
            };
            if !zset.contains_key(member) {
                return Ok(None);
            }
            Ok(descending(zset)
                .iter()
                .position(|(m, _)| m.as_str() == member)
                .map(|pos| pos as u64))
        })
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>> {
        self.with_data(|data| Ok(zset_ref(data, key)?.and_then(|zset| zset.get(member).copied())))
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<bool> {
        self.with_data(|data| match data.get_mut(key) {
            None => Ok(false),
            Some(Value::ZSet(zset)) => {
                let removed = zset.remove(member).is_some();
                if zset.is_empty() {
                    data.remove(key);
                }
                Ok(removed)
            }
            Some(_) => Err(wrong_type(key)),
        })
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<u64> {
        let len = self.with_data(|data| {
            let list = list_mut(data, key)?;
            list.push_back(value.to_string());
            Ok(list.len() as u64)
        })?;

        self.shared.pushed.notify_waiters();
        Ok(len)
    }

    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<()> {
        self.with_data(|data| {
            let Some(list) = list_ref(data, key)? else {
                return Ok(());
            };
            match resolve_range(list.len(), start, stop) {
                Some(range) => {
                    let list = list_mut(data, key)?;
                    list.truncate(range.end);
                    list.drain(..range.start);
                }
                None => {
                    data.remove(key);
                }
            }
            Ok(())
        })
    }

    async fn lpop(&self, key: &str) -> Result<Option<String>> {
        self.with_data(|data| {
            if list_ref(data, key)?.is_none() {
                return Ok(None);
            }
            let list = list_mut(data, key)?;
            let popped = list.pop_front();
            if list.is_empty() {
                data.remove(key);
            }
            Ok(popped)
        })
    }

    async fn blpop(&self, key: &str, timeout: Duration) -> Result<Option<String>> {
        let deadline = (!timeout.is_zero()).then(|| Instant::now() + timeout);

        loop {
            // Register interest before checking so a push landing between
            // the check and the wait still wakes us.
            let notified = self.shared.pushed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(value) = self.lpop(key).await? {
                return Ok(Some(value));
            }

            match deadline {
                Some(deadline) => {
                    if timeout_at(deadline, notified).await.is_err() {
                        return Ok(None);
                    }
                }
                None => notified.await,
            }
        }
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        self.with_data(|data| {
            let Some(list) = list_ref(data, key)? else {
                return Ok(Vec::new());
            };
            let Some(range) = resolve_range(list.len(), start, stop) else {
                return Ok(Vec::new());
            };
            Ok(list.range(range).cloned().collect())
        })
    }

    async fn llen(&self, key: &str) -> Result<u64> {
        self.with_data(|data| Ok(list_ref(data, key)?.map_or(0, |list| list.len() as u64)))
    }
}
