use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::store::{Batch, KeyValueStore, StoreError, WriteOp};

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    List(VecDeque<String>),
}

type Keyspace = HashMap<String, Value>;

/// In-process store with Redis reply semantics for the commands the
/// repository issues, including EXEC's lack of rollback. Used by tests and
/// `memory://` runs.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<Keyspace>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Stores a plain string value; lets callers plant keys of the wrong type.
    pub fn set(&self, key: &str, value: &str) {
        if let Ok(mut data) = self.lock() {
            data.insert(key.to_string(), Value::Str(value.to_string()));
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().map(|data| data.contains_key(key)).unwrap_or(false)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Keyspace>, StoreError> {
        self.data.lock().map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

fn hash_mut<'a>(data: &'a mut Keyspace, key: &str) -> Result<&'a mut HashMap<String, String>, StoreError> {
    match data.entry(key.to_string()).or_insert_with(|| Value::Hash(HashMap::new())) {
        Value::Hash(h) => Ok(h),
        _ => Err(StoreError::Command(WRONGTYPE.into())),
    }
}

fn list_mut<'a>(data: &'a mut Keyspace, key: &str) -> Result<&'a mut VecDeque<String>, StoreError> {
    match data.entry(key.to_string()).or_insert_with(|| Value::List(VecDeque::new())) {
        Value::List(l) => Ok(l),
        _ => Err(StoreError::Command(WRONGTYPE.into())),
    }
}

fn hset(data: &mut Keyspace, key: &str, fields: &[(String, String)]) -> Result<i64, StoreError> {
    if fields.is_empty() {
        return Err(StoreError::Command("ERR wrong number of arguments for 'hset' command".into()));
    }
    let hash = hash_mut(data, key)?;
    let mut added = 0;
    for (field, value) in fields {
        if hash.insert(field.clone(), value.clone()).is_none() {
            added += 1;
        }
    }
    Ok(added)
}

fn apply(data: &mut Keyspace, op: &WriteOp) -> Result<i64, StoreError> {
    match op {
        WriteOp::HSet { key, fields } => hset(data, key, fields),
        WriteOp::RPush { key, value } => {
            let list = list_mut(data, key)?;
            list.push_back(value.clone());
            Ok(list.len() as i64)
        }
        WriteOp::LRem { key, count, value } => {
            let removed = match data.get_mut(key) {
                None => 0,
                Some(Value::List(list)) => remove_from_list(list, *count, value),
                Some(_) => return Err(StoreError::Command(WRONGTYPE.into())),
            };
            if matches!(data.get(key), Some(Value::List(l)) if l.is_empty()) {
                data.remove(key);
            }
            Ok(removed)
        }
        WriteOp::Del { key } => Ok(data.remove(key).map_or(0, |_| 1)),
    }
}

/// LREM semantics: positive count scans head to tail, negative tail to head,
/// zero removes every match.
fn remove_from_list(list: &mut VecDeque<String>, count: i64, value: &str) -> i64 {
    let limit = if count == 0 { usize::MAX } else { count.unsigned_abs() as usize };
    let mut positions: Vec<usize> = list.iter().enumerate().filter(|(_, v)| *v == value).map(|(i, _)| i).collect();
    if count < 0 {
        positions.reverse();
    }
    positions.truncate(limit);
    positions.sort_unstable_by(|a, b| b.cmp(a));
    for i in &positions {
        list.remove(*i);
    }
    positions.len() as i64
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut data = self.lock()?;
        let current = match data.get(key) {
            None => 0,
            Some(Value::Str(s)) => s.parse::<i64>().map_err(|_| StoreError::Command("ERR value is not an integer or out of range".into()))?,
            Some(_) => return Err(StoreError::Command(WRONGTYPE.into())),
        };
        let next = current + 1;
        data.insert(key.to_string(), Value::Str(next.to_string()));
        Ok(next)
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        match self.lock()?.get(key) {
            None => Ok(HashMap::new()),
            Some(Value::Hash(h)) => Ok(h.clone()),
            Some(_) => Err(StoreError::Command(WRONGTYPE.into())),
        }
    }

    async fn hset_existing(&self, key: &str, fields: &[(String, String)]) -> Result<Option<i64>, StoreError> {
        let mut data = self.lock()?;
        if !data.contains_key(key) {
            return Ok(None);
        }
        hset(&mut data, key, fields).map(Some)
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, StoreError> {
        let data = self.lock()?;
        let list = match data.get(key) {
            None => return Ok(Vec::new()),
            Some(Value::List(l)) => l,
            Some(_) => return Err(StoreError::Command(WRONGTYPE.into())),
        };
        let len = list.len() as i64;
        let start = if start < 0 { (len + start).max(0) } else { start };
        let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
        if start > stop {
            return Ok(Vec::new());
        }
        Ok(list.iter().skip(start as usize).take((stop - start + 1) as usize).cloned().collect())
    }

    async fn del(&self, key: &str) -> Result<i64, StoreError> {
        let mut data = self.lock()?;
        apply(&mut data, &WriteOp::Del { key: key.to_string() })
    }

    async fn flushdb(&self) -> Result<String, StoreError> {
        self.lock()?.clear();
        Ok("OK".to_string())
    }

    async fn exec(&self, batch: Batch) -> Result<Vec<i64>, StoreError> {
        let mut data = self.lock()?;
        // Like EXEC: every op runs under the lock, a failing op does not undo
        // the ones before it, and the first failure becomes the reply.
        let results: Vec<_> = batch.ops().iter().map(|op| apply(&mut data, op)).collect();
        results.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn incr_counts_from_one() {
        let store = MemoryStore::new();
        assert_eq!(store.incr("index").await.unwrap(), 1);
        assert_eq!(store.incr("index").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn lrange_handles_negative_bounds() {
        let store = MemoryStore::new();
        let batch = Batch::new().rpush("l", "a").rpush("l", "b").rpush("l", "c");
        assert_eq!(store.exec(batch).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(store.lrange("l", 0, -1).await.unwrap(), vec!["a", "b", "c"]);
        assert_eq!(store.lrange("l", -2, -1).await.unwrap(), vec!["b", "c"]);
        assert_eq!(store.lrange("l", 1, 10).await.unwrap(), vec!["b", "c"]);
        assert!(store.lrange("l", 2, 1).await.unwrap().is_empty());
        assert!(store.lrange("missing", 0, -1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lrem_removes_requested_occurrences() {
        let store = MemoryStore::new();
        store.exec(Batch::new().rpush("l", "x").rpush("l", "y").rpush("l", "x")).await.unwrap();
        assert_eq!(store.exec(Batch::new().lrem("l", 1, "x")).await.unwrap(), vec![1]);
        assert_eq!(store.lrange("l", 0, -1).await.unwrap(), vec!["y", "x"]);
        assert_eq!(store.exec(Batch::new().lrem("l", 1, "z")).await.unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn failing_batch_keeps_the_other_writes() {
        let store = MemoryStore::new();
        store.set("keys", "not a list");
        let batch = Batch::new().hset("1", vec![("title".into(), "t".into())]).rpush("keys", "1").del("2").rpush("other", "x");
        assert!(matches!(store.exec(batch).await, Err(StoreError::Command(_))));
        assert!(store.contains_key("1"));
        assert_eq!(store.lrange("other", 0, -1).await.unwrap(), vec!["x"]);
    }

    #[tokio::test]
    async fn hset_existing_skips_absent_keys() {
        let store = MemoryStore::new();
        let fields = vec![("title".to_string(), "t".to_string())];
        assert_eq!(store.hset_existing("1", &fields).await.unwrap(), None);
        assert!(!store.contains_key("1"));
        store.exec(Batch::new().hset("1", fields.clone())).await.unwrap();
        assert_eq!(store.hset_existing("1", &fields).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn flushdb_acknowledges_ok() {
        let store = MemoryStore::new();
        store.set("other", "value");
        assert_eq!(store.flushdb().await.unwrap(), "OK");
        assert!(!store.contains_key("other"));
    }
}
