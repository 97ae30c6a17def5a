use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or did not answer in time.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The store answered with an error reply.
    #[error("store command failed: {0}")]
    Command(String),
}

/// A write queued for atomic execution. Every variant yields an integer reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    HSet { key: String, fields: Vec<(String, String)> },
    RPush { key: String, value: String },
    LRem { key: String, count: i64, value: String },
    Del { key: String },
}

/// Commands executed as one MULTI/EXEC transaction. No other client's
/// commands interleave with them, but there is no rollback: a command that
/// fails while running leaves the rest applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    ops: Vec<WriteOp>,
}

impl Batch {
    pub fn new() -> Self { Self::default() }

    pub fn hset(mut self, key: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        self.ops.push(WriteOp::HSet { key: key.into(), fields });
        self
    }

    pub fn rpush(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ops.push(WriteOp::RPush { key: key.into(), value: value.into() });
        self
    }

    pub fn lrem(mut self, key: impl Into<String>, count: i64, value: impl Into<String>) -> Self {
        self.ops.push(WriteOp::LRem { key: key.into(), count, value: value.into() });
        self
    }

    pub fn del(mut self, key: impl Into<String>) -> Self {
        self.ops.push(WriteOp::Del { key: key.into() });
        self
    }

    pub fn ops(&self) -> &[WriteOp] { &self.ops }

    pub fn is_empty(&self) -> bool { self.ops.is_empty() }
}

/// The key-value primitives the repository is built on. Replies follow Redis
/// semantics.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    async fn ping(&self) -> Result<(), StoreError>;
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;
    /// Returns every field of the hash; an absent key reads as an empty map.
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;
    /// Writes `fields` onto the hash only if the key already exists.
    /// `None` means the key was absent and nothing was written.
    async fn hset_existing(&self, key: &str, fields: &[(String, String)]) -> Result<Option<i64>, StoreError>;
    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, StoreError>;
    async fn del(&self, key: &str) -> Result<i64, StoreError>;
    /// Returns the status line the store acknowledged with (`OK` on success).
    async fn flushdb(&self) -> Result<String, StoreError>;
    /// Runs the batch in isolation and returns one integer reply per op, or
    /// the first error if any op failed.
    async fn exec(&self, batch: Batch) -> Result<Vec<i64>, StoreError>;
}
