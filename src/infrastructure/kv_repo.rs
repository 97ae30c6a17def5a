use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::ClearScope;
use crate::domain::{
    codec,
    repository::{TodoError, TodoRepository},
    store::{Batch, KeyValueStore, StoreError},
    todo::{ItemId, ItemPatch, NewItem, ToDoItem},
};

/// Counter used to mint item ids.
pub const INDEX_KEY: &str = "index";
/// List of live item ids, in creation order.
pub const KEYS_KEY: &str = "keys";

/// Repository that lays items out in a key-value store: one hash per item
/// keyed by its id, plus the `keys` list enumerating live ids.
#[derive(Clone)]
pub struct KvTodoRepository<S: KeyValueStore> {
    store: S,
    timeout: Duration,
    clear_scope: ClearScope,
}

impl<S: KeyValueStore> KvTodoRepository<S> {
    pub fn new(store: S, timeout: Duration) -> Self {
        Self { store, timeout, clear_scope: ClearScope::Flush }
    }

    pub fn with_clear_scope(mut self, clear_scope: ClearScope) -> Self {
        self.clear_scope = clear_scope;
        self
    }

    pub fn store(&self) -> &S { &self.store }

    /// One store round-trip, bounded by the configured timeout.
    async fn call<T>(&self, op: &'static str, fut: impl Future<Output = Result<T, StoreError>>) -> Result<T, TodoError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(|e| TodoError::store(op, e)),
            Err(_) => Err(TodoError::store(op, StoreError::Unavailable(format!("timed out after {:?}", self.timeout)))),
        }
    }

    async fn fetch(&self, op: &'static str, id: ItemId) -> Result<Option<ToDoItem>, TodoError> {
        let fields = self.call(op, self.store.hgetall(&id.key())).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        codec::from_hash(id, fields).map(Some).map_err(|e| TodoError::Store { op, reason: e.to_string() })
    }

    /// EXEC isolates the batch but does not roll it back: when one command
    /// fails the others still apply. Drops whatever half of a failed create
    /// landed so no hash outlives its key-list entry, or the reverse.
    async fn undo_create(&self, id: ItemId) {
        let batch = Batch::new().del(id.key()).lrem(KEYS_KEY, 1, id.key());
        match self.call("create", self.store.exec(batch)).await {
            Ok(replies) => tracing::warn!(%id, ?replies, "rolled back partially applied create"),
            Err(e) => tracing::warn!(%id, error = %e, "rollback of failed create did not complete"),
        }
    }

    async fn clear_listed(&self) -> Result<(), TodoError> {
        let keys = self.call("clear", self.store.lrange(KEYS_KEY, 0, -1)).await?;
        let batch = keys.iter().fold(Batch::new(), |batch, key| batch.lrem(KEYS_KEY, 1, key.as_str()).del(key.as_str()));
        if !batch.is_empty() {
            self.call("clear", self.store.exec(batch)).await?;
        }
        tracing::info!(removed = keys.len(), "cleared listed todos");
        Ok(())
    }

    async fn flush(&self) -> Result<(), TodoError> {
        self.call("clear", self.store.del(KEYS_KEY)).await?;
        let ack = self.call("clear", self.store.flushdb()).await?;
        if ack != "OK" {
            return Err(TodoError::Store { op: "clear", reason: format!("FLUSHDB answered {ack:?}") });
        }
        tracing::warn!("flushed the entire store database");
        Ok(())
    }
}

#[async_trait]
impl<S: KeyValueStore> TodoRepository for KvTodoRepository<S> {
    async fn create(&self, input: NewItem, base_url: &str) -> Result<ToDoItem, TodoError> {
        let index = self.call("create", self.store.incr(INDEX_KEY)).await?;
        let id = u64::try_from(index).map(ItemId).map_err(|_| TodoError::Store {
            op: "create",
            reason: format!("index counter went negative: {index}"),
        })?;
        let item = ToDoItem {
            id,
            title: input.title,
            completed: input.completed.unwrap_or_default(),
            url: format!("{}/{}", base_url.trim_end_matches('/'), id),
            order: input.order,
        };
        let batch = Batch::new().hset(id.key(), codec::to_hash_fields(&item)).rpush(KEYS_KEY, id.key());
        if let Err(err) = self.call("create", self.store.exec(batch)).await {
            self.undo_create(id).await;
            return Err(err);
        }
        tracing::debug!(%id, "created todo");
        Ok(item)
    }

    async fn list(&self) -> Result<Vec<ToDoItem>, TodoError> {
        let keys = self.call("list", self.store.lrange(KEYS_KEY, 0, -1)).await?;
        let mut items = Vec::with_capacity(keys.len());
        for key in keys {
            let Ok(id) = key.parse::<ItemId>() else {
                tracing::warn!(%key, "skipping non-numeric entry in key list");
                continue;
            };
            match self.fetch("list", id).await? {
                Some(item) => items.push(item),
                // Deleted between LRANGE and HGETALL.
                None => tracing::debug!(%id, "listed todo vanished before it was read"),
            }
        }
        Ok(items)
    }

    async fn get(&self, id: ItemId) -> Result<ToDoItem, TodoError> {
        self.fetch("get", id).await?.ok_or(TodoError::NotFound(id))
    }

    async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<ToDoItem, TodoError> {
        if !patch.is_empty() {
            let fields = codec::patch_hash_fields(&patch);
            let written = self.call("update", self.store.hset_existing(&id.key(), &fields)).await?;
            if written.is_none() {
                return Err(TodoError::NotFound(id));
            }
        }
        self.fetch("update", id).await?.ok_or(TodoError::NotFound(id))
    }

    async fn delete(&self, id: ItemId) -> Result<(), TodoError> {
        let batch = Batch::new().lrem(KEYS_KEY, 1, id.key()).del(id.key());
        let replies = self.call("delete", self.store.exec(batch)).await?;
        match replies.as_slice() {
            [1, 1] => Ok(()),
            [0, 0] => Err(TodoError::NotFound(id)),
            other => {
                tracing::warn!(%id, replies = ?other, "key list and item hash disagreed on delete");
                Err(TodoError::NotFound(id))
            }
        }
    }

    async fn clear(&self) -> Result<(), TodoError> {
        match self.clear_scope {
            ClearScope::Flush => self.flush().await,
            ClearScope::Todos => self.clear_listed().await,
        }
    }

    async fn ping(&self) -> Result<(), TodoError> {
        self.call("ping", self.store.ping()).await
    }
}
