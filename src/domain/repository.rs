use async_trait::async_trait;
use thiserror::Error;

use super::store::StoreError;
use super::todo::{ItemId, ItemPatch, NewItem, ToDoItem};

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("todo {0} not found")]
    NotFound(ItemId),
    #[error("{op}: {source}")]
    StoreUnavailable { op: &'static str, source: StoreError },
    #[error("{op}: {reason}")]
    Store { op: &'static str, reason: String },
}

impl TodoError {
    pub fn store(op: &'static str, source: StoreError) -> Self {
        match source {
            StoreError::Unavailable(_) => Self::StoreUnavailable { op, source },
            StoreError::Command(reason) => Self::Store { op, reason },
        }
    }
}

#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn create(&self, input: NewItem, base_url: &str) -> Result<ToDoItem, TodoError>;
    async fn list(&self) -> Result<Vec<ToDoItem>, TodoError>;
    async fn get(&self, id: ItemId) -> Result<ToDoItem, TodoError>;
    async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<ToDoItem, TodoError>;
    async fn delete(&self, id: ItemId) -> Result<(), TodoError>;
    /// Drops every item. Depending on the configured scope this may flush the
    /// whole store database, not only to-do keys.
    async fn clear(&self) -> Result<(), TodoError>;
    async fn ping(&self) -> Result<(), TodoError>;
}
