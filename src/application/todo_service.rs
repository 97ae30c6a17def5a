use crate::domain::repository::{TodoError, TodoRepository};
use crate::domain::todo::{ItemId, ItemPatch, NewItem, ToDoItem};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, TodoError>;

#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    async fn create(&self, input: NewItem, base_url: &str) -> Result<ToDoItem>;
    async fn get(&self, id: ItemId) -> Result<ToDoItem>;
    async fn list(&self) -> Result<Vec<ToDoItem>>;
    async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<ToDoItem>;
    async fn delete(&self, id: ItemId) -> Result<()>;
    async fn clear(&self) -> Result<()>;
    async fn health(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct TodoServiceImpl<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }
}

/// Store failures are logged here, once, with the operation that hit them.
/// Not-found outcomes stay at debug level.
fn log_failure<T>(op: &'static str, id: Option<ItemId>, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        match err {
            TodoError::NotFound(_) => tracing::debug!(op, ?id, error = %err, "todo request rejected"),
            TodoError::StoreUnavailable { .. } | TodoError::Store { .. } => tracing::error!(op, ?id, error = %err, "todo store operation failed"),
        }
    }
    result
}

#[async_trait]
impl<R: TodoRepository> TodoService for TodoServiceImpl<R> {
    async fn create(&self, input: NewItem, base_url: &str) -> Result<ToDoItem> { log_failure("create", None, self.repo.create(input, base_url).await) }
    async fn get(&self, id: ItemId) -> Result<ToDoItem> { log_failure("get", Some(id), self.repo.get(id).await) }
    async fn list(&self) -> Result<Vec<ToDoItem>> { log_failure("list", None, self.repo.list().await) }
    async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<ToDoItem> { log_failure("update", Some(id), self.repo.update(id, patch).await) }
    async fn delete(&self, id: ItemId) -> Result<()> { log_failure("delete", Some(id), self.repo.delete(id).await) }
    async fn clear(&self) -> Result<()> { log_failure("clear", None, self.repo.clear().await) }
    async fn health(&self) -> Result<()> { log_failure("ping", None, self.repo.ping().await) }
}
