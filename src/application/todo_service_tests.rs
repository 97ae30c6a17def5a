#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::super::todo_service::{TodoService, TodoServiceImpl};
    use crate::domain::{
        repository::{TodoError, TodoRepository},
        store::StoreError,
        todo::{ItemId, ItemPatch, NewItem, ToDoItem},
    };
    use crate::infrastructure::{kv_repo::KvTodoRepository, memory_store::MemoryStore};
    use async_trait::async_trait;

    /// Repository whose store is down: every call fails the same way.
    #[derive(Clone, Default)]
    struct UnreachableRepo;

    fn down(op: &'static str) -> TodoError {
        TodoError::store(op, StoreError::Unavailable("connection refused".into()))
    }

    #[async_trait]
    impl TodoRepository for UnreachableRepo {
        async fn create(&self, _input: NewItem, _base_url: &str) -> Result<ToDoItem, TodoError> { Err(down("create")) }
        async fn list(&self) -> Result<Vec<ToDoItem>, TodoError> { Err(down("list")) }
        async fn get(&self, _id: ItemId) -> Result<ToDoItem, TodoError> { Err(down("get")) }
        async fn update(&self, _id: ItemId, _patch: ItemPatch) -> Result<ToDoItem, TodoError> { Err(down("update")) }
        async fn delete(&self, _id: ItemId) -> Result<(), TodoError> { Err(down("delete")) }
        async fn clear(&self) -> Result<(), TodoError> { Err(down("clear")) }
        async fn ping(&self) -> Result<(), TodoError> { Err(down("ping")) }
    }

    fn service() -> TodoServiceImpl<KvTodoRepository<MemoryStore>> {
        TodoServiceImpl::new(KvTodoRepository::new(MemoryStore::new(), Duration::from_secs(1)))
    }

    #[tokio::test]
    async fn unit_create_and_get() {
        let service = service();
        let created = service.create(NewItem::titled("X"), "http://localhost/todo").await.unwrap();
        assert_eq!(created.title, "X");
        assert_eq!(created.url, format!("http://localhost/todo/{}", created.id));
        let got = service.get(created.id).await.unwrap();
        assert_eq!(got, created);
    }

    #[tokio::test]
    async fn unit_clear_then_list_is_empty() {
        let service = service();
        service.create(NewItem::titled("A"), "http://localhost/todo").await.unwrap();
        service.create(NewItem::titled("B"), "http://localhost/todo").await.unwrap();
        service.clear().await.unwrap();
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unit_store_failures_pass_through() {
        let service = TodoServiceImpl::new(UnreachableRepo);
        assert!(matches!(service.list().await, Err(TodoError::StoreUnavailable { op: "list", .. })));
        assert!(matches!(service.delete(ItemId(1)).await, Err(TodoError::StoreUnavailable { op: "delete", .. })));
        assert!(service.health().await.is_err());
    }
}
