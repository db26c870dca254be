use async_trait::async_trait;
use super::todo::{NewTodo, Todo, TodoId};

/// Row storage for todos.
#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn init(&self) -> anyhow::Result<()>;
    async fn list(&self) -> anyhow::Result<Vec<Todo>>;
    async fn get(&self, id: TodoId) -> anyhow::Result<Option<Todo>>;
    async fn insert(&self, input: NewTodo) -> anyhow::Result<Todo>;
    /// Upsert by id.
    async fn update(&self, todo: &Todo) -> anyhow::Result<()>;
    /// Returns `false` when no row had that id.
    async fn delete(&self, id: TodoId) -> anyhow::Result<bool>;
}
