use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::domain::{
    repository::TodoRepository,
    todo::{NewTodo, Todo, TodoId},
};

#[derive(Default)]
struct Table {
    rows: BTreeMap<TodoId, Todo>,
    last_id: u32,
}

/// Process-local repository; ids are never handed out twice.
#[derive(Clone, Default)]
pub struct InMemoryTodoRepository {
    table: Arc<Mutex<Table>>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self { Self::default() }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Table>> {
        self.table.lock().map_err(|_| anyhow!("todo table lock poisoned"))
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn init(&self) -> Result<()> { Ok(()) }

    async fn list(&self) -> Result<Vec<Todo>> { Ok(self.lock()?.rows.values().cloned().collect()) }

    async fn get(&self, id: TodoId) -> Result<Option<Todo>> { Ok(self.lock()?.rows.get(&id).cloned()) }

    async fn insert(&self, input: NewTodo) -> Result<Todo> {
        let mut table = self.lock()?;
        let next = table.last_id.checked_add(1).ok_or_else(|| anyhow!("todo ids exhausted"))?;
        table.last_id = next;
        let todo = Todo { id: TodoId(next), title: input.title, description: input.description, attachments: input.attachments };
        table.rows.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn update(&self, todo: &Todo) -> Result<()> {
        let mut table = self.lock()?;
        table.last_id = table.last_id.max(todo.id.0);
        table.rows.insert(todo.id, todo.clone());
        Ok(())
    }

    async fn delete(&self, id: TodoId) -> Result<bool> { Ok(self.lock()?.rows.remove(&id).is_some()) }
}
