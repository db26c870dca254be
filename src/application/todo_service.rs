use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::error::TodoError;
use crate::domain::repository::TodoRepository;
use crate::domain::storage::ObjectStore;
use crate::domain::todo::{Attachments, NewTodo, Todo, TodoId, TodoInput, Upload};

#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    async fn list(&self) -> Result<Vec<Todo>, TodoError>;
    async fn get(&self, id: &str) -> Result<Todo, TodoError>;
    async fn create(&self, input: TodoInput) -> Result<Todo, TodoError>;
    async fn update(&self, id: &str, input: TodoInput) -> Result<Todo, TodoError>;
    async fn delete(&self, id: &str) -> Result<(), TodoError>;
}

#[derive(Clone)]
pub struct TodoServiceImpl<R: TodoRepository> {
    repo: R,
    store: Arc<dyn ObjectStore>,
}

impl<R: TodoRepository> TodoServiceImpl<R> {
    pub fn new(repo: R, store: Arc<dyn ObjectStore>) -> Self { Self { repo, store } }

    async fn find(&self, id: TodoId) -> Result<Todo, TodoError> {
        self.repo
            .get(id)
            .await
            .map_err(TodoError::persistence("fetch todo"))?
            .ok_or(TodoError::NotFound)
    }

    /// Uploads sequentially; the first failure aborts without cleaning up
    /// files already written for this request.
    async fn upload_all(&self, files: Vec<Upload>) -> Result<Attachments, TodoError> {
        let mut urls = Vec::with_capacity(files.len());
        for file in files {
            let url = self
                .store
                .upload(&file.filename, file.content)
                .await
                .inspect_err(|e| tracing::error!(error = %e, "attachment upload failed"))?;
            urls.push(url);
        }
        Ok(Attachments::new(urls))
    }

    /// Best-effort removal; failures are logged and swallowed.
    async fn remove_all(&self, todo: &Todo) {
        for key in todo.attachments.storage_keys() {
            if let Err(e) = self.store.delete(key).await {
                tracing::warn!(id = %todo.id, key, error = %e, "stale attachment left in storage");
            }
        }
    }
}

fn parse_id(raw: &str) -> Result<TodoId, TodoError> { raw.parse().map_err(|_| TodoError::InvalidId) }

/// The attachment column is comma-joined, so a key holding `,` would split
/// into other keys on the way back out.
fn check_filenames(files: &[Upload]) -> Result<(), TodoError> {
    match files.iter().find(|f| f.filename.contains(',')) {
        Some(file) => Err(TodoError::InvalidForm(format!("file name may not contain ',': {:?}", file.filename))),
        None => Ok(()),
    }
}

#[async_trait]
impl<R: TodoRepository> TodoService for TodoServiceImpl<R> {
    async fn list(&self) -> Result<Vec<Todo>, TodoError> {
        self.repo.list().await.map_err(TodoError::persistence("fetch todos"))
    }

    async fn get(&self, id: &str) -> Result<Todo, TodoError> { self.find(parse_id(id)?).await }

    async fn create(&self, input: TodoInput) -> Result<Todo, TodoError> {
        check_filenames(&input.files)?;
        let attachments = self.upload_all(input.files).await?;
        let todo = self
            .repo
            .insert(NewTodo { title: input.title, description: input.description, attachments })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "insert failed after uploads");
                TodoError::Persistence { action: "create todo", source: e }
            })?;
        tracing::info!(id = %todo.id, attachments = todo.attachments.len(), "todo created");
        Ok(todo)
    }

    async fn update(&self, id: &str, input: TodoInput) -> Result<Todo, TodoError> {
        let mut todo = self.find(parse_id(id)?).await?;
        check_filenames(&input.files)?;

        if !input.files.is_empty() {
            self.remove_all(&todo).await;
            todo.attachments = self.upload_all(input.files).await?;
        }
        todo.title = input.title;
        todo.description = input.description;

        self.repo.update(&todo).await.map_err(|e| {
            tracing::error!(id = %todo.id, error = %e, "update failed");
            TodoError::Persistence { action: "update todo", source: e }
        })?;
        tracing::info!(id = %todo.id, attachments = todo.attachments.len(), "todo updated");
        Ok(todo)
    }

    async fn delete(&self, id: &str) -> Result<(), TodoError> {
        // No row can carry an unparseable id.
        let id = parse_id(id).map_err(|_| TodoError::NotFound)?;
        let todo = self.find(id).await?;

        self.remove_all(&todo).await;
        let deleted = self.repo.delete(id).await.map_err(TodoError::persistence("delete todo"))?;
        if !deleted {
            return Err(TodoError::NotFound);
        }
        tracing::info!(%id, "todo deleted");
        Ok(())
    }
}
