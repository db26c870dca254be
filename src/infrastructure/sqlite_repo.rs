use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{sqlite::{SqlitePoolOptions, SqliteRow}, Pool, Row, Sqlite};

use crate::domain::{
    repository::TodoRepository,
    todo::{Attachments, NewTodo, Todo, TodoId},
};

#[derive(Clone)]
pub struct SqliteTodoRepository {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteTodoRepository {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = if is_memory_url(database_url) {
            // Every connection to `:memory:` is a separate database; pin one.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(Option::<Duration>::None)
                .max_lifetime(Option::<Duration>::None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = options
            .connect(database_url)
            .await
            .with_context(|| format!("connecting to {database_url}"))?;
        Ok(Self { pool: Arc::new(pool) })
    }
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

/// Create the file (and parent directories) behind a `sqlite://` URL so the
/// pool can open it. In-memory URLs are left alone.
pub fn ensure_database_file(database_url: &str) -> Result<()> {
    if is_memory_url(database_url) {
        return Ok(());
    }
    let Some(rest) = database_url.strip_prefix("sqlite://") else { return Ok(()) };
    let raw = rest.split('?').next().unwrap_or(rest);
    // Windows absolute paths arrive as /C:/...
    let raw = match raw.as_bytes() {
        [b'/', _, b':', ..] if cfg!(windows) => &raw[1..],
        _ => raw,
    };
    let path = Path::new(raw);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("creating {}", path.display()))?;
    }
    Ok(())
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS todos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                attachment TEXT NOT NULL DEFAULT ''
            )",
        )
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Todo>> {
        let rows = sqlx::query("SELECT id, title, description, attachment FROM todos ORDER BY id")
            .fetch_all(&*self.pool)
            .await?;
        rows.into_iter().map(row_to_todo).collect()
    }

    async fn get(&self, id: TodoId) -> Result<Option<Todo>> {
        let row = sqlx::query("SELECT id, title, description, attachment FROM todos WHERE id = ?1")
            .bind(i64::from(id.0))
            .fetch_optional(&*self.pool)
            .await?;
        row.map(row_to_todo).transpose()
    }

    async fn insert(&self, input: NewTodo) -> Result<Todo> {
        let result = sqlx::query("INSERT INTO todos (title, description, attachment) VALUES (?1, ?2, ?3)")
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.attachments.to_column())
            .execute(&*self.pool)
            .await?;
        let id = u32::try_from(result.last_insert_rowid()).context("assigned id out of range")?;
        Ok(Todo { id: TodoId(id), title: input.title, description: input.description, attachments: input.attachments })
    }

    async fn update(&self, todo: &Todo) -> Result<()> {
        sqlx::query(
            "INSERT INTO todos (id, title, description, attachment) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                attachment = excluded.attachment",
        )
        .bind(i64::from(todo.id.0))
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.attachments.to_column())
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: TodoId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?1")
            .bind(i64::from(id.0))
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_todo(row: SqliteRow) -> Result<Todo> {
    let id: i64 = row.try_get("id")?;
    let title: String = row.try_get("title")?;
    let description: String = row.try_get("description")?;
    let attachment: String = row.try_get("attachment")?;

    Ok(Todo {
        id: TodoId(u32::try_from(id).with_context(|| format!("row id {id} out of range"))?),
        title,
        description,
        attachments: Attachments::from_column(&attachment),
    })
}
