#[cfg(test)]
mod tests {
    use super::super::todo_service::{TodoService, TodoServiceImpl};
    use crate::domain::{
        error::TodoError,
        repository::TodoRepository,
        storage::{ObjectStore, StorageError},
        todo::{Attachments, NewTodo, Todo, TodoId, TodoInput, Upload},
    };
    use crate::infrastructure::{
        memory_repo::InMemoryTodoRepository, sqlite_repo::SqliteTodoRepository, storage::InMemoryObjectStore,
    };
    use anyhow::Result;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    };

    /// Counts calls and can be told to fail writes.
    #[derive(Clone, Default)]
    struct TestRepo {
        inner: InMemoryTodoRepository,
        calls: Arc<AtomicUsize>,
        fail_writes: Arc<AtomicBool>,
    }

    impl TestRepo {
        fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

        fn touch(&self) { self.calls.fetch_add(1, Ordering::SeqCst); }

        fn check_write(&self) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) { anyhow::bail!("database is locked") }
            Ok(())
        }
    }

    #[async_trait]
    impl TodoRepository for TestRepo {
        async fn init(&self) -> Result<()> { Ok(()) }
        async fn list(&self) -> Result<Vec<Todo>> { self.touch(); self.inner.list().await }
        async fn get(&self, id: TodoId) -> Result<Option<Todo>> { self.touch(); self.inner.get(id).await }
        async fn insert(&self, input: NewTodo) -> Result<Todo> { self.touch(); self.check_write()?; self.inner.insert(input).await }
        async fn update(&self, todo: &Todo) -> Result<()> { self.touch(); self.check_write()?; self.inner.update(todo).await }
        async fn delete(&self, id: TodoId) -> Result<bool> { self.touch(); self.check_write()?; self.inner.delete(id).await }
    }

    /// Records every call and fails on demand.
    #[derive(Default)]
    struct RecordingStore {
        inner: InMemoryObjectStore,
        uploads: Mutex<Vec<String>>,
        deletes: Mutex<Vec<String>>,
        fail_upload_of: Mutex<Option<String>>,
        fail_deletes: AtomicBool,
    }

    impl RecordingStore {
        fn uploads(&self) -> Vec<String> { self.uploads.lock().unwrap().clone() }
        fn deletes(&self) -> Vec<String> { self.deletes.lock().unwrap().clone() }
        fn fail_upload_of(&self, key: &str) { *self.fail_upload_of.lock().unwrap() = Some(key.to_string()); }
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn upload(&self, key: &str, data: Bytes) -> Result<String, StorageError> {
            self.uploads.lock().unwrap().push(key.to_string());
            if self.fail_upload_of.lock().unwrap().as_deref() == Some(key) {
                return Err(StorageError::Upload { key: key.to_string(), reason: "503 slow down".into() });
            }
            self.inner.upload(key, data).await
        }

        async fn delete(&self, key: &str) -> Result<(), StorageError> {
            self.deletes.lock().unwrap().push(key.to_string());
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(StorageError::Delete { key: key.to_string(), reason: "access denied".into() });
            }
            self.inner.delete(key).await
        }
    }

    fn setup() -> (TodoServiceImpl<TestRepo>, TestRepo, Arc<RecordingStore>) {
        let repo = TestRepo::default();
        let store = Arc::new(RecordingStore::default());
        let service = TodoServiceImpl::new(repo.clone(), store.clone());
        (service, repo, store)
    }

    fn input(title: &str, files: &[&str]) -> TodoInput {
        TodoInput {
            title: title.into(),
            description: format!("{title} details"),
            files: files
                .iter()
                .map(|name| Upload { filename: name.to_string(), content: Bytes::from(format!("content of {name}")) })
                .collect(),
        }
    }

    #[tokio::test]
    async fn unit_create_and_get() {
        let (service, _, _) = setup();
        let created = service.create(input("X", &[])).await.unwrap();
        assert_eq!(created.title, "X");
        let got = service.get(&created.id.to_string()).await.unwrap();
        assert_eq!(got, created);
    }

    #[tokio::test]
    async fn create_without_files_skips_storage() {
        let (service, repo, store) = setup();
        let created = service.create(input("Buy milk", &[])).await.unwrap();
        assert!(store.uploads().is_empty());
        let stored = repo.inner.get(created.id).await.unwrap().unwrap();
        assert_eq!(stored.attachments.to_column(), "");
    }

    #[tokio::test]
    async fn create_keeps_file_order() {
        let (service, _, store) = setup();
        let created = service.create(input("t", &["c.txt", "a.png", "b.pdf"])).await.unwrap();
        assert_eq!(
            created.attachments.to_column(),
            "memory://attachments/c.txt,memory://attachments/a.png,memory://attachments/b.pdf"
        );
        assert_eq!(store.uploads(), ["c.txt", "a.png", "b.pdf"]);
        assert_eq!(&store.inner.get("a.png").unwrap()[..], b"content of a.png");
    }

    #[tokio::test]
    async fn failed_upload_aborts_create_and_leaves_earlier_files() {
        let (service, repo, store) = setup();
        store.fail_upload_of("b.png");
        let err = service.create(input("t", &["a.png", "b.png", "c.png"])).await.unwrap_err();
        assert!(matches!(err, TodoError::Storage(StorageError::Upload { .. })));
        assert_eq!(store.uploads(), ["a.png", "b.png"]);
        assert_eq!(store.inner.keys(), ["a.png"]);
        assert!(repo.inner.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_insert_orphans_uploads() {
        let (service, repo, store) = setup();
        repo.fail_writes.store(true, Ordering::SeqCst);
        let err = service.create(input("t", &["a.png"])).await.unwrap_err();
        assert!(matches!(err, TodoError::Persistence { action: "create todo", .. }));
        assert_eq!(store.inner.keys(), ["a.png"]);
    }

    #[tokio::test]
    async fn malformed_ids_never_reach_the_store() {
        let (service, repo, _) = setup();
        for raw in ["abc", "-1", "1.5", "", "4294967296"] {
            assert!(matches!(service.get(raw).await, Err(TodoError::InvalidId)), "get {raw:?}");
            assert!(matches!(service.update(raw, input("t", &[])).await, Err(TodoError::InvalidId)), "update {raw:?}");
        }
        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let (service, _, _) = setup();
        assert!(matches!(service.get("999").await, Err(TodoError::NotFound)));
        assert!(matches!(service.update("999", input("t", &[])).await, Err(TodoError::NotFound)));
        assert!(matches!(service.delete("999").await, Err(TodoError::NotFound)));
        assert!(matches!(service.delete("abc").await, Err(TodoError::NotFound)));
    }

    #[tokio::test]
    async fn update_without_files_keeps_attachments() {
        let (service, _, store) = setup();
        let created = service.create(input("t", &["a.png"])).await.unwrap();
        let updated = service.update(&created.id.to_string(), input("renamed", &[])).await.unwrap();
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.description, "renamed details");
        assert_eq!(updated.attachments, created.attachments);
        assert!(store.deletes().is_empty());
        assert_eq!(service.get(&created.id.to_string()).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn update_with_files_replaces_attachments() {
        let (service, _, store) = setup();
        let created = service.create(input("t", &["a.png", "b.png"])).await.unwrap();
        let updated = service.update(&created.id.to_string(), input("t", &["receipt.png"])).await.unwrap();
        assert_eq!(updated.attachments.urls(), ["memory://attachments/receipt.png"]);
        assert_eq!(store.deletes(), ["a.png", "b.png"]);
        assert_eq!(store.inner.keys(), ["receipt.png"]);
    }

    #[tokio::test]
    async fn update_tolerates_failed_old_file_deletion() {
        let (service, _, store) = setup();
        let created = service.create(input("t", &["a.png"])).await.unwrap();
        store.fail_deletes.store(true, Ordering::SeqCst);
        let updated = service.update(&created.id.to_string(), input("t", &["b.png"])).await.unwrap();
        assert_eq!(updated.attachments.urls(), ["memory://attachments/b.png"]);
        assert_eq!(store.inner.keys(), ["a.png", "b.png"]);
    }

    #[tokio::test]
    async fn failed_upload_during_update_persists_nothing() {
        let (service, _, store) = setup();
        let created = service.create(input("t", &["a.png"])).await.unwrap();
        store.fail_upload_of("b.png");
        let err = service.update(&created.id.to_string(), input("new", &["b.png"])).await.unwrap_err();
        assert!(matches!(err, TodoError::Storage(_)));
        assert_eq!(service.get(&created.id.to_string()).await.unwrap(), created);
    }

    #[tokio::test]
    async fn delete_removes_row_and_files() {
        let (service, _, store) = setup();
        let created = service.create(input("t", &["a.png", "b.png"])).await.unwrap();
        let id = created.id.to_string();
        service.delete(&id).await.unwrap();
        assert_eq!(store.deletes(), ["a.png", "b.png"]);
        assert!(store.inner.keys().is_empty());
        assert!(matches!(service.get(&id).await, Err(TodoError::NotFound)));
        assert!(matches!(service.delete(&id).await, Err(TodoError::NotFound)));
    }

    #[tokio::test]
    async fn delete_tolerates_failed_file_deletion() {
        let (service, _, store) = setup();
        let created = service.create(input("t", &["a.png"])).await.unwrap();
        store.fail_deletes.store(true, Ordering::SeqCst);
        service.delete(&created.id.to_string()).await.unwrap();
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_reports_persistence_failures() {
        #[derive(Clone)]
        struct BrokenRepo;

        #[async_trait]
        impl TodoRepository for BrokenRepo {
            async fn init(&self) -> Result<()> { Ok(()) }
            async fn list(&self) -> Result<Vec<Todo>> { anyhow::bail!("no such table: todos") }
            async fn get(&self, _: TodoId) -> Result<Option<Todo>> { anyhow::bail!("no such table: todos") }
            async fn insert(&self, _: NewTodo) -> Result<Todo> { anyhow::bail!("no such table: todos") }
            async fn update(&self, _: &Todo) -> Result<()> { anyhow::bail!("no such table: todos") }
            async fn delete(&self, _: TodoId) -> Result<bool> { anyhow::bail!("no such table: todos") }
        }

        let service = TodoServiceImpl::new(BrokenRepo, Arc::new(InMemoryObjectStore::default()));
        assert!(matches!(service.list().await, Err(TodoError::Persistence { action: "fetch todos", .. })));
        assert!(matches!(service.get("1").await, Err(TodoError::Persistence { .. })));
    }

    #[tokio::test]
    async fn ids_keep_increasing_after_delete() {
        let (service, _, _) = setup();
        let first = service.create(input("a", &[])).await.unwrap();
        service.delete(&first.id.to_string()).await.unwrap();
        let second = service.create(input("b", &[])).await.unwrap();
        assert!(second.id > first.id);
        assert_eq!(second.attachments, Attachments::default());
    }

    #[tokio::test]
    async fn failed_update_write_reports_persistence() {
        let (service, repo, _) = setup();
        let created = service.create(input("t", &[])).await.unwrap();
        repo.fail_writes.store(true, Ordering::SeqCst);
        let err = service.update(&created.id.to_string(), input("renamed", &[])).await.unwrap_err();
        assert!(matches!(err, TodoError::Persistence { action: "update todo", .. }));
        assert_eq!(repo.inner.get(created.id).await.unwrap().unwrap(), created);
    }

    #[tokio::test]
    async fn failed_delete_write_keeps_the_row() {
        let (service, repo, _) = setup();
        let created = service.create(input("t", &[])).await.unwrap();
        repo.fail_writes.store(true, Ordering::SeqCst);
        let err = service.delete(&created.id.to_string()).await.unwrap_err();
        assert!(matches!(err, TodoError::Persistence { action: "delete todo", .. }));
        assert_eq!(repo.inner.get(created.id).await.unwrap().unwrap(), created);
    }

    async fn sqlite_setup() -> (TodoServiceImpl<SqliteTodoRepository>, InMemoryObjectStore) {
        let repo = SqliteTodoRepository::connect("sqlite::memory:").await.unwrap();
        repo.init().await.unwrap();
        let store = InMemoryObjectStore::default();
        (TodoServiceImpl::new(repo, Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn comma_in_filename_is_rejected_before_upload() {
        let (service, store) = sqlite_setup().await;
        let other = service.create(input("other", &["b.png"])).await.unwrap();

        let err = service.create(input("t", &["a,b.png"])).await.unwrap_err();
        assert!(matches!(err, TodoError::InvalidForm(_)));
        let err = service.update(&other.id.to_string(), input("t", &["ok.png", "a,b.png"])).await.unwrap_err();
        assert!(matches!(err, TodoError::InvalidForm(_)));

        assert_eq!(store.keys(), ["b.png"]);
        assert_eq!(service.list().await.unwrap(), [other.clone()]);
        assert_eq!(service.get(&other.id.to_string()).await.unwrap().attachments.urls(), ["memory://attachments/b.png"]);
    }

    #[tokio::test]
    async fn attachments_survive_the_sqlite_column() {
        let (service, store) = sqlite_setup().await;
        let keep = service.create(input("keep", &["b.png"])).await.unwrap();
        let created = service.create(input("t", &["a.png", "c d.pdf"])).await.unwrap();
        let id = created.id.to_string();
        assert_eq!(service.get(&id).await.unwrap(), created);

        service.delete(&id).await.unwrap();
        assert_eq!(store.keys(), ["b.png"]);
        assert_eq!(service.get(&keep.id.to_string()).await.unwrap(), keep);
    }
}
