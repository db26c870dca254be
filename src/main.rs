use todo_api::application::todo_service::TodoServiceImpl;
use todo_api::config::AppConfig;
use todo_api::domain::repository::TodoRepository;
use todo_api::http::routing::{self, todos, HttpLimits};
use todo_api::infrastructure::sqlite_repo::{self, SqliteTodoRepository};
use todo_api::infrastructure::storage::{self, StorageConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env()?;

    sqlite_repo::ensure_database_file(&config.database_url)?;
    let repo = SqliteTodoRepository::connect(&config.database_url).await?;
    repo.init().await?;

    let store = storage::create_store(&config.storage)?;
    tracing::info!(backend = config.storage.backend_name(), "object storage ready");

    let service = TodoServiceImpl::new(repo, store);
    let mut router = todos::router(todos::AppState { service });
    if let StorageConfig::Local { dir, .. } = &config.storage {
        router = router.merge(routing::files(dir));
    }
    let app = routing::app(router, HttpLimits::from(&config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
}
