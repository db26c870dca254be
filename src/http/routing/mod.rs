pub mod todos;

use std::path::Path;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use http::StatusCode;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use super::types::ApiError;
use crate::config::AppConfig;

#[derive(Debug, Clone, Copy)]
pub struct HttpLimits {
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl Default for HttpLimits {
    fn default() -> Self { Self { request_timeout: Duration::from_secs(30), max_upload_bytes: 10 * 1024 * 1024 } }
}

impl From<&AppConfig> for HttpLimits {
    fn from(config: &AppConfig) -> Self {
        Self { request_timeout: config.request_timeout, max_upload_bytes: config.max_upload_bytes }
    }
}

pub fn app(router: Router, limits: HttpLimits) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(router)
        .layer(DefaultBodyLimit::max(limits.max_upload_bytes))
        .layer(TimeoutLayer::new(limits.request_timeout))
        .layer(middleware::map_response(timeout_body))
        .layer(TraceLayer::new_for_http())
}

/// `TimeoutLayer` answers 408 with an empty body; give it the usual error shape.
async fn timeout_body(res: Response) -> Response {
    if res.status() != StatusCode::REQUEST_TIMEOUT {
        return res;
    }
    ApiError { status: StatusCode::REQUEST_TIMEOUT, message: "Request timed out".into() }.into_response()
}

/// Serves a local attachment directory under `/files`.
pub fn files(dir: impl AsRef<Path>) -> Router { Router::new().nest_service("/files", ServeDir::new(dir)) }
