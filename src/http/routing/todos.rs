use axum::{extract::{Path, State}, routing::get, Router, Json};
use http::StatusCode;
use serde_json::{json, Value};

use crate::application::todo_service::TodoService;
use crate::domain::todo::Todo;
use crate::http::{form::TodoForm, types::ApiError};

#[derive(Clone)]
pub struct AppState<S: TodoService> { pub service: S }

pub fn router<S: TodoService + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/todos", get(list_todos::<S>).post(create_todo::<S>))
        .route("/todos/:id", get(get_todo::<S>).put(update_todo::<S>).delete(delete_todo::<S>))
        .with_state(state)
}

async fn list_todos<S: TodoService>(State(state): State<AppState<S>>) -> Result<Json<Vec<Todo>>, ApiError> {
    Ok(Json(state.service.list().await?))
}

async fn get_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.service.get(&id).await?))
}

async fn create_todo<S: TodoService>(State(state): State<AppState<S>>, TodoForm(input): TodoForm) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let todo = state.service.create(input).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    form: Result<TodoForm, ApiError>,
) -> Result<Json<Todo>, ApiError> {
    let TodoForm(input) = match form {
        Ok(form) => form,
        Err(rejection) => {
            // A bad id or a missing todo is reported ahead of a bad body.
            state.service.get(&id).await?;
            return Err(rejection);
        }
    };
    Ok(Json(state.service.update(&id, input).await?))
}

async fn delete_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    state.service.delete(&id).await?;
    Ok(Json(json!({ "message": "Todo deleted" })))
}
