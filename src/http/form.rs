use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    Json,
};
use bytes::Bytes;
use http::header;
use serde::Deserialize;

use super::types::ApiError;
use crate::domain::{error::TodoError, todo::{TodoInput, Upload}};

/// Create/update body, accepted as `multipart/form-data` (`title`,
/// `description`, any number of `files` parts) or as JSON without files.
#[derive(Debug)]
pub struct TodoForm(pub TodoInput);

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonBody {
    title: String,
    description: String,
}

#[async_trait]
impl<S> FromRequest<S> for TodoForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state).await.map_err(invalid)?;
            Ok(Self(read_multipart(multipart).await?))
        } else if content_type.starts_with("application/json") {
            let Json(body) = Json::<JsonBody>::from_request(req, state).await.map_err(invalid)?;
            Ok(Self(TodoInput { title: body.title, description: body.description, files: Vec::new() }))
        } else {
            Err(TodoError::InvalidForm(format!("unsupported content type {content_type:?}")).into())
        }
    }
}

fn invalid(e: impl std::fmt::Display) -> TodoError { TodoError::InvalidForm(e.to_string()) }

async fn read_multipart(mut multipart: Multipart) -> Result<TodoInput, TodoError> {
    let mut input = TodoInput::default();
    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "title" => input.title = field.text().await.map_err(invalid)?,
            "description" => input.description = field.text().await.map_err(invalid)?,
            "files" => {
                let filename = field.file_name().unwrap_or_default().to_owned();
                let content = field.bytes().await.map_err(invalid)?;
                if let Some(upload) = to_upload(&filename, content)? {
                    input.files.push(upload);
                }
            }
            _ => {}
        }
    }
    Ok(input)
}

/// Browsers send an empty, unnamed part when no file was picked; that is skipped.
fn to_upload(raw_name: &str, content: Bytes) -> Result<Option<Upload>, TodoError> {
    if raw_name.is_empty() && content.is_empty() {
        return Ok(None);
    }
    let filename = base_name(raw_name);
    if filename.is_empty() || filename == "." || filename == ".." {
        return Err(TodoError::InvalidForm(format!("file part has no usable name: {raw_name:?}")));
    }
    Ok(Some(Upload { filename: filename.to_owned(), content }))
}

fn base_name(raw: &str) -> &str { raw.rsplit(['/', '\\']).next().unwrap_or(raw) }
