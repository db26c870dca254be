use thiserror::Error;

use super::storage::StorageError;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("invalid id format")]
    InvalidId,

    #[error("invalid form: {0}")]
    InvalidForm(String),

    #[error("todo not found")]
    NotFound,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to {action}: {source}")]
    Persistence {
        action: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl TodoError {
    pub(crate) fn persistence(action: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| Self::Persistence { action, source }
    }
}
