use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModwatchError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Staging error: {0}")]
    Staging(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
