use thiserror::Error;

pub type Result<T> = std::result::Result<T, ForumError>;

#[derive(Debug, Error)]
pub enum ForumError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ForumError {
    fn from(err: reqwest::Error) -> Self {
        ForumError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ForumError {
    fn from(err: serde_json::Error) -> Self {
        ForumError::Parse(err.to_string())
    }
}
