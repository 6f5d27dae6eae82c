use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebDriverError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webdriver error [{error}]: {message}")]
    Protocol { error: String, message: String },

    #[error("timed out after {timeout:?} waiting for {what}")]
    WaitTimeout {
        what: String,
        timeout: std::time::Duration,
    },

    #[error("unexpected response shape: {0}")]
    Decode(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WebDriverError>;
