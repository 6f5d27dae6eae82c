use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("unrecognized stage: {0}")]
    InvalidStage(String),

    #[error("unparseable due time: {0}")]
    InvalidDueTime(String),

    #[error("config not found: {0}")]
    ConfigNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
