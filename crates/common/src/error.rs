use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bar source error: {0}")]
    Source(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("Unsupported model type '{0}' (supported: linear)")]
    UnsupportedModel(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
