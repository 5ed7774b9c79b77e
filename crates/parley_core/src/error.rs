use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("image error: {0}")]
    Image(String),

    #[error("persistence error at {path}: {message}")]
    Persistence { path: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
