//! Runtime error types

use parley_core::{CoreError, WindowError};
use parley_transport::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Completion failed: {0}")]
    Completion(#[from] parley_llms::Error),

    #[error("Delivery failed: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Window(#[from] WindowError),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
