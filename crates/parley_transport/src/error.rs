use parley_core::Retryable;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection resets, timeouts, flood control. Worth retrying.
    #[error("transient network error: {0}")]
    TransientNetwork(String),

    /// The server rejected the message's rich-text entities.
    #[error("can't parse message markup: {0}")]
    UnparseableMarkup(String),

    #[error("message is too long: {0}")]
    PayloadTooLarge(String),

    #[error("transport error: {0}")]
    Other(String),
}

impl Retryable for TransportError {
    fn is_transient(&self) -> bool {
        matches!(self, TransportError::TransientNetwork(_))
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
