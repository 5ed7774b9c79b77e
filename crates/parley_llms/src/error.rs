//! Completion client errors

use parley_core::Retryable;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// HTTP 429. `quota_exhausted` is set when the account is out of credit
    /// rather than momentarily throttled.
    #[error("rate limited: {message}")]
    RateLimited {
        quota_exhausted: bool,
        message: String,
    },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    /// The request was rejected by the provider's safety system.
    #[error("content policy violation: {0}")]
    ContentPolicy(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("completion returned no content")]
    EmptyReply,

    #[error("missing API key")]
    MissingApiKey,

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }
}

impl Retryable for Error {
    fn is_transient(&self) -> bool {
        match self {
            Error::Timeout | Error::Network(_) | Error::EmptyReply => true,
            Error::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_connect() || err.is_request() || err.is_body() {
            Error::Network(err.to_string())
        } else if err.is_decode() {
            Error::Other(format!("failed to decode response: {err}"))
        } else {
            Error::Other(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_kinds() {
        assert!(Error::Timeout.is_transient());
        assert!(Error::Network("reset".into()).is_transient());
        assert!(Error::EmptyReply.is_transient());
        assert!(Error::Api { status: 503, message: "down".into() }.is_transient());
    }

    #[test]
    fn test_permanent_kinds() {
        let limited = Error::RateLimited {
            quota_exhausted: false,
            message: "slow down".into(),
        };
        assert!(!limited.is_transient());
        assert!(limited.is_rate_limited());
        assert!(!Error::ContentPolicy("nope".into()).is_transient());
        assert!(!Error::Api { status: 400, message: "bad".into() }.is_transient());
    }

    #[test]
    fn test_display() {
        let err = Error::Api {
            status: 401,
            message: "invalid key".into(),
        };
        assert_eq!(err.to_string(), "API error 401: invalid key");
    }
}
