//! Span helpers

/// Span covering the handling of one inbound chat message.
///
/// Declares the fields [`record_error`] and [`record_duration`] fill in.
///
/// ```rust
/// use parley_observability::chat_span;
///
/// let span = chat_span!(42_i64, "chat");
/// let _guard = span.enter();
/// ```
#[macro_export]
macro_rules! chat_span {
    ($chat_id:expr, $kind:expr) => {
        tracing::info_span!(
            "chat.message",
            chat.id = $chat_id,
            message.kind = $kind,
            completion.duration_ms = tracing::field::Empty,
            error = tracing::field::Empty,
            error.message = tracing::field::Empty,
        )
    };
}

/// Mark the current span as failed and log the error.
pub fn record_error<E: std::error::Error>(error: &E) {
    let span = tracing::Span::current();
    span.record("error", true);
    span.record("error.message", error.to_string());
    tracing::error!(error = %error, "Operation failed");
}

/// Record a duration in milliseconds on the current span.
pub fn record_duration(key: &str, duration: std::time::Duration) {
    let span = tracing::Span::current();
    span.record(key, duration.as_millis() as u64);
}
