//! Reliable delivery of arbitrarily long text.
//!
//! Each slice walks the markup cascade: MarkdownV2 (escaped), legacy
//! Markdown (raw), then plain text. A slice is never dropped because of
//! markup. Every individual send is retried on transient network errors.

use std::sync::Arc;

use parley_constant::defaults;
use parley_core::RetryPolicy;
use tracing::{debug, error, warn};

use crate::chunk::{split, split_fitting};
use crate::error::{Result, TransportError};
use crate::escape::escape_markdown;
use crate::transport::{Activity, ChatId, MarkupMode, MessageHandle, PhotoSource, Transport};

pub struct ChunkedDelivery<T: ?Sized> {
    transport: Arc<T>,
    limit: usize,
    retry: RetryPolicy,
}

impl<T: Transport + ?Sized> ChunkedDelivery<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            limit: defaults::MESSAGE_LIMIT,
            retry: RetryPolicy::delivery(),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Send `text` exactly as given, retrying transient failures only.
    pub async fn send_raw(&self, chat_id: ChatId, text: &str, mode: MarkupMode) -> Result<MessageHandle> {
        let transport = &self.transport;
        let result = self
            .retry
            .run("send_message", || async move {
                transport.send_message(chat_id, text, mode).await
            })
            .await;

        if let Err(TransportError::PayloadTooLarge(ref msg)) = result {
            error!(chat_id, chars = text.chars().count(), error = %msg, "Message exceeded the transport limit");
        }
        result
    }

    pub async fn send_photo(&self, chat_id: ChatId, photo: PhotoSource) -> Result<MessageHandle> {
        let transport = &self.transport;
        let photo = &photo;
        self.retry
            .run("send_photo", || async move {
                transport.send_photo(chat_id, photo.clone()).await
            })
            .await
    }

    /// Chat activity indicators are cosmetic; failures are only logged.
    pub async fn send_activity(&self, chat_id: ChatId, activity: Activity) {
        if let Err(e) = self.transport.send_activity(chat_id, activity).await {
            debug!(chat_id, ?activity, error = %e, "Could not send chat action");
        }
    }

    /// Send `text`, split and downgraded as needed. Returns the last message.
    pub async fn send(&self, chat_id: ChatId, text: &str, mode: MarkupMode) -> Result<MessageHandle> {
        // MarkdownV2 windows are sized by their escaped length.
        let chunks = match mode {
            MarkupMode::MarkdownV2 => split_fitting(text, self.limit, |s| escape_markdown(s).chars().count()),
            MarkupMode::Markdown | MarkupMode::Plain => split(text, self.limit),
        };
        if chunks.len() > 1 {
            debug!(chat_id, chunks = chunks.len(), "Splitting long message");
        }

        let mut last = None;
        for chunk in &chunks {
            last = Some(self.send_slice(chat_id, &chunk.render(), mode).await?);
        }
        last.ok_or_else(|| TransportError::Other("nothing to send".to_string()))
    }

    async fn send_slice(&self, chat_id: ChatId, slice: &str, mode: MarkupMode) -> Result<MessageHandle> {
        let mut last_err = None;
        for &candidate in mode.cascade() {
            let body = match candidate {
                MarkupMode::MarkdownV2 => escape_markdown(slice),
                MarkupMode::Markdown | MarkupMode::Plain => slice.to_string(),
            };

            match self.send_raw(chat_id, &body, candidate).await {
                Ok(handle) => return Ok(handle),
                Err(e @ TransportError::UnparseableMarkup(_)) if candidate != MarkupMode::Plain => {
                    warn!(chat_id, mode = ?candidate, error = %e, "Markup rejected, downgrading");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| TransportError::Other("no markup mode left".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::RecordingTransport;
    use std::time::Duration;

    fn delivery(transport: &Arc<RecordingTransport>) -> ChunkedDelivery<RecordingTransport> {
        ChunkedDelivery::new(transport.clone()).with_retry(RetryPolicy::new(5, Duration::from_millis(1)))
    }

    #[tokio::test]
    async fn test_short_message_goes_out_as_markdown_v2() {
        let transport = Arc::new(RecordingTransport::default());
        delivery(&transport).send(1, "Hello.", MarkupMode::MarkdownV2).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, r"Hello\.");
        assert_eq!(sent[0].mode, MarkupMode::MarkdownV2);
    }

    #[tokio::test]
    async fn test_plain_mode_is_not_escaped() {
        let transport = Arc::new(RecordingTransport::default());
        delivery(&transport).send(1, "a.b", MarkupMode::Plain).await.unwrap();
        assert_eq!(transport.sent()[0].text, "a.b");
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let transport = Arc::new(RecordingTransport::default());
        transport.fail_next(TransportError::TransientNetwork("reset".into()));
        transport.fail_next(TransportError::TransientNetwork("reset".into()));

        delivery(&transport).send(1, "hi", MarkupMode::Plain).await.unwrap();
        assert_eq!(transport.attempts(), 3);
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_transient_errors_give_up_after_five_attempts() {
        let transport = Arc::new(RecordingTransport::default());
        for _ in 0..5 {
            transport.fail_next(TransportError::TransientNetwork("reset".into()));
        }

        let err = delivery(&transport).send(1, "hi", MarkupMode::Plain).await.unwrap_err();
        assert!(matches!(err, TransportError::TransientNetwork(_)));
        assert_eq!(transport.attempts(), 5);
    }

    #[tokio::test]
    async fn test_markup_cascade_downgrades_once_per_mode() {
        let transport = Arc::new(RecordingTransport::default());
        transport.fail_next(TransportError::UnparseableMarkup("v2".into()));
        transport.fail_next(TransportError::UnparseableMarkup("v1".into()));

        delivery(&transport).send(1, "x_y", MarkupMode::MarkdownV2).await.unwrap();

        assert_eq!(transport.attempts(), 3);
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].mode, MarkupMode::Plain);
        assert_eq!(sent[0].text, "x_y");
    }

    #[tokio::test]
    async fn test_payload_too_large_is_not_retried() {
        let transport = Arc::new(RecordingTransport::default());
        transport.fail_next(TransportError::PayloadTooLarge("too long".into()));

        let err = delivery(&transport).send(1, "hi", MarkupMode::MarkdownV2).await.unwrap_err();
        assert!(matches!(err, TransportError::PayloadTooLarge(_)));
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn test_long_prose_stays_markdown_v2() {
        let transport = Arc::new(RecordingTransport::default());
        let text = "This is a normal sentence, with a period. ".repeat(120);
        assert!(text.chars().count() > 5000);

        delivery(&transport).send(1, &text, MarkupMode::MarkdownV2).await.unwrap();

        let sent = transport.sent();
        assert!(sent.len() >= 2);
        assert_eq!(transport.attempts(), sent.len());
        for msg in &sent {
            assert_eq!(msg.mode, MarkupMode::MarkdownV2);
            assert!(msg.text.chars().count() <= 4096);
        }
        let unescaped: String = sent.iter().map(|m| m.text.replace('\\', "")).collect();
        assert_eq!(unescaped, text);
    }

    #[tokio::test]
    async fn test_escaped_dots_fit_each_slice() {
        let transport = Arc::new(RecordingTransport::default());
        // 4000 dots fit raw but double once escaped.
        let text = ".".repeat(4000);
        delivery(&transport).send(1, &text, MarkupMode::MarkdownV2).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|m| m.mode == MarkupMode::MarkdownV2));
        assert!(sent.iter().all(|m| m.text.chars().count() <= 4096));
    }

    #[tokio::test]
    async fn test_long_message_is_sent_in_order() {
        let transport = Arc::new(RecordingTransport::default());
        let text = format!("{}{}", "a".repeat(4090), "b".repeat(100));
        delivery(&transport).send(1, &text, MarkupMode::Plain).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].text.chars().all(|c| c == 'a'));
        assert!(sent[1].text.chars().all(|c| c == 'b'));
    }
}
