//! Model conversation.

use std::time::Instant;

use parley_constant::defaults::IMAGE_REQUEST_MARKER;
use parley_core::{ensure_jpeg, ImageAttachment, ImageDetail, Turn};
use parley_llms::ChatRequest;
use parley_transport::{Activity, IncomingContent, IncomingMessage, MarkupMode};
use tracing::{debug, info};

use crate::error::Result;

use super::{Bot, BotState};

const HIGH_DETAIL_FLAGS: [&str; 2] = ["-h", "--high"];

impl Bot {
    /// Answer a text or photo message with a completion.
    ///
    /// The exchange is stored before the reply is delivered. A reply that
    /// asks for an image is routed to image generation instead of the chat.
    pub(super) async fn chat(&self, state: &mut BotState, message: &IncomingMessage) -> Result<()> {
        let chat_id = message.chat_id;
        self.delivery.send_activity(chat_id, Activity::Typing).await;

        let (prompt, image) = match &message.content {
            IncomingContent::Text(text) => (text.trim().to_string(), None),
            IncomingContent::Photo { file_id, caption } => {
                let (prompt, detail) = photo_prompt(caption.as_deref().unwrap_or_default());
                let bytes = self.delivery.transport().download_file(file_id).await?;
                let jpeg = ensure_jpeg(bytes)?;
                debug!(chat_id, bytes = jpeg.len(), detail = detail.as_str(), "Attached photo");
                (prompt, Some(ImageAttachment::from_jpeg(&jpeg, detail)))
            }
            IncomingContent::Unsupported => return Ok(()),
        };

        let key = chat_id.to_string();
        let stored_turn = Turn::user().with_text(prompt);
        let new_turn = match image {
            Some(image) => stored_turn.clone().with_image(image),
            None => stored_turn.clone(),
        };

        let system = self.persona.system_turn(Some(&message.sender.full_name));
        let prepared = self.window.prepare(system, state.store.get(&key), new_turn)?;

        let start = Instant::now();
        let reply = self
            .client
            .chat_complete(ChatRequest::new(prepared.messages, prepared.max_response_tokens))
            .await?;
        info!(
            chat_id,
            provider = self.client.provider_id(),
            prompt_tokens = prepared.prompt_tokens,
            total_tokens = reply.total_tokens,
            trimmed = prepared.trimmed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Completion received"
        );

        state.usage.record_tokens(message.username(), reply.total_tokens);
        state
            .store
            .append(&key, stored_turn, Turn::assistant().with_text(reply.text.clone()));

        if let Some(image_prompt) = image_request(&reply.text) {
            info!(chat_id, "Model asked for an image");
            return self.generate_image(state, message, &image_prompt).await;
        }

        self.delivery.send(chat_id, &reply.text, MarkupMode::MarkdownV2).await?;
        Ok(())
    }
}

/// Split a photo caption into the prompt and the requested detail.
///
/// `-h` and `--high` select high detail when they appear as whole words.
fn photo_prompt(caption: &str) -> (String, ImageDetail) {
    let mut detail = ImageDetail::Low;
    let words: Vec<&str> = caption
        .split_whitespace()
        .filter(|word| {
            let flag = HIGH_DETAIL_FLAGS.contains(word);
            if flag {
                detail = ImageDetail::High;
            }
            !flag
        })
        .collect();
    (words.join(" "), detail)
}

/// Image prompt carried by a reply that starts with the request marker.
fn image_request(reply: &str) -> Option<String> {
    let rest = reply.trim_start().strip_prefix(IMAGE_REQUEST_MARKER)?;
    let rest = rest.strip_prefix(':').unwrap_or(rest);
    Some(rest.trim().to_string())
}
