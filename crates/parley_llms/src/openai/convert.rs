//! Conversion between parley turns and OpenAI wire types

use parley_core::{ContentBlock, Turn};
use reqwest::StatusCode;

use super::types::{
    OpenAIConfig, OpenAIContent, OpenAIContentPart, OpenAIErrorResponse, OpenAIImageRequest,
    OpenAIImageUrl, OpenAIMessage, OpenAIRequest, OpenAIResponse,
};
use crate::client::{ChatReply, ChatRequest};
use crate::error::{Error, Result};

pub fn to_openai_request(config: &OpenAIConfig, req: &ChatRequest) -> OpenAIRequest {
    OpenAIRequest {
        model: config.model.clone(),
        messages: req.messages.iter().map(to_openai_message).collect(),
        max_tokens: u32::try_from(req.max_tokens).unwrap_or(u32::MAX),
        temperature: config.temperature,
        frequency_penalty: config.frequency_penalty,
        presence_penalty: config.presence_penalty,
    }
}

pub fn to_openai_image_request(config: &OpenAIConfig, prompt: &str) -> OpenAIImageRequest {
    OpenAIImageRequest {
        model: config.image_model.clone(),
        prompt: prompt.to_string(),
        n: 1,
        size: format!("{0}x{0}", config.image_size),
        quality: config.image_quality.clone(),
    }
}

fn to_openai_message(turn: &Turn) -> OpenAIMessage {
    let content = if turn.has_image() {
        OpenAIContent::Parts(
            turn.blocks
                .iter()
                .map(|block| match block {
                    ContentBlock::Text { text } => OpenAIContentPart::Text { text: text.clone() },
                    ContentBlock::Image { image } => OpenAIContentPart::ImageUrl {
                        image_url: OpenAIImageUrl {
                            url: image.data_url.clone(),
                            detail: image.detail.as_str().to_string(),
                        },
                    },
                })
                .collect(),
        )
    } else {
        OpenAIContent::Text(turn.text())
    };

    OpenAIMessage {
        role: turn.role.as_str().to_string(),
        content,
    }
}

/// Whitespace-only content counts as no reply.
pub fn from_openai_response(resp: OpenAIResponse) -> Result<ChatReply> {
    let text = resp
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(Error::EmptyReply)?;

    Ok(ChatReply {
        text,
        total_tokens: resp.usage.map(|u| u.total_tokens).unwrap_or(0),
    })
}

/// Map a non-2xx response to a typed error.
pub fn map_http_error(status: StatusCode, body: &str) -> Error {
    let parsed = serde_json::from_str::<OpenAIErrorResponse>(body).ok();
    let message = parsed
        .as_ref()
        .map(|wrapper| wrapper.error.message.clone())
        .unwrap_or_else(|| body.to_string());
    let code = parsed
        .as_ref()
        .and_then(|w| w.error.code.clone().or_else(|| w.error.kind.clone()))
        .unwrap_or_default();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Error::RateLimited {
            quota_exhausted: code == "insufficient_quota" || body.contains("insufficient_quota"),
            message,
        };
    }

    let lowered = message.to_lowercase();
    if code == "content_policy_violation"
        || lowered.contains("safety system")
        || lowered.contains("content filter")
    {
        return Error::ContentPolicy(message);
    }

    Error::Api {
        status: status.as_u16(),
        message,
    }
}
