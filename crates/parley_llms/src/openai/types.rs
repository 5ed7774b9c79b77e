//! OpenAI-specific types

use std::time::Duration;

use parley_constant::defaults;
use serde::{Deserialize, Serialize};

/// Configuration for the OpenAI provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    /// Base URL (default: https://api.openai.com/v1/)
    pub base_url: String,
    pub model: String,
    pub image_model: String,
    pub image_size: u32,
    pub image_quality: String,
    pub temperature: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub timeout: Duration,
}

impl OpenAIConfig {
    pub const API_KEY_ENV: &'static str = "OPENAI_API_KEY";
    pub const BASE_URL_ENV: &'static str = "OPENAI_BASE_URL";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1/".to_string(),
            model: defaults::CHAT_MODEL.to_string(),
            image_model: defaults::IMAGE_MODEL.to_string(),
            image_size: defaults::IMAGE_SIZE,
            image_quality: defaults::IMAGE_QUALITY.to_string(),
            temperature: defaults::TEMPERATURE,
            frequency_penalty: defaults::FREQUENCY_PENALTY,
            presence_penalty: defaults::PRESENCE_PENALTY,
            timeout: Duration::from_secs(defaults::COMPLETION_TIMEOUT_SECS),
        }
    }

    /// Read `OPENAI_API_KEY` and, if set, `OPENAI_BASE_URL`.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var(Self::API_KEY_ENV).ok().filter(|k| !k.is_empty())?;
        let config = Self::new(api_key);
        Some(match std::env::var(Self::BASE_URL_ENV) {
            Ok(url) if !url.is_empty() => config.with_base_url(url),
            _ => config,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut url = base_url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        self.base_url = url;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Chat completion request body
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    pub model: String,
    pub messages: Vec<OpenAIMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OpenAIMessage {
    pub role: String,
    pub content: OpenAIContent,
}

/// Plain text for text-only turns, a part list once an image is attached.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum OpenAIContent {
    Text(String),
    Parts(Vec<OpenAIContentPart>),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpenAIContentPart {
    Text { text: String },
    ImageUrl { image_url: OpenAIImageUrl },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OpenAIImageUrl {
    pub url: String,
    pub detail: String,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
    #[serde(default)]
    pub usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIUsage {
    pub total_tokens: u64,
}

/// Image generation request body
#[derive(Debug, Serialize)]
pub struct OpenAIImageRequest {
    pub model: String,
    pub prompt: String,
    pub n: u32,
    pub size: String,
    pub quality: String,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIImageResponse {
    pub data: Vec<OpenAIImageData>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIImageData {
    #[serde(default)]
    pub url: Option<String>,
}

/// `{"error": {...}}` envelope returned with non-2xx statuses
#[derive(Debug, Deserialize)]
pub struct OpenAIErrorResponse {
    pub error: OpenAIErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIErrorBody {
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}
