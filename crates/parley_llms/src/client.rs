//! The completion client seam.

use async_trait::async_trait;
use parley_core::Turn;

use crate::error::Result;

/// One chat completion call.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<Turn>,
    pub max_tokens: usize,
}

impl ChatRequest {
    pub fn new(messages: Vec<Turn>, max_tokens: usize) -> Self {
        Self { messages, max_tokens }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    /// Prompt plus completion tokens, as billed by the provider.
    pub total_tokens: u64,
}

/// Chat and image completions.
///
/// Implementations own their retry behavior; callers see only the final
/// outcome.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    fn provider_id(&self) -> &str;

    async fn chat_complete(&self, request: ChatRequest) -> Result<ChatReply>;

    /// Generate one image and return its URL.
    async fn generate_image(&self, prompt: &str) -> Result<String>;
}
