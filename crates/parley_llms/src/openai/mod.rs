//! OpenAI provider module
//!
//! Chat completions with vision input, and image generation.
//! API docs: https://platform.openai.com/docs/api-reference/chat

mod convert;
mod provider;
mod types;

pub use provider::OpenAIProvider;
pub use types::{OpenAIConfig, OpenAIRequest, OpenAIResponse};
