//! parley_llms: completion client seam and the OpenAI provider.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use parley_llms::{ChatRequest, CompletionClient, OpenAIProvider};
//! use parley_core::Turn;
//!
//! # async fn run() -> parley_llms::Result<()> {
//! let provider = OpenAIProvider::from_env()?;
//! let reply = provider
//!     .chat_complete(ChatRequest::new(vec![Turn::user().with_text("hi")], 256))
//!     .await?;
//! println!("{}", reply.text);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod openai;


pub use client::{ChatReply, ChatRequest, CompletionClient};
pub use error::{Error, Result};
pub use openai::{OpenAIConfig, OpenAIProvider};
