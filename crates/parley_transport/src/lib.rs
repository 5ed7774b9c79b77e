//! parley_transport: getting replies to the user.
//!
//! The [`Transport`] trait is the seam to a chat platform. [`ChunkedDelivery`]
//! sits on top of it and handles size limits, fence balancing, markup
//! downgrades and retries. [`TelegramTransport`] is the production adapter.

pub mod chunk;
pub mod delivery;
pub mod error;
pub mod escape;
pub mod telegram;
pub mod transport;

#[cfg(test)]
mod tests;

pub use chunk::{split, Chunk};
pub use delivery::ChunkedDelivery;
pub use error::{Result, TransportError};
pub use escape::escape_markdown;
pub use telegram::{incoming_message, TelegramTransport};
pub use transport::{
    Activity, BotCommandSpec, ChatId, CommandScope, IncomingContent, IncomingMessage, MarkupMode,
    MessageHandle, PhotoSource, Sender, Transport,
};
