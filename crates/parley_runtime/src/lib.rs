//! parley_runtime: the chatbot itself.
//!
//! [`Bot`] receives transport-neutral [`parley_transport::IncomingMessage`]s,
//! checks the allow-list, routes commands through the [`CommandTable`], and
//! talks to the model through a [`parley_llms::CompletionClient`].

pub mod bot;
pub mod commands;
pub mod config;
pub mod error;
pub mod persona;

#[cfg(test)]
mod tests;

pub use bot::{Bot, BotState};
pub use commands::{Command, CommandTable, Route};
pub use config::BotConfig;
pub use error::{Result, RuntimeError};
pub use persona::Persona;
