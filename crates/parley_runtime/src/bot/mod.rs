//! The bot: one inbound message in, replies out.
//!
//! Split into focused submodules:
//! - **chat**: model conversation, photo prompts and the image-request marker
//! - **image**: `/image` and image generation
//! - **context**: `/context`, `/context_length`, `/clear_context`
//! - **admin**: allow-list management and usage reports
//!
//! All mutable state sits behind one async mutex that is held for the whole
//! handling of a message, so messages are processed one at a time.

mod admin;
mod chat;
mod context;
mod image;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use parley_core::{
    AllowList, ContextStore, ContextWindow, RetryPolicy, TokenCounter, UsageLedger, WindowError,
};
use parley_llms::CompletionClient;
use parley_observability::{chat_span, record_duration, record_error};
use parley_transport::{
    Activity, ChatId, ChunkedDelivery, CommandScope, IncomingContent, IncomingMessage, MarkupMode,
    Transport,
};
use tokio::sync::Mutex;
use tracing::{info, warn, Instrument};

use crate::commands::{Command, CommandTable, Route};
use crate::config::BotConfig;
use crate::error::{Result, RuntimeError};
use crate::persona::Persona;

/// Everything a message handler may change.
pub struct BotState {
    pub store: ContextStore,
    pub usage: UsageLedger,
    pub access: AllowList,
    /// Chats where the admin command menu is already installed.
    admin_menu_chats: HashSet<ChatId>,
}

impl BotState {
    /// Restore persisted context and the allow-list. Never fails; unreadable
    /// files are logged and replaced with empty defaults.
    pub fn load(config: &BotConfig) -> Self {
        Self {
            store: ContextStore::load(&config.context_file, config.context_size),
            usage: UsageLedger::new(),
            access: AllowList::open(&config.users_file, config.admins.clone()),
            admin_menu_chats: HashSet::new(),
        }
    }
}

pub struct Bot {
    config: BotConfig,
    persona: Persona,
    delivery: ChunkedDelivery<dyn Transport>,
    client: Arc<dyn CompletionClient>,
    window: ContextWindow,
    commands: CommandTable,
    state: Mutex<BotState>,
}

impl Bot {
    pub fn new(
        config: BotConfig,
        transport: Arc<dyn Transport>,
        client: Arc<dyn CompletionClient>,
    ) -> Result<Self> {
        let persona = match &config.persona {
            Some(text) => Persona::custom(text.clone()),
            None => Persona::new(&config.bot_name),
        };
        let window = ContextWindow::new(TokenCounter::new()?, config.budget);
        let delivery = ChunkedDelivery::new(transport).with_limit(config.message_limit);
        let state = Mutex::new(BotState::load(&config));

        Ok(Self {
            config,
            persona,
            delivery,
            client,
            window,
            commands: CommandTable::new(),
            state,
        })
    }

    pub fn with_delivery_retry(mut self, retry: RetryPolicy) -> Self {
        self.delivery = self.delivery.with_retry(retry);
        self
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn state(&self) -> &Mutex<BotState> {
        &self.state
    }

    /// Install the public command menu for every chat.
    pub async fn register_commands(&self) -> Result<()> {
        self.delivery
            .transport()
            .set_command_menu(&self.commands.public_menu(), CommandScope::Default)
            .await?;
        info!("Registered command menu");
        Ok(())
    }

    /// Persist conversation context. Failures are logged, never fatal.
    pub async fn save_context(&self) {
        let state = self.state.lock().await;
        match state.store.save(&self.config.context_file) {
            Ok(()) => info!(
                path = %self.config.context_file.display(),
                chats = state.store.chat_count(),
                "Saved conversation context"
            ),
            Err(e) => warn!(
                path = %self.config.context_file.display(),
                error = %e,
                "Failed to save conversation context"
            ),
        }
    }

    /// Handle one inbound message.
    ///
    /// Expected failures (rate limits, rejected prompts, oversized messages)
    /// are answered in the chat and return `Ok`. An `Err` means a non-admin
    /// hit an unexpected error; the caller should restart with reloaded state.
    pub async fn handle(&self, message: IncomingMessage) -> Result<()> {
        let span = chat_span!(message.chat_id, message_kind(&message.content));
        async {
            let start = Instant::now();
            let result = self.dispatch(&message).await;
            record_duration("completion.duration_ms", start.elapsed());
            if let Err(e) = &result {
                record_error(e);
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, message: &IncomingMessage) -> Result<()> {
        let mut state = self.state.lock().await;
        let chat_id = message.chat_id;
        let username = message.username();
        let is_admin = state.access.is_admin(username);

        if is_admin && !state.admin_menu_chats.contains(&chat_id) {
            let scope = CommandScope::Chat(chat_id);
            match self
                .delivery
                .transport()
                .set_command_menu(&self.commands.admin_menu(), scope)
                .await
            {
                Ok(()) => {
                    state.admin_menu_chats.insert(chat_id);
                }
                Err(e) => warn!(chat_id, error = %e, "Could not install the admin command menu"),
            }
        }

        if !state.access.contains(username) {
            info!(chat_id, username, "Rejected message from user without access");
            let reply = format!(
                "You don't have access to {}. Ask @{} to grant you access.",
                self.config.bot_name,
                self.config.operator()
            );
            self.reply(chat_id, &reply).await?;
            return Ok(());
        }

        let outcome = match self.commands.route(message, is_admin) {
            Route::Chat => self.chat(&mut state, message).await,
            Route::Command(command, args) => {
                self.run_command(&mut state, message, command, &args).await
            }
            Route::Unknown(token) => {
                self.delivery.send_activity(chat_id, Activity::Typing).await;
                self.reply(chat_id, &format!("Command {token} is invalid")).await
            }
            Route::Ignore => Ok(()),
        };

        match outcome {
            Ok(()) => Ok(()),
            Err(e) => self.recover(chat_id, is_admin, e).await,
        }
    }

    async fn run_command(
        &self,
        state: &mut BotState,
        message: &IncomingMessage,
        command: Command,
        args: &str,
    ) -> Result<()> {
        match command {
            Command::Context => self.show_context(state, message).await,
            Command::ContextLength => self.context_length(state, message).await,
            Command::ClearContext => self.clear_context(state, message).await,
            Command::Image => self.generate_image(state, message, args).await,
            Command::Grant => self.grant(state, message, args).await,
            Command::Revoke => self.revoke(state, message, args).await,
            Command::ListUsers => self.list_users(state, message).await,
            Command::TokenUsage => self.token_usage(state, message).await,
            Command::ImageUsage => self.image_usage(state, message).await,
        }
    }

    /// Turn a handler failure into a chat reply.
    ///
    /// Only unexpected errors seen by non-admins propagate.
    async fn recover(&self, chat_id: ChatId, is_admin: bool, err: RuntimeError) -> Result<()> {
        let report = match &err {
            RuntimeError::Completion(parley_llms::Error::RateLimited { quota_exhausted, .. }) => {
                warn!(chat_id, error = %err, "Completion API rate limited");
                Some(if is_admin {
                    (
                        format!("OpenAI servers are overloaded. Try again later. \nException:\n```{err}```"),
                        MarkupMode::Markdown,
                    )
                } else if *quota_exhausted {
                    (
                        format!("{} is unavailable at the moment. Try again later.", self.config.bot_name),
                        MarkupMode::Plain,
                    )
                } else {
                    (
                        "OpenAI servers are overloaded. Try again later.".to_string(),
                        MarkupMode::Plain,
                    )
                })
            }
            RuntimeError::Window(WindowError::BudgetExhausted { prompt_tokens, .. }) => {
                warn!(chat_id, prompt_tokens, "Message does not fit the model window");
                Some((
                    "Your message is too long. Try sending a shorter one.".to_string(),
                    MarkupMode::Plain,
                ))
            }
            _ if is_admin => Some((
                format!("An error has occurred: Exception:\n```{err}\n{err:?}```"),
                MarkupMode::Markdown,
            )),
            _ => None,
        };

        let Some((text, mode)) = report else {
            let text = format!(
                "An error has occurred. Try clearing the context and try again. If the issue persists contact @{}",
                self.config.operator()
            );
            if let Err(e) = self.delivery.send(chat_id, &text, MarkupMode::Plain).await {
                warn!(chat_id, error = %e, "Could not report the failure to the user");
            }
            return Err(err);
        };

        if let Err(e) = self.delivery.send(chat_id, &text, mode).await {
            warn!(chat_id, error = %e, original = %err, "Could not report the failure to the user");
        }
        Ok(())
    }

    async fn reply(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.delivery.send(chat_id, text, MarkupMode::Plain).await?;
        Ok(())
    }
}

fn message_kind(content: &IncomingContent) -> &'static str {
    match content {
        IncomingContent::Text(text) if text.trim_start().starts_with('/') => "command",
        IncomingContent::Text(_) => "text",
        IncomingContent::Photo { .. } => "photo",
        IncomingContent::Unsupported => "unsupported",
    }
}
