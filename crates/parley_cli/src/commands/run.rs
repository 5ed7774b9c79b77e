//! `parley run`: the bot process.
//!
//! Each generation builds the transport, the completion client and the bot
//! from scratch, so a restart reloads the allow-list and the saved context.
//! A generation ends on Ctrl-C or when a handler reports an error that
//! warrants a restart.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use parley_constant::app;
use parley_llms::{OpenAIConfig, OpenAIProvider};
use parley_observability::ObservabilityConfig;
use parley_runtime::{Bot, BotConfig};
use parley_transport::{incoming_message, TelegramTransport};
use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
use teloxide::types::{Message, Update};
use tokio::sync::Notify;
use tracing::{error, info, warn};

use crate::cli::RunArgs;
use crate::output;

const RESTART_DELAY: Duration = Duration::from_secs(1);

enum Exit {
    Stopped,
    Restart,
}

pub async fn handle(args: RunArgs, verbose: bool) -> Result<()> {
    let mut observability = ObservabilityConfig::from_env().with_version(app::VERSION);
    if verbose && observability.log_level.is_none() {
        observability = observability.with_log_level("debug");
    }
    parley_observability::init(observability)?;

    let config = apply_args(BotConfig::from_env()?, args);
    config.validate()?;

    output::kv("model", &config.model);
    output::kv("admins", &config.admins.join(", "));
    output::kv("users file", &config.users_file.display().to_string());
    output::kv("context file", &config.context_file.display().to_string());

    let result = run_with_restarts(config).await;
    parley_observability::shutdown();
    result
}

fn apply_args(mut config: BotConfig, args: RunArgs) -> BotConfig {
    if let Some(model) = args.model {
        config = config.with_model(model);
    }
    if let Some(size) = args.context_size {
        config = config.with_context_size(size);
    }
    if let Some(path) = args.users_file {
        config = config.with_users_file(path);
    }
    if let Some(path) = args.context_file {
        config = config.with_context_file(path);
    }
    config
}

async fn run_with_restarts(config: BotConfig) -> Result<()> {
    let mut generation = 0u32;
    loop {
        generation += 1;
        match serve(config.clone(), generation).await {
            Ok(Exit::Stopped) => {
                info!("Bot is done");
                return Ok(());
            }
            Ok(Exit::Restart) => warn!(generation, "Restarting after a failed message"),
            Err(e) => error!(generation, error = %e, "Bot crashed, restarting"),
        }
        tokio::time::sleep(RESTART_DELAY).await;
    }
}

async fn serve(config: BotConfig, generation: u32) -> Result<Exit> {
    let transport = TelegramTransport::from_token(config.telegram_token.clone());
    let telegram = transport.bot().clone();
    let provider = OpenAIProvider::new(
        OpenAIConfig::new(config.openai_api_key.clone()).with_model(config.model.clone()),
    )?;
    let bot = Arc::new(Bot::new(config, Arc::new(transport), Arc::new(provider))?);

    if let Err(e) = bot.register_commands().await {
        warn!(error = %e, "Could not register the command menu");
    }

    let restart = Arc::new(Notify::new());
    let restart_requested = Arc::new(AtomicBool::new(false));

    let handler = Update::filter_message().endpoint({
        let bot = Arc::clone(&bot);
        let restart = Arc::clone(&restart);
        let restart_requested = Arc::clone(&restart_requested);
        move |msg: Message| {
            let bot = Arc::clone(&bot);
            let restart = Arc::clone(&restart);
            let restart_requested = Arc::clone(&restart_requested);
            async move {
                if let Err(e) = bot.handle(incoming_message(&msg)).await {
                    error!(chat_id = msg.chat.id.0, error = %e, "Message handling failed");
                    if !restart_requested.swap(true, Ordering::SeqCst) {
                        restart.notify_one();
                    }
                }
                teloxide::respond(())
            }
        }
    });

    let mut dispatcher = Dispatcher::builder(telegram, handler)
        .default_handler(|_| async {})
        .enable_ctrlc_handler()
        .build();

    let shutdown = dispatcher.shutdown_token();
    let watcher = tokio::spawn(async move {
        restart.notified().await;
        if let Ok(stopping) = shutdown.shutdown() {
            stopping.await;
        }
    });

    info!(generation, "Bot started");
    dispatcher.dispatch().await;
    watcher.abort();

    bot.save_context().await;

    if restart_requested.load(Ordering::SeqCst) {
        Ok(Exit::Restart)
    } else {
        Ok(Exit::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_flags_override_env_config() {
        let base = BotConfig::new("tg", "sk").with_model("gpt-4o").with_context_size(10);
        let args = RunArgs {
            model: Some("gpt-4o-mini".into()),
            context_size: Some(4),
            users_file: None,
            context_file: Some(PathBuf::from("/tmp/ctx.json")),
        };

        let config = apply_args(base, args);
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.context_size, 4);
        assert_eq!(config.users_file, PathBuf::from("users.json"));
        assert_eq!(config.context_file, PathBuf::from("/tmp/ctx.json"));
    }

    #[test]
    fn test_empty_args_keep_config() {
        let config = apply_args(BotConfig::new("tg", "sk").with_model("m"), RunArgs::default());
        assert_eq!(config.model, "m");
    }
}
