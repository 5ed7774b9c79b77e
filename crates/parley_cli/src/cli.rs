//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Personal Telegram chatbot backed by an LLM completion API
#[derive(Parser)]
#[command(name = "parley", about, version, propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level unless PARLEY_LOG or RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format: text (human-readable) or json (machine-readable)
    #[arg(short, long, global = true, default_value = "text")]
    pub output: OutputFormat,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Colored terminal output for humans
    #[default]
    Text,
    /// Structured JSON for scripts
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the bot, restarting it after unexpected failures
    Run(RunArgs),
    /// Inspect and edit the allow-list without running the bot
    Users {
        #[command(subcommand)]
        action: UsersAction,
        /// Allow-list file. Uses PARLEY_USERS_FILE or users.json if not set.
        #[arg(long, global = true)]
        users_file: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Chat model (e.g. gpt-4o). Uses PARLEY_MODEL if not set.
    #[arg(long)]
    pub model: Option<String>,
    /// Stored exchanges per chat. Uses PARLEY_CONTEXT_SIZE if not set.
    #[arg(long)]
    pub context_size: Option<usize>,
    /// Allow-list file. Uses PARLEY_USERS_FILE if not set.
    #[arg(long)]
    pub users_file: Option<PathBuf>,
    /// Conversation context file. Uses PARLEY_CONTEXT_FILE if not set.
    #[arg(long)]
    pub context_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// List users with access
    List,
    /// Give users access
    Grant {
        /// Usernames, with or without a leading @
        #[arg(required = true)]
        usernames: Vec<String>,
    },
    /// Take access away from users. Admins are kept.
    Revoke {
        /// Usernames, with or without a leading @
        #[arg(required = true)]
        usernames: Vec<String>,
    },
}
