//! Application metadata constants

pub const NAME: &str = "parley";
pub const DISPLAY_NAME: &str = "Parley";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = "Personal Telegram chatbot backed by an LLM completion API";

/// Directory name for parley data within the user's home
pub const DATA_DIR: &str = ".parley";
/// Env file inside DATA_DIR, loaded before flags are parsed
pub const ENV_FILE: &str = "env";
