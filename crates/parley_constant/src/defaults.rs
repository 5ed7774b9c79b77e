//! Default limits and file names.
//!
//! These mirror the budgets of the completion model the bot was tuned for
//! and Telegram's message size limit. Every value can be overridden through
//! `BotConfig`.

/// Chat model used for completions.
pub const CHAT_MODEL: &str = "gpt-4o";
/// Image generation model.
pub const IMAGE_MODEL: &str = "dall-e-3";
/// Side length of generated square images.
pub const IMAGE_SIZE: u32 = 1024;
pub const IMAGE_QUALITY: &str = "hd";

/// Hard ceiling on prompt tokens before trimming kicks in.
pub const INPUT_TOKEN_CEILING: usize = 2048;
/// Model context window (prompt + response).
pub const TOTAL_TOKEN_CEILING: usize = 4096;
/// Response tokens requested when the prompt fits.
pub const MAX_RESPONSE_TOKENS: usize = 2048;
/// Stored exchanges per chat (one pair is reserved for the pending turn).
pub const CONTEXT_SIZE: usize = 10;

pub const TEMPERATURE: f32 = 0.6;
pub const FREQUENCY_PENALTY: f32 = 0.1;
pub const PRESENCE_PENALTY: f32 = 0.1;

pub const COMPLETION_TIMEOUT_SECS: u64 = 60;
pub const COMPLETION_ATTEMPTS: u32 = 3;
pub const DELIVERY_ATTEMPTS: u32 = 5;
pub const RETRY_DELAY_MS: u64 = 500;

/// Telegram's single-message limit, in characters.
pub const MESSAGE_LIMIT: usize = 4096;

pub const USERS_FILE: &str = "users.json";
pub const CONTEXT_FILE: &str = "context.json";

/// Reply prefix the persona uses to ask for an image.
pub const IMAGE_REQUEST_MARKER: &str = "IMAGE_REQUESTED_123";
