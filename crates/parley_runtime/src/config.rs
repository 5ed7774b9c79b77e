//! Bot configuration

use std::path::PathBuf;

use parley_constant::{app, defaults};
use parley_core::TokenBudget;

use crate::error::{Result, RuntimeError};

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram_token: String,
    pub openai_api_key: String,
    /// Chat completion model
    pub model: String,
    /// Usernames (without `@`) allowed to run admin commands
    pub admins: Vec<String>,
    /// Username shown to users as the person to contact. Defaults to the first admin.
    pub operator: Option<String>,
    /// Name the bot goes by in the persona and in `/context`
    pub bot_name: String,
    /// Replaces the built-in persona instructions
    pub persona: Option<String>,
    /// Stored exchanges per chat, one of which is reserved for the pending turn
    pub context_size: usize,
    pub budget: TokenBudget,
    pub message_limit: usize,
    pub users_file: PathBuf,
    pub context_file: PathBuf,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            telegram_token: String::new(),
            openai_api_key: String::new(),
            model: defaults::CHAT_MODEL.to_string(),
            admins: Vec::new(),
            operator: None,
            bot_name: app::DISPLAY_NAME.to_string(),
            persona: None,
            context_size: defaults::CONTEXT_SIZE,
            budget: TokenBudget::default(),
            message_limit: defaults::MESSAGE_LIMIT,
            users_file: PathBuf::from(defaults::USERS_FILE),
            context_file: PathBuf::from(defaults::CONTEXT_FILE),
        }
    }
}

impl BotConfig {
    pub fn new(telegram_token: impl Into<String>, openai_api_key: impl Into<String>) -> Self {
        Self {
            telegram_token: telegram_token.into(),
            openai_api_key: openai_api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_admins<I, S>(mut self, admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.admins = parse_usernames(admins);
        self
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into().trim_start_matches('@').to_string());
        self
    }

    pub fn with_bot_name(mut self, name: impl Into<String>) -> Self {
        self.bot_name = name.into();
        self
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    pub fn with_context_size(mut self, size: usize) -> Self {
        self.context_size = size;
        self
    }

    pub fn with_budget(mut self, budget: TokenBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_users_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.users_file = path.into();
        self
    }

    pub fn with_context_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.context_file = path.into();
        self
    }

    /// The contact named in error and access-denied messages.
    pub fn operator(&self) -> &str {
        self.operator
            .as_deref()
            .or_else(|| self.admins.first().map(String::as_str))
            .unwrap_or("the bot owner")
    }

    /// Load configuration from environment variables
    ///
    /// Unset variables keep their defaults. Unparseable numbers are reported
    /// as configuration errors.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(token) = env("TELEGRAM_BOT_TOKEN") {
            config.telegram_token = token;
        }
        if let Some(key) = env("OPENAI_API_KEY") {
            config.openai_api_key = key;
        }
        if let Some(model) = env("PARLEY_MODEL") {
            config.model = model;
        }
        if let Some(admins) = env("PARLEY_ADMINS") {
            config.admins = parse_usernames(admins.split(','));
        }
        if let Some(operator) = env("PARLEY_OPERATOR") {
            config = config.with_operator(operator);
        }
        if let Some(name) = env("PARLEY_BOT_NAME") {
            config.bot_name = name;
        }
        if let Some(persona) = env("PARLEY_PERSONA") {
            config.persona = Some(persona);
        }
        if let Some(size) = env("PARLEY_CONTEXT_SIZE") {
            config.context_size = parse_number("PARLEY_CONTEXT_SIZE", &size)?;
        }
        if let Some(ceiling) = env("PARLEY_INPUT_TOKEN_CEILING") {
            config.budget.input_ceiling = parse_number("PARLEY_INPUT_TOKEN_CEILING", &ceiling)?;
        }
        if let Some(ceiling) = env("PARLEY_TOTAL_TOKEN_CEILING") {
            config.budget.total_ceiling = parse_number("PARLEY_TOTAL_TOKEN_CEILING", &ceiling)?;
        }
        if let Some(max) = env("PARLEY_MAX_RESPONSE_TOKENS") {
            config.budget.max_response_tokens = parse_number("PARLEY_MAX_RESPONSE_TOKENS", &max)?;
        }
        if let Some(path) = env("PARLEY_USERS_FILE") {
            config.users_file = PathBuf::from(path);
        }
        if let Some(path) = env("PARLEY_CONTEXT_FILE") {
            config.context_file = PathBuf::from(path);
        }

        Ok(config)
    }

    /// Check that the bot can actually start.
    pub fn validate(&self) -> Result<()> {
        if self.telegram_token.is_empty() {
            return Err(RuntimeError::Config("TELEGRAM_BOT_TOKEN is not set".into()));
        }
        if self.openai_api_key.is_empty() {
            return Err(RuntimeError::Config("OPENAI_API_KEY is not set".into()));
        }
        if self.admins.is_empty() {
            return Err(RuntimeError::Config(
                "at least one admin is required (PARLEY_ADMINS)".into(),
            ));
        }
        if self.context_size < 2 {
            return Err(RuntimeError::Config("context size must be at least 2".into()));
        }
        if self.budget.input_ceiling > self.budget.total_ceiling {
            return Err(RuntimeError::Config(
                "input token ceiling exceeds the total token ceiling".into(),
            ));
        }
        Ok(())
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_number(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| RuntimeError::Config(format!("{key} must be a number, got '{value}'")))
}

fn parse_usernames<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| n.as_ref().trim().trim_start_matches('@').to_string())
        .filter(|n| !n.is_empty())
        .collect()
}
