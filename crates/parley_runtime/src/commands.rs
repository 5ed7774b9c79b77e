//! Command table and message routing.
//!
//! Commands match on the exact first token of a text message. A trailing
//! `@botname` on that token is ignored. Admin commands are only visible to
//! admins; for everyone else they are unknown.

use parley_transport::{BotCommandSpec, IncomingContent, IncomingMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Context,
    ContextLength,
    ClearContext,
    Image,
    Grant,
    Revoke,
    ListUsers,
    TokenUsage,
    ImageUsage,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    name: &'static str,
    description: &'static str,
    command: Command,
}

const PUBLIC: &[Entry] = &[
    Entry {
        name: "context",
        description: "Gets the current context.",
        command: Command::Context,
    },
    Entry {
        name: "context_length",
        description: "Gets the current context length.",
        command: Command::ContextLength,
    },
    Entry {
        name: "clear_context",
        description: "Clears the current context.",
        command: Command::ClearContext,
    },
    Entry {
        name: "image",
        description: "Generates an image based on the user's prompt.",
        command: Command::Image,
    },
];

const ADMIN: &[Entry] = &[
    Entry {
        name: "grant",
        description: "Grants access to a user. (Admin Only) Usage: /grant <username>",
        command: Command::Grant,
    },
    Entry {
        name: "revoke",
        description: "Revokes access to a user. (Admin Only) Usage: /revoke <username>",
        command: Command::Revoke,
    },
    Entry {
        name: "list_users",
        description: "Lists current allowed users. (Admin Only)",
        command: Command::ListUsers,
    },
    Entry {
        name: "token_usage",
        description: "Get general token usage by username",
        command: Command::TokenUsage,
    },
    Entry {
        name: "image_usage",
        description: "Get general image usage by username",
        command: Command::ImageUsage,
    },
];

/// Where an incoming message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// A known command and the text after it.
    Command(Command, String),
    /// A slash-prefixed token matching no visible command.
    Unknown(String),
    /// Free text or a photo, answered by the model.
    Chat,
    /// Content the bot does not handle.
    Ignore,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommandTable;

impl CommandTable {
    pub fn new() -> Self {
        Self
    }

    /// Menu shown to every user.
    pub fn public_menu(&self) -> Vec<BotCommandSpec> {
        menu(PUBLIC.iter())
    }

    /// Menu shown in an admin's chat: admin commands first, then the public ones.
    pub fn admin_menu(&self) -> Vec<BotCommandSpec> {
        menu(ADMIN.iter().chain(PUBLIC.iter()))
    }

    pub fn lookup(&self, name: &str, is_admin: bool) -> Option<Command> {
        let found = |table: &[Entry]| table.iter().find(|e| e.name == name).map(|e| e.command);
        found(PUBLIC).or_else(|| if is_admin { found(ADMIN) } else { None })
    }

    pub fn route(&self, message: &IncomingMessage, is_admin: bool) -> Route {
        let text = match &message.content {
            IncomingContent::Text(text) => text.trim(),
            IncomingContent::Photo { .. } => return Route::Chat,
            IncomingContent::Unsupported => return Route::Ignore,
        };

        if !text.starts_with('/') {
            return Route::Chat;
        }

        let (token, rest) = match text.split_once(char::is_whitespace) {
            Some((token, rest)) => (token, rest.trim()),
            None => (text, ""),
        };
        let name = token[1..].split('@').next().unwrap_or_default();

        match self.lookup(name, is_admin) {
            Some(command) => Route::Command(command, rest.to_string()),
            None => Route::Unknown(token.to_string()),
        }
    }
}

fn menu<'a>(entries: impl Iterator<Item = &'a Entry>) -> Vec<BotCommandSpec> {
    entries
        .map(|e| BotCommandSpec::new(e.name, e.description))
        .collect()
}
