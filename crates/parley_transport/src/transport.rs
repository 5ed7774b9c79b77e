//! The transport seam and the messages that cross it.

use async_trait::async_trait;

use crate::error::Result;

pub type ChatId = i64;

/// Rich-text flavor requested for an outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupMode {
    MarkdownV2,
    /// Legacy markdown.
    Markdown,
    Plain,
}

impl MarkupMode {
    /// This mode followed by every more forgiving one.
    pub fn cascade(self) -> &'static [MarkupMode] {
        match self {
            MarkupMode::MarkdownV2 => &[MarkupMode::MarkdownV2, MarkupMode::Markdown, MarkupMode::Plain],
            MarkupMode::Markdown => &[MarkupMode::Markdown, MarkupMode::Plain],
            MarkupMode::Plain => &[MarkupMode::Plain],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoSource {
    Url(String),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Typing,
    UploadPhoto,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotCommandSpec {
    /// Command name without the leading slash.
    pub command: String,
    pub description: String,
}

impl BotCommandSpec {
    pub fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandScope {
    Default,
    Chat(ChatId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHandle {
    pub chat_id: ChatId,
    pub message_id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sender {
    pub username: Option<String>,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingContent {
    Text(String),
    /// Largest available size of a photo.
    Photo {
        file_id: String,
        caption: Option<String>,
    },
    Unsupported,
}

/// An inbound message, stripped of transport specifics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub sender: Sender,
    pub content: IncomingContent,
}

impl IncomingMessage {
    pub fn text(chat_id: ChatId, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            sender,
            content: IncomingContent::Text(text.into()),
        }
    }

    pub fn username(&self) -> &str {
        self.sender.username.as_deref().unwrap_or_default()
    }
}

/// Everything the bot needs from a chat platform.
///
/// Implementations do not retry; [`crate::ChunkedDelivery`] does.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_message(&self, chat_id: ChatId, text: &str, mode: MarkupMode) -> Result<MessageHandle>;

    async fn send_photo(&self, chat_id: ChatId, photo: PhotoSource) -> Result<MessageHandle>;

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>>;

    async fn set_command_menu(&self, commands: &[BotCommandSpec], scope: CommandScope) -> Result<()>;

    async fn send_activity(&self, chat_id: ChatId, activity: Activity) -> Result<()>;
}
