//! Telegram transport backed by teloxide.

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{
    BotCommand, BotCommandScope, ChatAction, InputFile, ParseMode, Recipient,
};
use teloxide::{ApiError, DownloadError, RequestError};
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::transport::{
    Activity, BotCommandSpec, ChatId as ParleyChatId, CommandScope, IncomingContent,
    IncomingMessage, MarkupMode, MessageHandle, PhotoSource, Sender, Transport,
};

#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn from_token(token: impl Into<String>) -> Self {
        Self::new(Bot::new(token))
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[allow(deprecated)]
fn parse_mode(mode: MarkupMode) -> Option<ParseMode> {
    match mode {
        MarkupMode::MarkdownV2 => Some(ParseMode::MarkdownV2),
        MarkupMode::Markdown => Some(ParseMode::Markdown),
        MarkupMode::Plain => None,
    }
}

/// Sort a Bot API failure into the kinds delivery decisions depend on.
pub fn classify(err: RequestError) -> TransportError {
    match &err {
        RequestError::Api(ApiError::CantParseEntities(_)) => {
            TransportError::UnparseableMarkup(err.to_string())
        }
        RequestError::Api(ApiError::MessageIsTooLong) => {
            TransportError::PayloadTooLarge(err.to_string())
        }
        RequestError::Api(ApiError::Unknown(msg)) if msg.contains("can't parse") => {
            TransportError::UnparseableMarkup(err.to_string())
        }
        RequestError::Network(_) | RequestError::RetryAfter(_) | RequestError::Io(_) => {
            TransportError::TransientNetwork(err.to_string())
        }
        _ => TransportError::Other(err.to_string()),
    }
}

fn classify_download(err: DownloadError) -> TransportError {
    match err {
        DownloadError::Network(e) => TransportError::TransientNetwork(e.to_string()),
        other => TransportError::Other(other.to_string()),
    }
}

fn handle(msg: &Message) -> MessageHandle {
    MessageHandle {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_message(&self, chat_id: ParleyChatId, text: &str, mode: MarkupMode) -> Result<MessageHandle> {
        let mut request = self.bot.send_message(ChatId(chat_id), text.to_string());
        if let Some(parse_mode) = parse_mode(mode) {
            request = request.parse_mode(parse_mode);
        }
        let sent = request.await.map_err(classify)?;
        Ok(handle(&sent))
    }

    async fn send_photo(&self, chat_id: ParleyChatId, photo: PhotoSource) -> Result<MessageHandle> {
        let input = match photo {
            PhotoSource::Url(url) => {
                let url = reqwest::Url::parse(&url)
                    .map_err(|e| TransportError::Other(format!("invalid photo url: {e}")))?;
                InputFile::url(url)
            }
            PhotoSource::Bytes(bytes) => InputFile::memory(bytes),
        };
        let sent = self
            .bot
            .send_photo(ChatId(chat_id), input)
            .await
            .map_err(classify)?;
        Ok(handle(&sent))
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>> {
        let file = self
            .bot
            .get_file(file_id.to_string())
            .await
            .map_err(classify)?;
        let mut buf = Vec::new();
        self.bot
            .download_file(&file.path, &mut buf)
            .await
            .map_err(classify_download)?;
        debug!(file_id, bytes = buf.len(), "Downloaded file");
        Ok(buf)
    }

    async fn set_command_menu(&self, commands: &[BotCommandSpec], scope: CommandScope) -> Result<()> {
        let commands: Vec<BotCommand> = commands
            .iter()
            .map(|c| BotCommand::new(c.command.clone(), c.description.clone()))
            .collect();
        let mut request = self.bot.set_my_commands(commands);
        if let CommandScope::Chat(chat_id) = scope {
            request = request.scope(BotCommandScope::Chat {
                chat_id: Recipient::Id(ChatId(chat_id)),
            });
        }
        request.await.map_err(classify)?;
        Ok(())
    }

    async fn send_activity(&self, chat_id: ParleyChatId, activity: Activity) -> Result<()> {
        let action = match activity {
            Activity::Typing => ChatAction::Typing,
            Activity::UploadPhoto => ChatAction::UploadPhoto,
        };
        self.bot
            .send_chat_action(ChatId(chat_id), action)
            .await
            .map_err(classify)?;
        Ok(())
    }
}

/// Convert a teloxide update into the transport-neutral form.
pub fn incoming_message(msg: &Message) -> IncomingMessage {
    let sender = msg
        .from
        .as_ref()
        .map(|user| Sender {
            username: user.username.clone(),
            full_name: user.full_name(),
        })
        .unwrap_or_default();

    let content = if let Some(text) = msg.text() {
        IncomingContent::Text(text.to_string())
    } else if let Some(largest) = msg.photo().and_then(|sizes| sizes.last()) {
        IncomingContent::Photo {
            file_id: largest.file.id.clone(),
            caption: msg.caption().map(str::to_string),
        }
    } else {
        IncomingContent::Unsupported
    };

    IncomingMessage {
        chat_id: msg.chat.id.0,
        sender,
        content,
    }
}
