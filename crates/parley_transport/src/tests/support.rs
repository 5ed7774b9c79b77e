use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Result, TransportError};
use crate::transport::{
    Activity, BotCommandSpec, ChatId, CommandScope, MarkupMode, MessageHandle, PhotoSource,
    Transport,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SentMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub mode: MarkupMode,
}

/// Records successful sends; queued failures are returned first.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    sent: Mutex<Vec<SentMessage>>,
    failures: Mutex<VecDeque<TransportError>>,
    attempts: Mutex<usize>,
}

impl RecordingTransport {
    pub fn fail_next(&self, err: TransportError) {
        self.failures.lock().unwrap().push_back(err);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_message(&self, chat_id: ChatId, text: &str, mode: MarkupMode) -> Result<MessageHandle> {
        *self.attempts.lock().unwrap() += 1;
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(SentMessage {
            chat_id,
            text: text.to_string(),
            mode,
        });
        Ok(MessageHandle {
            chat_id,
            message_id: sent.len() as i32,
        })
    }

    async fn send_photo(&self, chat_id: ChatId, _photo: PhotoSource) -> Result<MessageHandle> {
        Ok(MessageHandle { chat_id, message_id: 0 })
    }

    async fn download_file(&self, _file_id: &str) -> Result<Vec<u8>> {
        Err(TransportError::Other("no files".into()))
    }

    async fn set_command_menu(&self, _commands: &[BotCommandSpec], _scope: CommandScope) -> Result<()> {
        Ok(())
    }

    async fn send_activity(&self, _chat_id: ChatId, _activity: Activity) -> Result<()> {
        Ok(())
    }
}
