use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use parley_core::RetryPolicy;
use parley_llms::{ChatReply, ChatRequest, CompletionClient};
use parley_transport::{
    Activity, BotCommandSpec, ChatId, CommandScope, IncomingContent, IncomingMessage, MarkupMode,
    MessageHandle, PhotoSource, Sender, Transport, TransportError,
};
use tempfile::TempDir;

use crate::{Bot, BotConfig};

pub const CHAT: ChatId = 100;
pub const FULL_NAME: &str = "Ada Lovelace";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub chat_id: ChatId,
    pub text: String,
    pub mode: MarkupMode,
}

#[derive(Default)]
pub struct MockTransport {
    sent: Mutex<Vec<Sent>>,
    photos: Mutex<Vec<PhotoSource>>,
    menus: Mutex<Vec<(Vec<BotCommandSpec>, CommandScope)>>,
    activities: Mutex<Vec<Activity>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockTransport {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|s| s.text).collect()
    }

    pub fn last_text(&self) -> String {
        self.texts().pop().expect("nothing was sent")
    }

    pub fn photos(&self) -> Vec<PhotoSource> {
        self.photos.lock().unwrap().clone()
    }

    pub fn menus(&self) -> Vec<(Vec<BotCommandSpec>, CommandScope)> {
        self.menus.lock().unwrap().clone()
    }

    pub fn activities(&self) -> Vec<Activity> {
        self.activities.lock().unwrap().clone()
    }

    pub fn add_file(&self, file_id: &str, bytes: Vec<u8>) {
        self.files.lock().unwrap().insert(file_id.to_string(), bytes);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_message(&self, chat_id: ChatId, text: &str, mode: MarkupMode) -> parley_transport::Result<MessageHandle> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(Sent {
            chat_id,
            text: text.to_string(),
            mode,
        });
        Ok(MessageHandle {
            chat_id,
            message_id: sent.len() as i32,
        })
    }

    async fn send_photo(&self, chat_id: ChatId, photo: PhotoSource) -> parley_transport::Result<MessageHandle> {
        self.photos.lock().unwrap().push(photo);
        Ok(MessageHandle { chat_id, message_id: 0 })
    }

    async fn download_file(&self, file_id: &str) -> parley_transport::Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| TransportError::Other(format!("unknown file {file_id}")))
    }

    async fn set_command_menu(&self, commands: &[BotCommandSpec], scope: CommandScope) -> parley_transport::Result<()> {
        self.menus.lock().unwrap().push((commands.to_vec(), scope));
        Ok(())
    }

    async fn send_activity(&self, _chat_id: ChatId, activity: Activity) -> parley_transport::Result<()> {
        self.activities.lock().unwrap().push(activity);
        Ok(())
    }
}

/// Replays queued outcomes; answers "ok" once the queue is empty.
#[derive(Default)]
pub struct MockClient {
    replies: Mutex<VecDeque<parley_llms::Result<ChatReply>>>,
    images: Mutex<VecDeque<parley_llms::Result<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
    image_prompts: Mutex<Vec<String>>,
}

impl MockClient {
    pub fn reply(&self, text: &str, total_tokens: u64) {
        self.replies.lock().unwrap().push_back(Ok(ChatReply {
            text: text.to_string(),
            total_tokens,
        }));
    }

    pub fn fail(&self, err: parley_llms::Error) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    pub fn fail_image(&self, err: parley_llms::Error) {
        self.images.lock().unwrap().push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn image_prompts(&self) -> Vec<String> {
        self.image_prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for MockClient {
    fn provider_id(&self) -> &str {
        "mock"
    }

    async fn chat_complete(&self, request: ChatRequest) -> parley_llms::Result<ChatReply> {
        self.requests.lock().unwrap().push(request);
        self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(ChatReply {
                text: "ok".to_string(),
                total_tokens: 10,
            })
        })
    }

    async fn generate_image(&self, prompt: &str) -> parley_llms::Result<String> {
        self.image_prompts.lock().unwrap().push(prompt.to_string());
        self.images
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("https://images.example/1.png".to_string()))
    }
}

/// A bot wired to mocks, with `root` as admin and `ada` on the allow-list.
pub struct Harness {
    pub bot: Bot,
    pub transport: Arc<MockTransport>,
    pub client: Arc<MockClient>,
    pub dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(|config| config)
    }

    pub fn with_config(customize: impl FnOnce(BotConfig) -> BotConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("users.json"), r#"{"users": ["root", "ada"]}"#).unwrap();
        Self::in_dir(dir, customize)
    }

    /// A fresh bot over the files of an existing harness directory.
    pub fn in_dir(dir: TempDir, customize: impl FnOnce(BotConfig) -> BotConfig) -> Self {
        let config = customize(
            BotConfig::new("tg-token", "sk-test")
                .with_admins(["root"])
                .with_users_file(dir.path().join("users.json"))
                .with_context_file(dir.path().join("context.json")),
        );
        let transport = Arc::new(MockTransport::default());
        let client = Arc::new(MockClient::default());
        let bot = Bot::new(config, transport.clone(), client.clone())
            .unwrap()
            .with_delivery_retry(RetryPolicy::new(5, Duration::from_millis(1)));
        Self {
            bot,
            transport,
            client,
            dir,
        }
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.path().join(file)
    }

    pub async fn stored_turns(&self) -> usize {
        self.bot.state().lock().await.store.get(&CHAT.to_string()).len()
    }
}

pub fn sender(username: &str) -> Sender {
    Sender {
        username: Some(username.to_string()),
        full_name: FULL_NAME.to_string(),
    }
}

pub fn text_from(username: &str, text: &str) -> IncomingMessage {
    IncomingMessage::text(CHAT, sender(username), text)
}

pub fn photo_from(username: &str, file_id: &str, caption: Option<&str>) -> IncomingMessage {
    IncomingMessage {
        chat_id: CHAT,
        sender: sender(username),
        content: IncomingContent::Photo {
            file_id: file_id.to_string(),
            caption: caption.map(str::to_string),
        },
    }
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Jpeg).unwrap();
    out.into_inner()
}
