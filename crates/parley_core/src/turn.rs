use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolution the vision model should use for an attached image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageDetail {
    #[default]
    Low,
    High,
}

impl ImageDetail {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageDetail::Low => "low",
            ImageDetail::High => "high",
        }
    }
}

/// A JPEG image embedded as a base64 data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    pub data_url: String,
    pub detail: ImageDetail,
}

impl ImageAttachment {
    /// Wrap JPEG bytes. Callers normalize with [`crate::ensure_jpeg`] first.
    pub fn from_jpeg(bytes: &[u8], detail: ImageDetail) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self {
            data_url: format!("{JPEG_DATA_URL_PREFIX}{encoded}"),
            detail,
        }
    }

    /// Decode the embedded bytes. Returns `None` for malformed data URLs.
    pub fn bytes(&self) -> Option<Vec<u8>> {
        let payload = self
            .data_url
            .split_once(";base64,")
            .map(|(_, b64)| b64)
            .unwrap_or(self.data_url.as_str());
        base64::engine::general_purpose::STANDARD.decode(payload).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    Image { image: ImageAttachment },
}

impl ContentBlock {
    pub fn text(content: impl Into<String>) -> Self {
        ContentBlock::Text {
            text: content.into(),
        }
    }

    pub fn image(image: ImageAttachment) -> Self {
        ContentBlock::Image { image }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub blocks: Vec<ContentBlock>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            blocks: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_block(mut self, block: ContentBlock) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_block(ContentBlock::text(text))
    }

    pub fn with_image(self, image: ImageAttachment) -> Self {
        self.with_block(ContentBlock::image(image))
    }

    pub fn user() -> Self {
        Self::new(Role::User)
    }

    pub fn assistant() -> Self {
        Self::new(Role::Assistant)
    }

    pub fn system() -> Self {
        Self::new(Role::System)
    }

    /// All text blocks joined with newlines.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn has_image(&self) -> bool {
        self.blocks
            .iter()
            .any(|b| matches!(b, ContentBlock::Image { .. }))
    }

    /// Copy of this turn with image blocks removed, for storage.
    pub fn without_images(&self) -> Self {
        Self {
            role: self.role,
            blocks: self
                .blocks
                .iter()
                .filter(|b| matches!(b, ContentBlock::Text { .. }))
                .cloned()
                .collect(),
            timestamp: self.timestamp,
        }
    }
}
