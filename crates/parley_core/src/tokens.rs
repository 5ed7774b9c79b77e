//! Token accounting for chat prompts.
//!
//! Counts follow the chat-completions framing: every message costs a fixed
//! overhead for its role delimiters, and the reply is primed with a short
//! assistant preamble. Text is measured with the cl100k_base encoding.

use std::sync::Arc;

use tiktoken_rs::CoreBPE;
use tracing::warn;

use crate::error::{CoreError, Result};
use crate::image::dimensions;
use crate::turn::{ContentBlock, ImageAttachment, ImageDetail, Turn};

/// `<im_start>{role}\n{content}<im_end>\n`
const TOKENS_PER_MESSAGE: usize = 4;
/// `<im_start>assistant`
const REPLY_PRIMING_TOKENS: usize = 2;

const LOW_DETAIL_COST: usize = 85;
const TILE_COST: usize = 170;
const HIGH_DETAIL_BASE_COST: usize = 85;
const MAX_IMAGE_SIDE: u32 = 2048;
const SHORT_SIDE_TARGET: f64 = 768.0;
const TILE_SIDE: u32 = 512;

/// Deterministic token estimator shared across the process.
#[derive(Clone)]
pub struct TokenCounter {
    bpe: Arc<CoreBPE>,
}

impl TokenCounter {
    pub fn new() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| CoreError::Tokenizer(e.to_string()))?;
        Ok(Self { bpe: Arc::new(bpe) })
    }

    /// Tokens of a bare string.
    pub fn count_text(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Prompt tokens for `messages`, including the reply preamble.
    pub fn count(&self, messages: &[Turn]) -> usize {
        messages.iter().map(|m| self.count_message(m)).sum::<usize>() + REPLY_PRIMING_TOKENS
    }

    fn count_message(&self, message: &Turn) -> usize {
        let mut tokens = TOKENS_PER_MESSAGE + self.count_text(message.role.as_str());
        for block in &message.blocks {
            tokens += match block {
                ContentBlock::Text { text } => self.count_text(text),
                ContentBlock::Image { image } => attachment_cost(image),
            };
        }
        tokens
    }
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter")
            .field("encoding", &"cl100k_base")
            .finish()
    }
}

fn attachment_cost(image: &ImageAttachment) -> usize {
    if image.detail == ImageDetail::Low {
        return LOW_DETAIL_COST;
    }
    match image.bytes().map(|b| dimensions(&b)) {
        Some(Ok((width, height))) => image_token_cost(width, height, image.detail),
        Some(Err(e)) => {
            warn!(error = %e, "Undecodable image, charging the maximum high-detail size");
            image_token_cost(MAX_IMAGE_SIDE, MAX_IMAGE_SIDE, image.detail)
        }
        None => {
            warn!("Malformed image data URL, charging the maximum high-detail size");
            image_token_cost(MAX_IMAGE_SIDE, MAX_IMAGE_SIDE, image.detail)
        }
    }
}

/// Vision cost of a `width`×`height` image at `detail`.
///
/// High detail first fits the image inside 2048×2048, then scales it so the
/// shorter side is 768px, and charges per 512px tile.
pub fn image_token_cost(width: u32, height: u32, detail: ImageDetail) -> usize {
    if detail == ImageDetail::Low {
        return LOW_DETAIL_COST;
    }
    if width == 0 || height == 0 {
        return HIGH_DETAIL_BASE_COST;
    }

    let (mut w, mut h) = (width as f64, height as f64);
    if width > MAX_IMAGE_SIDE || height > MAX_IMAGE_SIDE {
        let aspect = w / h;
        if aspect > 1.0 {
            w = MAX_IMAGE_SIDE as f64;
            h = (MAX_IMAGE_SIDE as f64 / aspect).trunc();
        } else {
            h = MAX_IMAGE_SIDE as f64;
            w = (MAX_IMAGE_SIDE as f64 * aspect).trunc();
        }
    }

    let scale = if w < h {
        SHORT_SIDE_TARGET / w
    } else {
        SHORT_SIDE_TARGET / h
    };
    let scaled_w = (w * scale) as u32;
    let scaled_h = (h * scale) as u32;

    let tiles = scaled_w.div_ceil(TILE_SIDE) * scaled_h.div_ceil(TILE_SIDE);
    tiles as usize * TILE_COST + HIGH_DETAIL_BASE_COST
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::test_support::jpeg;

    fn counter() -> TokenCounter {
        TokenCounter::new().unwrap()
    }

    #[test]
    fn test_low_detail_is_flat() {
        assert_eq!(image_token_cost(10, 10, ImageDetail::Low), 85);
        assert_eq!(image_token_cost(8000, 300, ImageDetail::Low), 85);
    }

    #[test]
    fn test_high_detail_square() {
        // 4096x4096 -> 2048x2048 -> 768x768 -> 2x2 tiles
        assert_eq!(image_token_cost(4096, 4096, ImageDetail::High), 4 * 170 + 85);
    }

    #[test]
    fn test_high_detail_two_to_one() {
        // 4096x2048 -> 2048x1024 -> 1536x768 -> 3x2 tiles
        assert_eq!(image_token_cost(4096, 2048, ImageDetail::High), 6 * 170 + 85);
    }

    #[test]
    fn test_high_detail_portrait() {
        // 1024x2048 fits; shorter side 1024 -> 768x1536 -> 2x3 tiles
        assert_eq!(image_token_cost(1024, 2048, ImageDetail::High), 6 * 170 + 85);
    }

    #[test]
    fn test_high_detail_small_image_scales_up() {
        // 512x512 -> 768x768 -> 2x2 tiles
        assert_eq!(image_token_cost(512, 512, ImageDetail::High), 765);
    }

    #[test]
    fn test_empty_list_costs_preamble() {
        assert_eq!(counter().count(&[]), 2);
    }

    #[test]
    fn test_message_framing() {
        let c = counter();
        let turn = Turn::user().with_text("hello");
        let expected = 4 + c.count_text("user") + c.count_text("hello") + 2;
        assert_eq!(c.count(&[turn]), expected);
    }

    #[test]
    fn test_count_is_deterministic() {
        let c = counter();
        let messages = vec![
            Turn::system().with_text("You are helpful."),
            Turn::user().with_text("What is the capital of France?"),
            Turn::assistant().with_text("Paris."),
        ];
        assert_eq!(c.count(&messages), c.count(&messages));
        assert_eq!(c.count(&messages), counter().count(&messages));
    }

    #[test]
    fn test_removing_a_message_never_increases_count() {
        let c = counter();
        let messages = vec![
            Turn::system().with_text("persona"),
            Turn::user().with_text("one"),
            Turn::assistant().with_text(""),
            Turn::user().with_text("three"),
        ];
        let full = c.count(&messages);
        for i in 0..messages.len() {
            let mut reduced = messages.clone();
            reduced.remove(i);
            assert!(c.count(&reduced) <= full);
        }
    }

    #[test]
    fn test_embedded_image_cost() {
        let c = counter();
        // 200x100 -> 1536x768 -> 3x2 tiles, same as a 4096x2048 upload
        let bytes = jpeg(200, 100);
        let high = Turn::user()
            .with_text("look")
            .with_image(ImageAttachment::from_jpeg(&bytes, ImageDetail::High));
        let low = Turn::user()
            .with_text("look")
            .with_image(ImageAttachment::from_jpeg(&bytes, ImageDetail::Low));
        let plain = Turn::user().with_text("look");

        assert_eq!(c.count(&[high]) - c.count(&[plain.clone()]), 1105);
        assert_eq!(c.count(&[low]) - c.count(&[plain]), 85);
    }

    #[test]
    fn test_undecodable_high_image_uses_fallback() {
        let c = counter();
        let broken = Turn::user().with_image(ImageAttachment::from_jpeg(b"nope", ImageDetail::High));
        let empty = Turn::user();
        assert_eq!(c.count(&[broken]) - c.count(&[empty]), 765);
    }
}
