use parley_transport::{Activity, IncomingMessage, MarkupMode, PhotoSource};
use tracing::{info, warn};

use crate::error::Result;

use super::{Bot, BotState};

const USAGE: &str = "You must provide a prompt. Usage:\n `/image <prompt>`";
const REJECTED: &str = "This image can't be generated because of OpenAI's safety systems.";

impl Bot {
    /// Generate an image for `prompt` and send it to the chat.
    pub(super) async fn generate_image(
        &self,
        state: &mut BotState,
        message: &IncomingMessage,
        prompt: &str,
    ) -> Result<()> {
        let chat_id = message.chat_id;
        let prompt = prompt.trim();
        if prompt.is_empty() {
            self.delivery.send(chat_id, USAGE, MarkupMode::MarkdownV2).await?;
            return Ok(());
        }

        self.delivery.send_activity(chat_id, Activity::UploadPhoto).await;
        let url = match self.client.generate_image(prompt).await {
            Ok(url) => url,
            Err(parley_llms::Error::ContentPolicy(reason)) => {
                warn!(chat_id, %reason, "Image prompt rejected");
                self.delivery.send(chat_id, REJECTED, MarkupMode::Plain).await?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        info!(chat_id, prompt, "Image generated");
        state.usage.record_image(message.username());
        self.delivery.send_photo(chat_id, PhotoSource::Url(url)).await?;
        Ok(())
    }
}
