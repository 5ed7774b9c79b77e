use parley_core::Role;
use parley_transport::IncomingMessage;

use crate::error::Result;

use super::{Bot, BotState};

impl Bot {
    pub(super) async fn show_context(&self, state: &mut BotState, message: &IncomingMessage) -> Result<()> {
        let turns = state.store.get(&message.chat_id.to_string());
        if turns.is_empty() {
            return self.reply(message.chat_id, "Context is currently empty").await;
        }

        let mut text = String::from("Context: ");
        for turn in turns {
            let speaker = match turn.role {
                Role::Assistant => self.config.bot_name.as_str(),
                Role::User | Role::System => message.sender.full_name.as_str(),
            };
            text.push('\n');
            text.push_str(speaker);
            text.push_str(": ");
            text.push_str(&turn.text());
        }
        self.reply(message.chat_id, &text).await
    }

    pub(super) async fn context_length(&self, state: &mut BotState, message: &IncomingMessage) -> Result<()> {
        let turns = state.store.get(&message.chat_id.to_string());
        let tokens = if turns.is_empty() {
            0
        } else {
            self.window.counter().count(turns)
        };
        self.reply(message.chat_id, &format!("Your context is {tokens} tokens long."))
            .await
    }

    pub(super) async fn clear_context(&self, state: &mut BotState, message: &IncomingMessage) -> Result<()> {
        state.store.clear(&message.chat_id.to_string());
        self.reply(message.chat_id, "Context has been cleared!").await
    }
}
