//! Admin-only commands.
//!
//! The allow-list re-reads its file before every grant or revoke, so edits
//! made outside the bot are kept.

use parley_transport::IncomingMessage;

use crate::error::Result;

use super::{Bot, BotState};

const GRANT_USAGE: &str = "Usage: /grant <username...>";
const REVOKE_USAGE: &str = "Usage: /revoke <username...>";

impl Bot {
    pub(super) async fn grant(&self, state: &mut BotState, message: &IncomingMessage, args: &str) -> Result<()> {
        let names: Vec<&str> = args.split_whitespace().collect();
        let outcome = state.access.grant(&names)?;
        let mut lines: Vec<String> = outcome
            .already_allowed
            .iter()
            .map(|user| format!("User @{user} already had access!"))
            .collect();
        match outcome.granted.as_slice() {
            [] => {}
            [user] => lines.push(format!("Granted access to user @{user}")),
            many => lines.push(format!("Granted access to {} users", many.len())),
        }
        if lines.is_empty() {
            return self.reply(message.chat_id, GRANT_USAGE).await;
        }
        self.reply(message.chat_id, &lines.join("\n")).await
    }

    pub(super) async fn revoke(&self, state: &mut BotState, message: &IncomingMessage, args: &str) -> Result<()> {
        let names: Vec<&str> = args.split_whitespace().collect();
        let outcome = state.access.revoke(&names)?;
        let lines: Vec<String> = outcome
            .revoked
            .iter()
            .map(|user| format!("Revoked access to user @{user}"))
            .chain(
                outcome
                    .protected
                    .iter()
                    .map(|user| format!("User @{user} is an admin and can't be revoked")),
            )
            .chain(
                outcome
                    .not_found
                    .iter()
                    .map(|user| format!("User @{user} didn't have access")),
            )
            .collect();
        if lines.is_empty() {
            return self.reply(message.chat_id, REVOKE_USAGE).await;
        }
        self.reply(message.chat_id, &lines.join("\n")).await
    }

    pub(super) async fn list_users(&self, state: &mut BotState, message: &IncomingMessage) -> Result<()> {
        state.access.reload();
        let text = format!("Current users are:\n\n{}", state.access.users().join("\n"));
        self.reply(message.chat_id, &text).await
    }

    pub(super) async fn token_usage(&self, state: &mut BotState, message: &IncomingMessage) -> Result<()> {
        let text = usage_report(
            "Token usage per Username:",
            "No token usage so far...",
            state.usage.token_report(),
        );
        self.reply(message.chat_id, &text).await
    }

    pub(super) async fn image_usage(&self, state: &mut BotState, message: &IncomingMessage) -> Result<()> {
        let text = usage_report(
            "Number of images generated per Username:",
            "No image usage so far...",
            state.usage.image_report(),
        );
        self.reply(message.chat_id, &text).await
    }
}

fn usage_report(title: &str, empty: &str, rows: Vec<(String, u64)>) -> String {
    if rows.is_empty() {
        return empty.to_string();
    }
    let mut text = title.to_string();
    for (user, count) in rows {
        text.push_str(&format!("\n@{user}: {count}"));
    }
    text
}
