use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MaybeInaccessibleMessage, MessageId};
use tracing::{debug, info, warn};

use super::formatting::split_message;
use crate::dialog::Dialog;
use crate::traits::{Channel, ChannelCapabilities};
use crate::types::{ButtonAction, MessageRef, UserId};

const MAX_MESSAGE_LEN: usize = 4096;

pub struct TelegramChannel {
    bot: Bot,
    /// Empty means every Telegram user may talk to the bot.
    allowed_user_ids: Vec<u64>,
}

impl TelegramChannel {
    pub fn new(bot_token: &str, allowed_user_ids: Vec<u64>) -> Self {
        Self {
            bot: Bot::new(bot_token),
            allowed_user_ids,
        }
    }

    fn is_allowed(&self, user: UserId) -> bool {
        is_allowed(&self.allowed_user_ids, user)
    }

    async fn get_bot_username(&self) -> String {
        match self.bot.get_me().await {
            Ok(me) => me.username().to_string(),
            Err(e) => {
                warn!("Failed to fetch bot username: {}", e);
                "telegram".to_string()
            }
        }
    }

    /// Run the dispatcher with automatic restart.
    /// Uses exponential backoff: 5s → 10s → 20s → 40s → 60s cap.
    /// Resets backoff to initial after a stable run (60s+).
    pub async fn start_with_retry(self: Arc<Self>, dialog: Arc<Dialog>) {
        let bot_username = self.get_bot_username().await;

        let initial_backoff = Duration::from_secs(5);
        let max_backoff = Duration::from_secs(60);
        let stable_threshold = Duration::from_secs(60);
        let mut backoff = initial_backoff;

        loop {
            info!(name = %bot_username, "Starting Telegram dispatcher");
            let started = tokio::time::Instant::now();
            self.clone().start(dialog.clone()).await;
            let ran_for = started.elapsed();

            if ran_for >= stable_threshold {
                backoff = initial_backoff;
            }

            warn!(
                name = %bot_username,
                backoff_secs = backoff.as_secs(),
                ran_for_secs = ran_for.as_secs(),
                "Telegram dispatcher stopped, restarting"
            );
            tokio::time::sleep(backoff).await;
            backoff = std::cmp::min(backoff * 2, max_backoff);
        }
    }

    pub async fn start(self: Arc<Self>, dialog: Arc<Dialog>) {
        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint({
                let channel = Arc::clone(&self);
                let dialog = Arc::clone(&dialog);
                move |msg: Message| {
                    let channel = Arc::clone(&channel);
                    let dialog = Arc::clone(&dialog);
                    async move {
                        channel.handle_message(&dialog, msg).await;
                        respond(())
                    }
                }
            }))
            .branch(Update::filter_callback_query().endpoint({
                let channel = Arc::clone(&self);
                let dialog = Arc::clone(&dialog);
                move |q: CallbackQuery| {
                    let channel = Arc::clone(&channel);
                    let dialog = Arc::clone(&dialog);
                    async move {
                        channel.handle_callback(&dialog, q).await;
                        respond(())
                    }
                }
            }));

        Dispatcher::builder(self.bot.clone(), handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }

    async fn handle_message(&self, dialog: &Dialog, msg: Message) {
        let Some(user) = msg.from.as_ref().map(|u| u.id.0) else {
            return;
        };
        if !self.is_allowed(user) {
            warn!(user_id = user, "Unauthorized message from user");
            let _ = self
                .bot
                .send_message(msg.chat.id, format!("Unauthorized. Your ID: {}", user))
                .await;
            return;
        }
        let Some(text) = msg.text() else {
            debug!(user_id = user, "Ignoring non-text message");
            return;
        };
        dialog.handle_text(user, text).await;
    }

    /// Handle callback query from inline keyboard buttons.
    async fn handle_callback(&self, dialog: &Dialog, q: CallbackQuery) {
        let user = q.from.id.0;
        if !self.is_allowed(user) {
            warn!(user_id = user, "Unauthorized callback from user");
            let _ = self
                .bot
                .answer_callback_query(q.id)
                .text(format!("Unauthorized. Your ID: {}", user))
                .await;
            return;
        }

        // Acknowledge first so the client stops its loading spinner.
        if let Err(e) = self.bot.answer_callback_query(q.id.clone()).await {
            debug!(user_id = user, "Failed to answer callback: {}", e);
        }

        let Some(data) = q.data.as_deref() else {
            return;
        };
        let origin = match &q.message {
            Some(MaybeInaccessibleMessage::Regular(m)) => Some(MessageRef {
                chat_id: m.chat.id.0,
                message_id: m.id.0,
            }),
            _ => None,
        };
        dialog.handle_button(user, data, origin).await;
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> String {
        "telegram".to_string()
    }

    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            edit_messages: true,
            max_message_len: MAX_MESSAGE_LEN,
        }
    }

    async fn send_text(&self, user: UserId, text: &str) -> anyhow::Result<()> {
        let mut first_err: Option<anyhow::Error> = None;
        for chunk in split_message(text, self.capabilities().max_message_len) {
            if let Err(e) = self.bot.send_message(chat_id(user), chunk).await {
                warn!(user_id = user, "Failed to send message: {}", e);
                if first_err.is_none() {
                    first_err = Some(anyhow::anyhow!("Failed to send Telegram message: {}", e));
                }
            }
        }
        if let Some(err) = first_err {
            return Err(err);
        }
        Ok(())
    }

    async fn send_buttons(
        &self,
        user: UserId,
        text: &str,
        buttons: &[ButtonAction],
    ) -> anyhow::Result<()> {
        self.bot
            .send_message(chat_id(user), text)
            .reply_markup(keyboard(buttons))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send keyboard: {}", e))?;
        Ok(())
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> anyhow::Result<()> {
        // Edits cannot be split; anything longer goes out as new messages instead.
        if text.len() > self.capabilities().max_message_len {
            anyhow::bail!("Text too long to edit in place ({} bytes)", text.len());
        }
        self.bot
            .edit_message_text(ChatId(message.chat_id), MessageId(message.message_id), text)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to edit message: {}", e))?;
        Ok(())
    }
}

/// Private chats share their id with the user.
fn chat_id(user: UserId) -> ChatId {
    ChatId(user as i64)
}

/// One button per row, callback data is the action id.
fn keyboard(buttons: &[ButtonAction]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        buttons
            .iter()
            .map(|action| vec![InlineKeyboardButton::callback(action.label(), action.as_str())]),
    )
}

/// Pure allow-list check: an empty list admits everyone.
pub fn is_allowed(allowed: &[u64], user: UserId) -> bool {
    allowed.is_empty() || allowed.contains(&user)
}

/// Spawn the Telegram dispatcher in a background task.
/// This is a separate function to avoid async type inference cycles.
pub fn spawn_telegram_channel(channel: Arc<TelegramChannel>, dialog: Arc<Dialog>) {
    tokio::spawn(async move {
        channel.start_with_retry(dialog).await;
    });
}
