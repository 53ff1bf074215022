use async_trait::async_trait;

use crate::types::{ButtonAction, MessageRef, UserId};

/// Capabilities that vary by transport.
#[derive(Debug, Clone)]
pub struct ChannelCapabilities {
    /// Whether a previously sent message can be edited in place.
    pub edit_messages: bool,
    /// Maximum message length in characters. Longer text is split.
    pub max_message_len: usize,
}

/// Outbound side of a chat transport (Telegram, or a test double).
///
/// These three operations are everything the dialog layer needs; inbound
/// updates are pushed into [`crate::dialog::Dialog`] by the transport itself.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Unique name for this channel (e.g. "telegram").
    fn name(&self) -> String;

    fn capabilities(&self) -> ChannelCapabilities;

    /// Send a plain text message to a user.
    async fn send_text(&self, user: UserId, text: &str) -> anyhow::Result<()>;

    /// Send a text message with one button per row underneath.
    async fn send_buttons(
        &self,
        user: UserId,
        text: &str,
        buttons: &[ButtonAction],
    ) -> anyhow::Result<()>;

    /// Replace the text of a message sent earlier.
    async fn edit_text(&self, message: MessageRef, text: &str) -> anyhow::Result<()>;
}
