//! Test infrastructure: TestChannel, TestScheduler and TestHarness.
//!
//! Provides a fully wired Dialog with in-memory state, a capturing channel
//! and a scheduler that fires only when a test tells it to.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::dialog::Dialog;
use crate::state::InMemoryUserStore;
use crate::traits::{Channel, ChannelCapabilities, DailyScheduler, ReminderTarget};
use crate::types::{ButtonAction, MessageRef, UserId};

// ---------------------------------------------------------------------------
// TestChannel
// ---------------------------------------------------------------------------

/// Captured outbound operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text {
        user: UserId,
        text: String,
    },
    Buttons {
        user: UserId,
        text: String,
        buttons: Vec<ButtonAction>,
    },
    Edit {
        message: MessageRef,
        text: String,
    },
}

/// A test channel that captures everything sent through it.
pub struct TestChannel {
    pub sent: Mutex<Vec<Sent>>,
    max_message_len: usize,
}

impl TestChannel {
    pub fn new() -> Self {
        Self::with_max_message_len(4096)
    }

    pub fn with_max_message_len(max_message_len: usize) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            max_message_len,
        }
    }

    /// Texts (plain or with buttons) sent to a user, in order.
    pub async fn messages_for(&self, user: UserId) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|s| match s {
                Sent::Text { user: u, text } | Sent::Buttons { user: u, text, .. } if *u == user => {
                    Some(text.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Text of the most recent message to a user.
    pub async fn last_for(&self, user: UserId) -> Option<String> {
        self.messages_for(user).await.pop()
    }

    pub async fn edits(&self) -> Vec<(MessageRef, String)> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|s| match s {
                Sent::Edit { message, text } => Some((*message, text.clone())),
                _ => None,
            })
            .collect()
    }

    /// Buttons attached to the most recent keyboard message for a user.
    pub async fn last_buttons_for(&self, user: UserId) -> Option<Vec<ButtonAction>> {
        self.sent.lock().await.iter().rev().find_map(|s| match s {
            Sent::Buttons {
                user: u, buttons, ..
            } if *u == user => Some(buttons.clone()),
            _ => None,
        })
    }

    /// Total number of operations captured.
    pub async fn message_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl Channel for TestChannel {
    fn name(&self) -> String {
        "test".to_string()
    }

    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            edit_messages: true,
            max_message_len: self.max_message_len,
        }
    }

    async fn send_text(&self, user: UserId, text: &str) -> anyhow::Result<()> {
        self.sent.lock().await.push(Sent::Text {
            user,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_buttons(
        &self,
        user: UserId,
        text: &str,
        buttons: &[ButtonAction],
    ) -> anyhow::Result<()> {
        self.sent.lock().await.push(Sent::Buttons {
            user,
            text: text.to_string(),
            buttons: buttons.to_vec(),
        });
        Ok(())
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> anyhow::Result<()> {
        self.sent.lock().await.push(Sent::Edit {
            message,
            text: text.to_string(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TestScheduler
// ---------------------------------------------------------------------------

/// Scheduler that only records registrations; tests fire them by hand.
pub struct TestScheduler {
    pub registrations: Mutex<HashMap<UserId, Arc<dyn ReminderTarget>>>,
    pub register_calls: Mutex<usize>,
    cancel_delay: Option<Duration>,
}

impl TestScheduler {
    pub fn new() -> Self {
        Self {
            registrations: Mutex::new(HashMap::new()),
            register_calls: Mutex::new(0),
            cancel_delay: None,
        }
    }

    /// A scheduler whose `cancel` takes `delay` before it touches the registry.
    pub fn with_cancel_delay(delay: Duration) -> Self {
        Self {
            cancel_delay: Some(delay),
            ..Self::new()
        }
    }

    pub async fn is_registered(&self, user: UserId) -> bool {
        self.registrations.lock().await.contains_key(&user)
    }

    /// Run the user's trigger as if the daily time had come. Returns false if none is registered.
    pub async fn fire(&self, user: UserId) -> bool {
        let target = self.registrations.lock().await.get(&user).cloned();
        match target {
            Some(target) => {
                target.fire(user).await;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl DailyScheduler for TestScheduler {
    async fn register(&self, user: UserId, target: Arc<dyn ReminderTarget>) -> anyhow::Result<()> {
        *self.register_calls.lock().await += 1;
        self.registrations.lock().await.insert(user, target);
        Ok(())
    }

    async fn cancel(&self, user: UserId) -> bool {
        if let Some(delay) = self.cancel_delay {
            tokio::time::sleep(delay).await;
        }
        self.registrations.lock().await.remove(&user).is_some()
    }

    async fn active_count(&self) -> usize {
        self.registrations.lock().await.len()
    }
}

// ---------------------------------------------------------------------------
// TestHarness
// ---------------------------------------------------------------------------

pub struct TestHarness {
    pub dialog: Arc<Dialog>,
    pub store: Arc<InMemoryUserStore>,
    pub channel: Arc<TestChannel>,
    pub scheduler: Arc<TestScheduler>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_parts(TestChannel::new(), TestScheduler::new())
    }

    pub fn with_parts(channel: TestChannel, scheduler: TestScheduler) -> Self {
        let store = Arc::new(InMemoryUserStore::new());
        let channel = Arc::new(channel);
        let scheduler = Arc::new(scheduler);
        let dialog = Arc::new(Dialog::new(store.clone(), channel.clone(), scheduler.clone()));
        Self {
            dialog,
            store,
            channel,
            scheduler,
        }
    }

    /// Run `/setdate` for today's date.
    pub async fn setdate_today(&self, user: UserId) {
        let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
        self.dialog.handle_text(user, &format!("/setdate {}", today)).await;
    }
}
