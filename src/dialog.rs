//! Command router and per-user dialog state machine.
//!
//! Every inbound update (command, button press, free text) ends up in one of
//! the `handle_*` methods. State is read and written only through a
//! [`SessionGuard`](crate::traits::SessionGuard), and the guard is always
//! dropped before anything is sent back over the channel.

use std::sync::Arc;

use chrono::Local;
use tracing::{debug, info, warn};

use crate::errors::BotError;
use crate::reminders::DaysSinceReminder;
use crate::traits::{Channel, DailyScheduler, ReminderTarget, UserStore};
use crate::types::{ButtonAction, MessageRef, PendingInput, UserId};

pub const HELP_TEXT: &str = "👋 Hello! I'm your list management bot.\n\
Here are the available commands:\n\
/start - Start chatting with the bot.\n\
/setdate - Set a date to start counting days (format: YYYY-MM-DD).\n\
/checkdays - Check how many days have passed since the set date.\n\
/lists - Manage your lists.\n\
/like_dislike - Manage liked/disliked items.\n\
/reminder - Toggle daily reminders.\n\
/categories - View your declared categories.";

const LIST_BUTTONS: [ButtonAction; 5] = [
    ButtonAction::AddItem,
    ButtonAction::ViewAll,
    ButtonAction::ViewLiked,
    ButtonAction::ManageCategories,
    ButtonAction::SplitCategories,
];

const LIKE_BUTTONS: [ButtonAction; 2] = [ButtonAction::Like, ButtonAction::Dislike];

/// A parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    SetDate,
    CheckDays,
    Lists,
    LikeDislike,
    Reminder,
    Categories,
    Unknown(String),
}

impl Command {
    /// Split `/name[@bot] args` into the command and its trimmed argument.
    /// Returns `None` for text that is not a command.
    pub fn parse(text: &str) -> Option<(Command, &str)> {
        let text = text.trim_start();
        let rest = text.strip_prefix('/')?;
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        let name = name.split('@').next().unwrap_or(name);
        let command = match name {
            "start" | "help" => Command::Start,
            "setdate" => Command::SetDate,
            "checkdays" => Command::CheckDays,
            "lists" => Command::Lists,
            "like_dislike" => Command::LikeDislike,
            "reminder" => Command::Reminder,
            "categories" | "view_categories" => Command::Categories,
            other => Command::Unknown(other.to_string()),
        };
        Some((command, arg))
    }
}

/// Pending state armed by a button, with the prompt that asks for the reply.
fn pending_for(action: ButtonAction) -> Option<(PendingInput, &'static str)> {
    let armed = match action {
        ButtonAction::AddItem => (
            PendingInput::AwaitingItem,
            "Please send the item name and category (e.g., Vampire: Dracula).",
        ),
        ButtonAction::ManageCategories => (
            PendingInput::AwaitingCategory,
            "Please send the category name to add or type /view_categories to see existing categories.",
        ),
        ButtonAction::SplitCategories => (
            PendingInput::AwaitingSplitCategory,
            "Please provide the name of the category you want to split.",
        ),
        ButtonAction::Like => (
            PendingInput::AwaitingLike,
            "Please send the name of the item you want to like.",
        ),
        ButtonAction::Dislike => (
            PendingInput::AwaitingDislike,
            "Please send the name of the item you want to dislike.",
        ),
        ButtonAction::ViewAll | ButtonAction::ViewLiked => return None,
    };
    Some(armed)
}

pub struct Dialog {
    store: Arc<dyn UserStore>,
    channel: Arc<dyn Channel>,
    scheduler: Arc<dyn DailyScheduler>,
    reminder: Arc<dyn ReminderTarget>,
}

impl Dialog {
    pub fn new(
        store: Arc<dyn UserStore>,
        channel: Arc<dyn Channel>,
        scheduler: Arc<dyn DailyScheduler>,
    ) -> Self {
        let reminder: Arc<dyn ReminderTarget> =
            Arc::new(DaysSinceReminder::new(store.clone(), channel.clone()));
        Self {
            store,
            channel,
            scheduler,
            reminder,
        }
    }

    /// Entry point for any inbound text: commands are routed, everything else
    /// is treated as a reply to a pending prompt.
    pub async fn handle_text(&self, user: UserId, text: &str) {
        match Command::parse(text) {
            Some((command, arg)) => self.handle_command(user, command, arg).await,
            None => self.handle_reply(user, text).await,
        }
    }

    pub async fn handle_command(&self, user: UserId, command: Command, arg: &str) {
        info!(user_id = user, command = ?command, "Handling command");
        let reply = match command {
            Command::Start => HELP_TEXT.to_string(),
            Command::SetDate => self.set_date(user, arg).await,
            Command::CheckDays => self.check_days(user).await,
            Command::Lists => {
                self.send_buttons(user, "📋 Manage your lists:", &LIST_BUTTONS)
                    .await;
                return;
            }
            Command::LikeDislike => {
                if self.store.get(user).await.is_none() {
                    BotError::NoRecord.user_message()
                } else {
                    self.send_buttons(user, "❤️ Choose an action:", &LIKE_BUTTONS)
                        .await;
                    return;
                }
            }
            Command::Reminder => self.toggle_reminder(user).await,
            Command::Categories => match self.store.get(user).await {
                Some(record) => record.list_categories(),
                None => BotError::NoRecord.user_message(),
            },
            Command::Unknown(name) => format!(
                "Unknown command: /{}\nType /help for available commands.",
                name
            ),
        };
        self.send(user, &reply).await;
    }

    /// Handle an inline-keyboard press. `origin` is the message carrying the
    /// keyboard, when the transport still has access to it.
    pub async fn handle_button(&self, user: UserId, data: &str, origin: Option<MessageRef>) {
        let Some(action) = ButtonAction::parse(data) else {
            warn!(user_id = user, data, "Unknown button callback");
            return;
        };
        info!(user_id = user, %action, "Handling button");

        let Some((pending, prompt)) = pending_for(action) else {
            let text = match (action, self.store.get(user).await) {
                (ButtonAction::ViewLiked, Some(record)) => record.list_liked(),
                (_, Some(record)) => record.list_all().to_string(),
                (_, None) => BotError::NoRecord.user_message(),
            };
            self.show_in_place(user, origin, &text).await;
            return;
        };

        let reply = match self.store.existing_session(user).await {
            Some(mut session) if session.record.is_some() => {
                let previous = session.arm(pending);
                if !previous.is_idle() {
                    debug!(user_id = user, ?previous, ?pending, "Discarding earlier pending input");
                }
                prompt.to_string()
            }
            _ => BotError::NoRecord.user_message(),
        };
        self.send(user, &reply).await;
    }

    /// Free text: consumed by whatever prompt is pending, ignored otherwise.
    pub async fn handle_reply(&self, user: UserId, text: &str) {
        let reply = {
            let Some(mut session) = self.store.existing_session(user).await else {
                debug!(user_id = user, "Ignoring free text from unknown user");
                return;
            };
            let pending = session.take_pending();
            let result = match pending {
                PendingInput::Idle => {
                    debug!(user_id = user, "Ignoring free text, nothing pending");
                    return;
                }
                PendingInput::AwaitingItem => session
                    .record_mut()
                    .and_then(|record| record.add_item(text))
                    .map(|(category, item)| {
                        format!("✅ Item '{}' added to category '{}'!", item, category)
                    }),
                PendingInput::AwaitingCategory => session
                    .record_mut()
                    .and_then(|record| record.declare_category(text))
                    .map(|name| format!("✅ Category '{}' added!", name)),
                PendingInput::AwaitingSplitCategory => session
                    .record_mut()
                    .and_then(|record| record.split_category(text))
                    .map(|new_name| {
                        format!(
                            "✅ Category '{}' has been split into '{}'!",
                            text.trim(),
                            new_name
                        )
                    }),
                PendingInput::AwaitingLike => session
                    .record_mut()
                    .and_then(|record| record.like(text))
                    .map(|item| format!("❤️ You liked '{}'!", item)),
                PendingInput::AwaitingDislike => session
                    .record_mut()
                    .and_then(|record| record.dislike(text))
                    .map(|item| format!("👎 You disliked '{}'!", item)),
            };
            match result {
                Ok(reply) => {
                    info!(user_id = user, ?pending, "Pending input consumed");
                    reply
                }
                Err(e) => {
                    info!(user_id = user, ?pending, error = %e, "Pending input rejected");
                    e.user_message()
                }
            }
        };
        self.send(user, &reply).await;
    }

    async fn set_date(&self, user: UserId, arg: &str) -> String {
        let date = arg.split_whitespace().next().unwrap_or_default();
        let (session, previous) = match self.store.create_or_reset(user, date).await {
            Ok(reset) => reset,
            Err(e) => return e.user_message(),
        };
        // Still under the user's lock: a concurrent /reminder must not see the
        // fresh record until the old trigger is gone.
        if previous.is_some_and(|record| record.reminders_enabled) {
            self.scheduler.cancel(user).await;
        }
        drop(session);
        info!(user_id = user, date, "Start date set");
        format!(
            "📅 Date set to {}. I'll start counting days from this date.",
            date
        )
    }

    async fn check_days(&self, user: UserId) -> String {
        match self.store.days_since(user, Local::now().naive_local()).await {
            Ok(days) => format!("🗓️ It has been {} days since you set the date.", days),
            Err(e) => e.user_message(),
        }
    }

    async fn toggle_reminder(&self, user: UserId) -> String {
        let Some(mut session) = self.store.existing_session(user).await else {
            return BotError::NoRecord.user_message();
        };
        let record = match session.record_mut() {
            Ok(record) => record,
            Err(e) => return e.user_message(),
        };
        record.reminders_enabled = !record.reminders_enabled;

        if record.reminders_enabled {
            if let Err(e) = self.scheduler.register(user, self.reminder.clone()).await {
                warn!(user_id = user, "Failed to schedule daily reminder: {}", e);
                record.reminders_enabled = false;
                return "❌ Could not schedule daily reminders right now.".to_string();
            }
            "🔔 Daily reminders have been enabled.".to_string()
        } else {
            self.scheduler.cancel(user).await;
            "🔔 Daily reminders have been disabled.".to_string()
        }
    }

    /// Edit the keyboard message when possible, otherwise send a new message.
    async fn show_in_place(&self, user: UserId, origin: Option<MessageRef>, text: &str) {
        let capabilities = self.channel.capabilities();
        let editable = capabilities.edit_messages && text.len() <= capabilities.max_message_len;
        if let Some(message) = origin.filter(|_| editable) {
            match self.channel.edit_text(message, text).await {
                Ok(()) => return,
                Err(e) => warn!(user_id = user, "Edit failed, sending instead: {}", e),
            }
        }
        self.send(user, text).await;
    }

    async fn send(&self, user: UserId, text: &str) {
        if let Err(e) = self.channel.send_text(user, text).await {
            warn!(user_id = user, "Failed to send message: {}", e);
        }
    }

    async fn send_buttons(&self, user: UserId, text: &str, buttons: &[ButtonAction]) {
        if let Err(e) = self.channel.send_buttons(user, text, buttons).await {
            warn!(user_id = user, "Failed to send keyboard: {}", e);
        }
    }
}
