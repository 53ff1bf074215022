mod formatting;
mod telegram;

pub use telegram::{spawn_telegram_channel, TelegramChannel};
