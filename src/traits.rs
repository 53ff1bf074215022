mod channels;
mod scheduler;
mod user_store;

pub use channels::{Channel, ChannelCapabilities};
pub use scheduler::{DailyScheduler, ReminderTarget};
pub use user_store::{SessionGuard, UserStore};
