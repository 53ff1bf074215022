use std::sync::Arc;

use async_trait::async_trait;

use crate::types::UserId;

/// Callback run by the scheduler each time a user's daily trigger fires.
#[async_trait]
pub trait ReminderTarget: Send + Sync {
    async fn fire(&self, user: UserId);
}

/// Once-a-day trigger registry, keyed by user.
///
/// At most one registration exists per user: registering again replaces the
/// previous trigger instead of adding a second one.
#[async_trait]
pub trait DailyScheduler: Send + Sync {
    /// Register (or replace) the daily trigger for `user`.
    async fn register(&self, user: UserId, target: Arc<dyn ReminderTarget>) -> anyhow::Result<()>;

    /// Cancel the user's trigger. Returns false when nothing was registered.
    async fn cancel(&self, user: UserId) -> bool;

    /// Number of live registrations.
    async fn active_count(&self) -> usize;
}
