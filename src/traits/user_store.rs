use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::OwnedMutexGuard;

use crate::errors::BotError;
use crate::state::{parse_date, UserRecord, UserSession};
use crate::types::UserId;

/// Exclusive handle on one user's session. Dropping it releases the user.
pub type SessionGuard = OwnedMutexGuard<UserSession>;

/// Per-user state store.
///
/// Every read-modify-write goes through a [`SessionGuard`], so two handlers
/// for the same user are serialized while different users never wait on each
/// other. Implementations decide where the sessions live.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Lock the user's session, creating an empty slot if needed. Only
    /// record creation should need this; everything else uses
    /// [`UserStore::existing_session`].
    async fn session(&self, user: UserId) -> SessionGuard;

    /// Lock the user's session only if a slot already exists.
    async fn existing_session(&self, user: UserId) -> Option<SessionGuard>;

    /// Number of users with a record.
    async fn user_count(&self) -> usize;

    /// Start a fresh record at `date`, returning the replaced record with the
    /// session still locked.
    ///
    /// The date is parsed before any slot is touched, so a malformed date
    /// neither changes an existing record nor creates an empty slot. Work that
    /// depends on the replaced record (cancelling its reminder) must finish
    /// before the returned guard is dropped.
    async fn create_or_reset(
        &self,
        user: UserId,
        date: &str,
    ) -> Result<(SessionGuard, Option<UserRecord>), BotError> {
        let start_date = parse_date(date)?;
        let mut session = self.session(user).await;
        let previous = session.reset(start_date);
        Ok((session, previous))
    }

    /// Snapshot of the user's record. `None` is a normal answer, not an error.
    async fn get(&self, user: UserId) -> Option<UserRecord> {
        self.existing_session(user)
            .await
            .and_then(|session| session.record.clone())
    }

    async fn days_since(&self, user: UserId, now: NaiveDateTime) -> Result<i64, BotError> {
        let session = self.existing_session(user).await.ok_or(BotError::NoRecord)?;
        Ok(session.record()?.days_since(now))
    }
}
