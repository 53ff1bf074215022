use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::session::UserSession;
use crate::traits::{SessionGuard, UserStore};
use crate::types::UserId;

/// Process-lifetime store. Nothing survives a restart.
///
/// The outer map lock is only held long enough to find or insert a slot;
/// the per-user `tokio::sync::Mutex` is what serializes handlers.
#[derive(Default)]
pub struct InMemoryUserStore {
    slots: StdMutex<HashMap<UserId, Arc<Mutex<UserSession>>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_or_insert(&self, user: UserId) -> Arc<Mutex<UserSession>> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(slots.entry(user).or_default())
    }

    fn existing_slot(&self, user: UserId) -> Option<Arc<Mutex<UserSession>>> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.get(&user).cloned()
    }

    fn all_slots(&self) -> Vec<Arc<Mutex<UserSession>>> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.values().cloned().collect()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn session(&self, user: UserId) -> SessionGuard {
        self.slot_or_insert(user).lock_owned().await
    }

    async fn existing_session(&self, user: UserId) -> Option<SessionGuard> {
        let slot = self.existing_slot(user)?;
        Some(slot.lock_owned().await)
    }

    async fn user_count(&self) -> usize {
        let mut count = 0;
        for slot in self.all_slots() {
            if slot.lock().await.record.is_some() {
                count += 1;
            }
        }
        count
    }
}
