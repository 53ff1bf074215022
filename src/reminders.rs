use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cron_utils::next_run_after;
use crate::traits::{Channel, DailyScheduler, ReminderTarget, UserStore};
use crate::types::UserId;

pub fn reminder_text(days: i64) -> String {
    format!("🗓️ It's been {} days since you set the date.", days)
}

struct Registration {
    /// Distinguishes this registration from a later one for the same user.
    generation: u64,
    cancel_token: CancellationToken,
}

/// Daily scheduler backed by one tokio task per registered user.
///
/// Each task sleeps until the next occurrence of the configured cron
/// expression (system timezone), fires its target and goes back to sleep
/// until its cancellation token is triggered.
pub struct CronScheduler {
    cron_expr: String,
    jobs: Arc<Mutex<HashMap<UserId, Registration>>>,
    next_generation: AtomicU64,
}

impl CronScheduler {
    /// `cron_expr` must already be validated (see [`crate::cron_utils::parse_schedule`]).
    pub fn new(cron_expr: impl Into<String>) -> Self {
        Self {
            cron_expr: cron_expr.into(),
            jobs: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(1),
        }
    }

    pub fn cron_expr(&self) -> &str {
        &self.cron_expr
    }

    /// Cancel every registration. Used on shutdown.
    pub async fn cancel_all(&self) {
        let mut jobs = self.jobs.lock().await;
        for (_, registration) in jobs.drain() {
            registration.cancel_token.cancel();
        }
    }

    async fn run_job(
        cron_expr: String,
        user: UserId,
        target: Arc<dyn ReminderTarget>,
        cancel_token: CancellationToken,
    ) -> anyhow::Result<()> {
        let mut after = Local::now();
        loop {
            let next = next_run_after(&cron_expr, &after)?;
            let wait = (next - Local::now()).to_std().unwrap_or(Duration::ZERO);
            debug!(user_id = user, next = %next, "Reminder sleeping until next run");

            tokio::select! {
                _ = cancel_token.cancelled() => return Ok(()),
                _ = tokio::time::sleep(wait) => {}
            }

            info!(user_id = user, "Firing daily reminder");
            target.fire(user).await;
            // A timer that wakes a little early must not fire the same occurrence twice.
            after = std::cmp::max(next, Local::now());
        }
    }
}

#[async_trait]
impl DailyScheduler for CronScheduler {
    async fn register(&self, user: UserId, target: Arc<dyn ReminderTarget>) -> anyhow::Result<()> {
        // Fail before touching the registry if the expression is unusable.
        next_run_after(&self.cron_expr, &Local::now())?;

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let cancel_token = CancellationToken::new();
        {
            let mut jobs = self.jobs.lock().await;
            let previous = jobs.insert(
                user,
                Registration {
                    generation,
                    cancel_token: cancel_token.clone(),
                },
            );
            if let Some(previous) = previous {
                previous.cancel_token.cancel();
                debug!(user_id = user, "Replaced existing reminder registration");
            }
        }

        let jobs = Arc::clone(&self.jobs);
        let cron_expr = self.cron_expr.clone();
        tokio::spawn(async move {
            if let Err(e) = Self::run_job(cron_expr, user, target, cancel_token).await {
                warn!(user_id = user, "Reminder job stopped: {}", e);
                // Only drop our own entry; a newer registration may have replaced it.
                let mut jobs = jobs.lock().await;
                if jobs.get(&user).is_some_and(|r| r.generation == generation) {
                    jobs.remove(&user);
                }
            }
        });

        info!(user_id = user, cron = %self.cron_expr, "Daily reminder registered");
        Ok(())
    }

    async fn cancel(&self, user: UserId) -> bool {
        let mut jobs = self.jobs.lock().await;
        match jobs.remove(&user) {
            Some(registration) => {
                registration.cancel_token.cancel();
                info!(user_id = user, "Daily reminder cancelled");
                true
            }
            None => false,
        }
    }

    async fn active_count(&self) -> usize {
        self.jobs.lock().await.len()
    }
}

/// Fired reminder: read the user's start date and send the day count.
pub struct DaysSinceReminder {
    store: Arc<dyn UserStore>,
    channel: Arc<dyn Channel>,
}

impl DaysSinceReminder {
    pub fn new(store: Arc<dyn UserStore>, channel: Arc<dyn Channel>) -> Self {
        Self { store, channel }
    }
}

#[async_trait]
impl ReminderTarget for DaysSinceReminder {
    async fn fire(&self, user: UserId) {
        let days = {
            let Some(session) = self.store.existing_session(user).await else {
                debug!(user_id = user, "Reminder fired for unknown user, skipping");
                return;
            };
            match session.record.as_ref() {
                Some(record) if record.reminders_enabled => {
                    record.days_since(Local::now().naive_local())
                }
                _ => {
                    debug!(user_id = user, "Reminders disabled, skipping");
                    return;
                }
            }
        };

        if let Err(e) = self.channel.send_text(user, &reminder_text(days)).await {
            warn!(user_id = user, "Failed to deliver reminder: {}", e);
        }
    }
}
