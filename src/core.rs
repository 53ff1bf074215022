use std::sync::Arc;

use tracing::{error, info};

use crate::channels::{spawn_telegram_channel, TelegramChannel};
use crate::config::AppConfig;
use crate::cron_utils::{compute_next_run_local, system_timezone_display};
use crate::daemon::{self, HealthState};
use crate::dialog::Dialog;
use crate::reminders::CronScheduler;
use crate::state::InMemoryUserStore;
use crate::traits::{Channel, DailyScheduler, UserStore};

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    // 1. State store
    let store: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
    info!("In-memory user store initialized");

    // 2. Reminder scheduler
    let cron_expr = config.reminders.cron_expr()?;
    let scheduler = Arc::new(CronScheduler::new(cron_expr.clone()));
    info!(
        schedule = %config.reminders.schedule,
        cron = %scheduler.cron_expr(),
        timezone = %system_timezone_display(),
        next = %compute_next_run_local(&cron_expr)?,
        "Reminder scheduler configured"
    );

    // 3. Transport
    let telegram = Arc::new(TelegramChannel::new(
        &config.telegram.bot_token,
        config.telegram.allowed_user_ids.clone(),
    ));
    let channel: Arc<dyn Channel> = telegram.clone();
    info!(
        channel = %channel.name(),
        allowed_users = config.telegram.allowed_user_ids.len(),
        "Channel configured"
    );

    // 4. Dialog controller
    let dialog = Arc::new(Dialog::new(
        store.clone(),
        channel,
        scheduler.clone() as Arc<dyn DailyScheduler>,
    ));

    // 5. Health server
    if config.daemon.health_port != 0 {
        let state = HealthState {
            store: store.clone(),
            scheduler: scheduler.clone(),
        };
        let bind = config.daemon.health_bind.clone();
        let port = config.daemon.health_port;
        tokio::spawn(async move {
            if let Err(e) = daemon::start_health_server(&bind, port, state).await {
                error!("Health server error: {}", e);
            }
        });
    }

    // 6. Telegram dispatcher
    spawn_telegram_channel(telegram, dialog);
    info!("daytally running");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    scheduler.cancel_all().await;
    Ok(())
}
