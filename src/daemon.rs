use std::sync::Arc;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde_json::json;
use tracing::info;

use crate::traits::{DailyScheduler, UserStore};

#[derive(Clone)]
pub struct HealthState {
    pub store: Arc<dyn UserStore>,
    pub scheduler: Arc<dyn DailyScheduler>,
}

/// Start the health check HTTP server.
pub async fn start_health_server(bind: &str, port: u16, state: HealthState) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/health", get(health_handler))
        .with_state(state);

    let addr: std::net::SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid health bind address '{}:{}': {}", bind, port, e))?;
    info!("Health server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler(State(state): State<HealthState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "users": state.store.user_count().await,
        "active_reminders": state.scheduler.active_count().await,
    }))
}
