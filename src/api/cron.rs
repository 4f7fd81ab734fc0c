use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::api::middleware::session::AppState;
use crate::error::{AppError, Result};
use crate::jobs::{banner_sweeper, subscription_checker};

/// Manual triggers for the scheduled sweeps. Only mounted when
/// `enable_test_routes` is set; intended for development and smoke tests.
async fn deactivate_banners(State(state): State<AppState>) -> Result<Json<Value>> {
    let stats = banner_sweeper::deactivate_expired_banners(&state.pool)
        .await
        .map_err(AppError::Database)?;

    Ok(Json(json!({ "success": true, "stats": stats })))
}

async fn expire_vendors(State(state): State<AppState>) -> Result<Json<Value>> {
    let stats = subscription_checker::run_subscription_sweep(&state.pool, &state.mailer)
        .await
        .map_err(AppError::Database)?;

    Ok(Json(json!({ "success": true, "stats": stats })))
}

async fn run_all(State(state): State<AppState>) -> Result<Json<Value>> {
    let banner_stats = banner_sweeper::deactivate_expired_banners(&state.pool)
        .await
        .map_err(AppError::Database)?;
    let subscription_stats =
        subscription_checker::run_subscription_sweep(&state.pool, &state.mailer)
            .await
            .map_err(AppError::Database)?;

    Ok(Json(json!({
        "success": true,
        "banners": banner_stats,
        "subscriptions": subscription_stats,
    })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/test/cron/deactivate-banners", get(deactivate_banners))
        .route("/test/cron/expire-vendors", get(expire_vendors))
        .route("/test/cron/run-all", get(run_all))
}
