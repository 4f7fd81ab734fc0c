use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;

use crate::api::middleware::{auth, session::AppState};
use crate::error::{AppError, Result};
use crate::models::content::{ContentEntry, ContentKind};

fn normalize_key(raw: &str) -> Result<String> {
    let key = raw.trim().to_lowercase();
    if key.is_empty() {
        return Err(AppError::InvalidInput(
            "Content key is required".to_string(),
        ));
    }
    Ok(key)
}

async fn get_content(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>> {
    let key = normalize_key(&key)?;
    let entry = ContentEntry::find_by_key(&state.pool, &key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No content for key '{}'", key)))?;

    Ok(Json(json!({ "success": true, "content": entry })))
}

#[derive(Deserialize)]
struct BulkContentBody {
    keys: Vec<String>,
}

/// Fetch several entries in one round-trip; unknown keys are simply absent
/// from the result.
async fn get_content_bulk(
    State(state): State<AppState>,
    Json(body): Json<BulkContentBody>,
) -> Result<Json<Value>> {
    if body.keys.is_empty() {
        return Err(AppError::InvalidInput(
            "At least one content key is required".to_string(),
        ));
    }

    let keys: Vec<String> = body
        .keys
        .iter()
        .map(|k| normalize_key(k))
        .collect::<Result<_>>()?;

    let entries = ContentEntry::find_by_keys(&state.pool, &keys).await?;

    Ok(Json(json!({ "success": true, "contents": entries })))
}

#[derive(Deserialize)]
struct AdminListQuery {
    kind: Option<ContentKind>,
}

async fn list_content(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Value>> {
    auth::require_admin(&session, &state.pool).await?;

    let entries = ContentEntry::list(&state.pool, query.kind).await?;

    Ok(Json(json!({
        "success": true,
        "count": entries.len(),
        "contents": entries,
    })))
}

#[derive(Deserialize)]
struct UpsertContentBody {
    key: String,
    kind: ContentKind,
    content: Value,
}

async fn upsert_content(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<UpsertContentBody>,
) -> Result<Json<Value>> {
    auth::require_admin(&session, &state.pool).await?;

    let key = normalize_key(&body.key)?;
    let entry = ContentEntry::upsert(&state.pool, &key, body.kind, body.content).await?;

    tracing::info!(key = %entry.key, kind = ?entry.kind, "Content entry saved");

    Ok(Json(json!({ "success": true, "content": entry })))
}

async fn delete_content(
    State(state): State<AppState>,
    Path(key): Path<String>,
    session: Session,
) -> Result<Json<Value>> {
    auth::require_admin(&session, &state.pool).await?;

    let key = normalize_key(&key)?;
    let deleted = ContentEntry::delete_by_key(&state.pool, &key).await?;
    if deleted == 0 {
        return Err(AppError::NotFound(format!("No content for key '{}'", key)));
    }

    Ok(Json(
        json!({ "success": true, "message": "Content deleted" }),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/content/bulk", post(get_content_bulk))
        .route("/content/:key", get(get_content))
        .route("/admin/content", get(list_content).post(upsert_content))
        .route("/admin/content/:key", axum::routing::delete(delete_content))
}
