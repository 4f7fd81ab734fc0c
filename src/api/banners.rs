use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::middleware::{auth, session::AppState};
use crate::error::{AppError, Result};
use crate::models::banner::{BannerMediaType, BannerStatus};
use crate::services::banners::{self, BannerDraft, BannerPatch};

fn parse_vendor_id(raw: Option<&str>) -> Result<Option<Uuid>> {
    match raw {
        None => Ok(None),
        Some(s) => Uuid::parse_str(s)
            .map(Some)
            .map_err(|_| AppError::InvalidInput("Invalid vendor id".to_string())),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicListQuery {
    placement: Option<String>,
    #[serde(default)]
    within_window: bool,
}

/// Active banners for public display.
async fn list_active_banners(
    State(state): State<AppState>,
    Query(query): Query<PublicListQuery>,
) -> Result<Json<Value>> {
    let banners =
        banners::list_active(&state.pool, query.placement.as_deref(), query.within_window).await?;

    Ok(Json(json!({
        "success": true,
        "count": banners.len(),
        "banners": banners,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBannerBody {
    name: Option<String>,
    media_type: Option<BannerMediaType>,
    image_url: Option<String>,
    video_url: Option<String>,
    status: Option<BannerStatus>,
    #[serde(default)]
    placement: Vec<String>,
    #[serde(default)]
    is_vendor_specific: bool,
    // Vendor id arrives as a string and is rejected before any lookup if malformed
    vendor: Option<String>,
    custom_url: Option<String>,
    active_from: Option<DateTime<Utc>>,
    active_until: Option<DateTime<Utc>>,
}

async fn create_banner(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CreateBannerBody>,
) -> Result<Json<Value>> {
    auth::require_admin(&session, &state.pool).await?;

    let vendor_id = parse_vendor_id(body.vendor.as_deref())?;

    let banner = banners::create_banner(
        &state.pool,
        BannerDraft {
            name: body.name.unwrap_or_default(),
            media_type: body.media_type.unwrap_or(BannerMediaType::Image),
            image_url: body.image_url,
            video_url: body.video_url,
            status: body.status.unwrap_or(BannerStatus::Active),
            placement: body.placement,
            is_vendor_specific: body.is_vendor_specific,
            vendor_id,
            custom_url: body.custom_url,
            active_from: body.active_from,
            active_until: body.active_until,
        },
    )
    .await?;

    Ok(Json(json!({ "success": true, "banner": banner })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBannerBody {
    name: Option<String>,
    media_type: Option<BannerMediaType>,
    image_url: Option<String>,
    video_url: Option<String>,
    status: Option<BannerStatus>,
    placement: Option<Vec<String>>,
    is_vendor_specific: Option<bool>,
    vendor: Option<String>,
    custom_url: Option<String>,
    active_from: Option<DateTime<Utc>>,
    active_until: Option<DateTime<Utc>>,
}

async fn update_banner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    session: Session,
    Json(body): Json<UpdateBannerBody>,
) -> Result<Json<Value>> {
    auth::require_admin(&session, &state.pool).await?;

    let vendor_id = parse_vendor_id(body.vendor.as_deref())?;

    let banner = banners::update_banner(
        &state.pool,
        id,
        BannerPatch {
            name: body.name,
            media_type: body.media_type,
            image_url: body.image_url,
            video_url: body.video_url,
            status: body.status,
            placement: body.placement,
            is_vendor_specific: body.is_vendor_specific,
            vendor_id,
            custom_url: body.custom_url,
            active_from: body.active_from,
            active_until: body.active_until,
        },
    )
    .await?;

    Ok(Json(json!({ "success": true, "banner": banner })))
}

async fn toggle_banner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    session: Session,
) -> Result<Json<Value>> {
    auth::require_admin(&session, &state.pool).await?;

    let banner = banners::toggle_banner_status(&state.pool, id).await?;

    Ok(Json(json!({ "success": true, "banner": banner })))
}

async fn delete_banner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    session: Session,
) -> Result<Json<Value>> {
    auth::require_admin(&session, &state.pool).await?;

    banners::delete_banner(&state.pool, id).await?;

    Ok(Json(
        json!({ "success": true, "message": "Banner deleted" }),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminListQuery {
    search: Option<String>,
    status: Option<BannerStatus>,
    // Comma-separated placement tags
    placement: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
}

async fn list_all_banners(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Value>> {
    auth::require_admin(&session, &state.pool).await?;

    let placements: Option<Vec<String>> = query.placement.map(|p| {
        p.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    });

    let banners = banners::list_admin(
        &state.pool,
        query.search.as_deref(),
        query.status,
        placements.as_deref(),
        query.sort_by.as_deref(),
        query.sort_order.as_deref(),
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "count": banners.len(),
        "banners": banners,
    })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/banners", get(list_active_banners))
        .route("/admin/banners", get(list_all_banners).post(create_banner))
        .route(
            "/admin/banners/:id",
            put(update_banner).delete(delete_banner),
        )
        .route("/admin/banners/:id/toggle", patch(toggle_banner))
}
