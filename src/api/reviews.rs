use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::middleware::{auth, session::AppState};
use crate::error::{AppError, Result};
use crate::models::account::AccountRole;
use crate::models::review::ReviewStatus;
use crate::services::reviews::{
    self, ModerationPatch, NewReview, PageParams, ReviewPage, ReviewPatch,
};

fn page_json(page: ReviewPage) -> Value {
    json!({
        "success": true,
        "reviews": page.reviews,
        "totalReviews": page.total,
        "totalPages": page.total_pages,
        "currentPage": page.page,
    })
}

#[derive(Deserialize)]
struct PublicListQuery {
    rating: Option<i16>,
    page: Option<i64>,
    limit: Option<i64>,
}

/// Approved reviews for a vendor, public, newest first.
async fn list_vendor_reviews(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
    Query(query): Query<PublicListQuery>,
) -> Result<Json<Value>> {
    let page = reviews::list_for_vendor_public(
        &state.pool,
        vendor_id,
        query.rating,
        PageParams::new(query.page, query.limit),
    )
    .await?;

    Ok(Json(page_json(page)))
}

#[derive(Deserialize)]
struct CreateReviewBody {
    rating: Option<i16>,
    comment: Option<String>,
}

async fn create_review(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
    session: Session,
    Json(body): Json<CreateReviewBody>,
) -> Result<Json<Value>> {
    let account = auth::current_account(&session, &state.pool).await?;
    if account.role != AccountRole::User {
        return Err(AppError::Forbidden(
            "Only customer accounts can review vendors".to_string(),
        ));
    }

    let rating = body
        .rating
        .ok_or_else(|| AppError::InvalidInput("Rating is required".to_string()))?;

    let review = reviews::create_review(
        &state.pool,
        vendor_id,
        account.id,
        NewReview {
            rating,
            comment: body.comment.unwrap_or_default(),
        },
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Review submitted and awaiting moderation",
        "review": review,
    })))
}

#[derive(Deserialize)]
struct UpdateReviewBody {
    rating: Option<i16>,
    comment: Option<String>,
}

async fn update_review(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
    session: Session,
    Json(body): Json<UpdateReviewBody>,
) -> Result<Json<Value>> {
    let account = auth::current_account(&session, &state.pool).await?;

    let review = reviews::update_review(
        &state.pool,
        review_id,
        account.id,
        ReviewPatch {
            rating: body.rating,
            comment: body.comment,
        },
    )
    .await?;

    Ok(Json(json!({ "success": true, "review": review })))
}

async fn delete_review(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
    session: Session,
) -> Result<Json<Value>> {
    let account = auth::current_account(&session, &state.pool).await?;

    reviews::delete_review(
        &state.pool,
        review_id,
        account.id,
        account.role == AccountRole::Admin,
    )
    .await?;

    Ok(Json(
        json!({ "success": true, "message": "Review deleted" }),
    ))
}

#[derive(Deserialize)]
struct PrivilegedListQuery {
    status: Option<ReviewStatus>,
    rating: Option<i16>,
    search: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

/// All-status listing for the vendor dashboard and admin review queues.
async fn list_vendor_reviews_privileged(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
    session: Session,
    Query(query): Query<PrivilegedListQuery>,
) -> Result<Json<Value>> {
    auth::require_vendor_or_admin(&session, &state.pool, vendor_id).await?;

    let page = reviews::list_for_vendor_privileged(
        &state.pool,
        vendor_id,
        query.status,
        query.rating,
        query.search,
        PageParams::new(query.page, query.limit),
    )
    .await?;

    Ok(Json(page_json(page)))
}

async fn flag_review(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
    session: Session,
) -> Result<Json<Value>> {
    let (_, vendor_id) = auth::require_vendor(&session, &state.pool).await?;

    let review = reviews::flag_review(&state.pool, review_id, vendor_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Review flagged for removal and awaiting re-review",
        "review": review,
    })))
}

#[derive(Deserialize)]
struct AdminListQuery {
    status: Option<ReviewStatus>,
    rating: Option<i16>,
    search: Option<String>,
    flagged: Option<bool>,
    page: Option<i64>,
    limit: Option<i64>,
}

async fn list_all_reviews(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Value>> {
    auth::require_admin(&session, &state.pool).await?;

    let page = reviews::list_all_admin(
        &state.pool,
        query.status,
        query.rating,
        query.search,
        query.flagged.unwrap_or(false),
        PageParams::new(query.page, query.limit),
    )
    .await?;

    Ok(Json(page_json(page)))
}

async fn list_flagged_reviews(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Value>> {
    auth::require_admin(&session, &state.pool).await?;

    let page = reviews::list_all_admin(
        &state.pool,
        query.status,
        query.rating,
        query.search,
        true,
        PageParams::new(query.page, query.limit),
    )
    .await?;

    Ok(Json(page_json(page)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModerateReviewBody {
    status: Option<ReviewStatus>,
    flagged_for_removal: Option<bool>,
}

async fn moderate_review(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
    session: Session,
    Json(body): Json<ModerateReviewBody>,
) -> Result<Json<Value>> {
    auth::require_admin(&session, &state.pool).await?;

    let review = reviews::moderate_review(
        &state.pool,
        review_id,
        ModerationPatch {
            status: body.status,
            flagged_for_removal: body.flagged_for_removal,
        },
    )
    .await?;

    Ok(Json(json!({ "success": true, "review": review })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reviews/vendor/:vendor_id", get(list_vendor_reviews))
        .route("/reviews/new/:vendor_id", post(create_review))
        .route(
            "/reviews/vendor/all/:vendor_id",
            get(list_vendor_reviews_privileged),
        )
        .route("/reviews/flag/:review_id", patch(flag_review))
        .route("/reviews/admin/all", get(list_all_reviews))
        .route("/reviews/admin/flagged", get(list_flagged_reviews))
        .route("/reviews/admin/:review_id", patch(moderate_review))
        .route(
            "/reviews/:review_id",
            patch(update_review).delete(delete_review),
        )
}
