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
use crate::models::contact::{ContactMessage, CreateContactData};

#[derive(Deserialize)]
struct ContactBody {
    name: String,
    email: String,
    subject: Option<String>,
    message: String,
}

async fn submit_contact(
    State(state): State<AppState>,
    Json(body): Json<ContactBody>,
) -> Result<Json<Value>> {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::InvalidInput("Name is required".to_string()));
    }

    let email = body.email.trim().to_string();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::InvalidInput(
            "A valid email address is required".to_string(),
        ));
    }

    let message = body.message.trim().to_string();
    if message.is_empty() {
        return Err(AppError::InvalidInput("Message is required".to_string()));
    }

    let saved = ContactMessage::create(
        &state.pool,
        CreateContactData {
            name,
            email,
            subject: body
                .subject
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            message,
        },
    )
    .await?;

    tracing::info!(message_id = %saved.id, "Contact message received");

    Ok(Json(json!({
        "success": true,
        "message": "Thanks for reaching out, we'll get back to you soon",
    })))
}

#[derive(Deserialize)]
struct AdminListQuery {
    #[serde(default)]
    unread: bool,
}

async fn list_contact_messages(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Value>> {
    auth::require_admin(&session, &state.pool).await?;

    let messages = ContactMessage::list(&state.pool, query.unread).await?;

    Ok(Json(json!({
        "success": true,
        "count": messages.len(),
        "messages": messages,
    })))
}

async fn mark_contact_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    session: Session,
) -> Result<Json<Value>> {
    auth::require_admin(&session, &state.pool).await?;

    let updated = ContactMessage::mark_read(&state.pool, id).await?;
    if updated == 0 {
        return Err(AppError::NotFound("Contact message not found".to_string()));
    }

    Ok(Json(
        json!({ "success": true, "message": "Marked as read" }),
    ))
}

async fn delete_contact_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    session: Session,
) -> Result<Json<Value>> {
    auth::require_admin(&session, &state.pool).await?;

    let deleted = ContactMessage::delete(&state.pool, id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Contact message not found".to_string()));
    }

    Ok(Json(
        json!({ "success": true, "message": "Contact message deleted" }),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/contact", post(submit_contact))
        .route("/admin/contact", get(list_contact_messages))
        .route("/admin/contact/:id/read", patch(mark_contact_read))
        .route(
            "/admin/contact/:id",
            axum::routing::delete(delete_contact_message),
        )
}
