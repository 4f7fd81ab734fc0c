use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateContactData {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

impl ContactMessage {
    pub async fn create(pool: &PgPool, data: CreateContactData) -> Result<Self, sqlx::Error> {
        let message = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO contact_messages (name, email, subject, message)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.subject)
        .bind(&data.message)
        .fetch_one(pool)
        .await?;

        Ok(message)
    }

    pub async fn list(pool: &PgPool, unread_only: bool) -> Result<Vec<Self>, sqlx::Error> {
        let messages = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM contact_messages
            WHERE (NOT $1 OR NOT is_read)
            ORDER BY created_at DESC
            "#,
        )
        .bind(unread_only)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }

    pub async fn mark_read(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE contact_messages SET is_read = TRUE WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM contact_messages WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
