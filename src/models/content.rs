use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "content_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Page,
    Section,
    Faq,
    Setting,
}

/// Keyed content store: pages, sections, FAQs and settings, addressed by a
/// unique lowercase key with an opaque JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    pub id: Uuid,
    pub key: String,
    pub kind: ContentKind,
    pub content: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentEntry {
    pub async fn find_by_key(pool: &PgPool, key: &str) -> Result<Option<Self>, sqlx::Error> {
        let entry = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM content_entries WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(pool)
        .await?;

        Ok(entry)
    }

    pub async fn find_by_keys(pool: &PgPool, keys: &[String]) -> Result<Vec<Self>, sqlx::Error> {
        let entries = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM content_entries WHERE key = ANY($1)
            ORDER BY key
            "#,
        )
        .bind(keys)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }

    pub async fn list(pool: &PgPool, kind: Option<ContentKind>) -> Result<Vec<Self>, sqlx::Error> {
        let entries = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM content_entries
            WHERE ($1::content_kind IS NULL OR kind = $1)
            ORDER BY key
            "#,
        )
        .bind(kind)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }

    pub async fn upsert(
        pool: &PgPool,
        key: &str,
        kind: ContentKind,
        content: JsonValue,
    ) -> Result<Self, sqlx::Error> {
        let entry = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO content_entries (key, kind, content)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE
            SET kind = EXCLUDED.kind, content = EXCLUDED.content, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(key)
        .bind(kind)
        .bind(content)
        .fetch_one(pool)
        .await?;

        Ok(entry)
    }

    pub async fn delete_by_key(pool: &PgPool, key: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM content_entries WHERE key = $1
            "#,
        )
        .bind(key)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
