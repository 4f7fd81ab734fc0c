use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "review_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub author_id: Uuid,
    pub rating: i16,
    pub comment: String,
    pub status: ReviewStatus,
    pub flagged_for_removal: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing row: review joined with the author's display name.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithAuthor {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub rating: i16,
    pub comment: String,
    pub status: ReviewStatus,
    pub flagged_for_removal: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateReviewData {
    pub vendor_id: Uuid,
    pub author_id: Uuid,
    pub rating: i16,
    pub comment: String,
}

/// Filter shared by the public, vendor and admin listings. Unset fields do not
/// constrain the result.
#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub vendor_id: Option<Uuid>,
    pub status: Option<ReviewStatus>,
    pub rating: Option<i16>,
    pub search: Option<String>,
    pub flagged_only: bool,
}

impl Review {
    pub async fn create(pool: &PgPool, data: CreateReviewData) -> Result<Self, sqlx::Error> {
        let review = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO reviews (vendor_id, author_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(data.vendor_id)
        .bind(data.author_id)
        .bind(data.rating)
        .bind(&data.comment)
        .fetch_one(pool)
        .await?;

        Ok(review)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let review = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM reviews WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(review)
    }

    pub async fn exists_for_author(
        pool: &PgPool,
        vendor_id: Uuid,
        author_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM reviews WHERE vendor_id = $1 AND author_id = $2
            )
            "#,
        )
        .bind(vendor_id)
        .bind(author_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Partial update of the author-editable fields.
    pub async fn update_fields(
        pool: &PgPool,
        id: Uuid,
        rating: Option<i16>,
        comment: Option<String>,
    ) -> Result<Self, sqlx::Error> {
        let review = sqlx::query_as::<_, Self>(
            r#"
            UPDATE reviews
            SET rating = COALESCE($2, rating),
                comment = COALESCE($3, comment),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(rating)
        .bind(comment)
        .fetch_one(pool)
        .await?;

        Ok(review)
    }

    pub async fn set_moderation(
        pool: &PgPool,
        id: Uuid,
        status: ReviewStatus,
        flagged_for_removal: bool,
    ) -> Result<Self, sqlx::Error> {
        let review = sqlx::query_as::<_, Self>(
            r#"
            UPDATE reviews
            SET status = $2, flagged_for_removal = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(flagged_for_removal)
        .fetch_one(pool)
        .await?;

        Ok(review)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM reviews WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Ratings of the vendor's currently-approved reviews, for aggregation.
    pub async fn approved_ratings(pool: &PgPool, vendor_id: Uuid) -> Result<Vec<i16>, sqlx::Error> {
        let ratings = sqlx::query_scalar::<_, i16>(
            r#"
            SELECT rating FROM reviews
            WHERE vendor_id = $1 AND status = 'approved'
            "#,
        )
        .bind(vendor_id)
        .fetch_all(pool)
        .await?;

        Ok(ratings)
    }

    /// Filtered listing, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &ReviewFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ReviewWithAuthor>, sqlx::Error> {
        let reviews = sqlx::query_as::<_, ReviewWithAuthor>(
            r#"
            SELECT r.*, a.display_name AS author_name
            FROM reviews r
            JOIN accounts a ON a.id = r.author_id
            WHERE ($1::uuid IS NULL OR r.vendor_id = $1)
              AND ($2::review_status IS NULL OR r.status = $2)
              AND ($3::smallint IS NULL OR r.rating = $3)
              AND ($4::text IS NULL OR r.comment ILIKE '%' || $4 || '%')
              AND (NOT $5 OR r.flagged_for_removal)
            ORDER BY r.created_at DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(filter.vendor_id)
        .bind(filter.status)
        .bind(filter.rating)
        .bind(filter.search.as_deref())
        .bind(filter.flagged_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(reviews)
    }

    pub async fn count(pool: &PgPool, filter: &ReviewFilter) -> Result<i64, sqlx::Error> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM reviews r
            WHERE ($1::uuid IS NULL OR r.vendor_id = $1)
              AND ($2::review_status IS NULL OR r.status = $2)
              AND ($3::smallint IS NULL OR r.rating = $3)
              AND ($4::text IS NULL OR r.comment ILIKE '%' || $4 || '%')
              AND (NOT $5 OR r.flagged_for_removal)
            "#,
        )
        .bind(filter.vendor_id)
        .bind(filter.status)
        .bind(filter.rating)
        .bind(filter.search.as_deref())
        .bind(filter.flagged_only)
        .fetch_one(pool)
        .await?;

        Ok(total)
    }
}
