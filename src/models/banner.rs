use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "banner_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BannerStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "banner_media_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BannerMediaType {
    Image,
    Video,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdBanner {
    pub id: Uuid,
    pub name: String,
    pub media_type: BannerMediaType,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub status: BannerStatus,
    pub placement: Vec<String>,
    pub is_vendor_specific: bool,
    pub vendor_id: Option<Uuid>,
    pub custom_url: Option<String>,
    pub active_from: Option<DateTime<Utc>>,
    pub active_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public listing row: banner with the linked vendor's display fields
/// flattened on for rendering.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActiveBanner {
    pub id: Uuid,
    pub name: String,
    pub media_type: BannerMediaType,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub placement: Vec<String>,
    pub is_vendor_specific: bool,
    pub vendor_id: Option<Uuid>,
    pub custom_url: Option<String>,
    pub active_from: Option<DateTime<Utc>>,
    pub active_until: Option<DateTime<Utc>>,
    pub vendor_slug: Option<String>,
    pub vendor_name: Option<String>,
    pub vendor_logo_url: Option<String>,
}

/// Fully-validated, normalized column values for an insert or full-row update.
#[derive(Debug, Clone)]
pub struct BannerRecord {
    pub name: String,
    pub media_type: BannerMediaType,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub status: BannerStatus,
    pub placement: Vec<String>,
    pub is_vendor_specific: bool,
    pub vendor_id: Option<Uuid>,
    pub custom_url: Option<String>,
    pub active_from: Option<DateTime<Utc>>,
    pub active_until: Option<DateTime<Utc>>,
}

/// Whitelisted sort keys for the admin listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerSort {
    Name,
    Status,
    CreatedAt,
    ActiveUntil,
}

impl BannerSort {
    fn column(self) -> &'static str {
        match self {
            BannerSort::Name => "name",
            BannerSort::Status => "status",
            BannerSort::CreatedAt => "created_at",
            BannerSort::ActiveUntil => "active_until",
        }
    }
}

impl AdBanner {
    pub async fn create(pool: &PgPool, record: BannerRecord) -> Result<Self, sqlx::Error> {
        let banner = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO ad_banners (
                name, media_type, image_url, video_url, status, placement,
                is_vendor_specific, vendor_id, custom_url, active_from, active_until
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&record.name)
        .bind(record.media_type)
        .bind(&record.image_url)
        .bind(&record.video_url)
        .bind(record.status)
        .bind(&record.placement)
        .bind(record.is_vendor_specific)
        .bind(record.vendor_id)
        .bind(&record.custom_url)
        .bind(record.active_from)
        .bind(record.active_until)
        .fetch_one(pool)
        .await?;

        Ok(banner)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let banner = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM ad_banners WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(banner)
    }

    /// Full-row update with a merged, re-validated record.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        record: BannerRecord,
    ) -> Result<Self, sqlx::Error> {
        let banner = sqlx::query_as::<_, Self>(
            r#"
            UPDATE ad_banners
            SET name = $2, media_type = $3, image_url = $4, video_url = $5,
                status = $6, placement = $7, is_vendor_specific = $8,
                vendor_id = $9, custom_url = $10, active_from = $11,
                active_until = $12, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&record.name)
        .bind(record.media_type)
        .bind(&record.image_url)
        .bind(&record.video_url)
        .bind(record.status)
        .bind(&record.placement)
        .bind(record.is_vendor_specific)
        .bind(record.vendor_id)
        .bind(&record.custom_url)
        .bind(record.active_from)
        .bind(record.active_until)
        .fetch_one(pool)
        .await?;

        Ok(banner)
    }

    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: BannerStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE ad_banners
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM ad_banners WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Active banners for public display, optionally restricted to a placement
    /// tag and to the current visibility window (null bounds are unbounded).
    pub async fn list_active(
        pool: &PgPool,
        placement: Option<&str>,
        within_window: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActiveBanner>, sqlx::Error> {
        let banners = sqlx::query_as::<_, ActiveBanner>(
            r#"
            SELECT b.id, b.name, b.media_type, b.image_url, b.video_url,
                   b.placement, b.is_vendor_specific, b.vendor_id, b.custom_url,
                   b.active_from, b.active_until,
                   v.slug AS vendor_slug, v.name AS vendor_name,
                   v.logo_url AS vendor_logo_url
            FROM ad_banners b
            LEFT JOIN vendors v ON v.id = b.vendor_id
            WHERE b.status = 'active'
              AND ($1::text IS NULL OR $1 = ANY(b.placement))
              AND (NOT $2 OR (
                    (b.active_from IS NULL OR b.active_from <= $3)
                AND (b.active_until IS NULL OR b.active_until >= $3)
              ))
            ORDER BY b.created_at DESC
            "#,
        )
        .bind(placement)
        .bind(within_window)
        .bind(now)
        .fetch_all(pool)
        .await?;

        Ok(banners)
    }

    /// Unpaginated admin listing with search, status and placement filters.
    pub async fn list_admin(
        pool: &PgPool,
        search: Option<&str>,
        status: Option<BannerStatus>,
        placements: Option<&[String]>,
        sort: BannerSort,
        descending: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let direction = if descending { "DESC" } else { "ASC" };
        let query = format!(
            r#"
            SELECT * FROM ad_banners
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
              AND ($2::banner_status IS NULL OR status = $2)
              AND ($3::text[] IS NULL OR placement && $3)
            ORDER BY {} {}
            "#,
            sort.column(),
            direction
        );

        let banners = sqlx::query_as::<_, Self>(&query)
            .bind(search)
            .bind(status)
            .bind(placements)
            .fetch_all(pool)
            .await?;

        Ok(banners)
    }
}
