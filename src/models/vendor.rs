use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vendor_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VendorStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub contact_email: String,
    pub vendor_status: VendorStatus,
    pub subscription_start_date: Option<DateTime<Utc>>,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub bundle_id: Option<Uuid>,
    // Derived rating fields, written only by the rating aggregator
    pub average_rating: f64,
    pub review_count: i64,
    pub rating_breakdown: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape used by the subscription sweep: vendor joined with its bundle.
#[derive(Debug, Clone, FromRow)]
pub struct VendorWithBundle {
    pub id: Uuid,
    pub name: String,
    pub contact_email: String,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub bundle_name: Option<String>,
    pub bundle_price: Option<f64>,
}

impl Vendor {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let vendor = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM vendors WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(vendor)
    }

    /// Writes the three derived rating fields and nothing else.
    pub async fn set_rating_fields(
        pool: &PgPool,
        id: Uuid,
        average_rating: f64,
        review_count: i64,
        rating_breakdown: JsonValue,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE vendors
            SET average_rating = $2, review_count = $3, rating_breakdown = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(average_rating)
        .bind(review_count)
        .bind(rating_breakdown)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: VendorStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE vendors
            SET vendor_status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Approved vendors whose subscription ends within `[from, to)`.
    pub async fn approved_ending_within(
        pool: &PgPool,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<VendorWithBundle>, sqlx::Error> {
        let vendors = sqlx::query_as::<_, VendorWithBundle>(
            r#"
            SELECT v.id, v.name, v.contact_email, v.subscription_end_date,
                   b.name AS bundle_name, b.price AS bundle_price
            FROM vendors v
            LEFT JOIN bundles b ON b.id = v.bundle_id
            WHERE v.vendor_status = 'approved'
              AND v.subscription_end_date >= $1
              AND v.subscription_end_date < $2
            ORDER BY v.subscription_end_date
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;

        Ok(vendors)
    }

    /// Approved vendors whose subscription end date is strictly in the past.
    pub async fn approved_expired(
        pool: &PgPool,
        now: DateTime<Utc>,
    ) -> Result<Vec<VendorWithBundle>, sqlx::Error> {
        let vendors = sqlx::query_as::<_, VendorWithBundle>(
            r#"
            SELECT v.id, v.name, v.contact_email, v.subscription_end_date,
                   b.name AS bundle_name, b.price AS bundle_price
            FROM vendors v
            LEFT JOIN bundles b ON b.id = v.bundle_id
            WHERE v.vendor_status = 'approved'
              AND v.subscription_end_date IS NOT NULL
              AND v.subscription_end_date < $1
            ORDER BY v.subscription_end_date
            "#,
        )
        .bind(now)
        .fetch_all(pool)
        .await?;

        Ok(vendors)
    }
}
