use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    banner::{ActiveBanner, AdBanner, BannerMediaType, BannerRecord, BannerSort, BannerStatus},
    vendor::Vendor,
};

#[derive(thiserror::Error, Debug)]
pub enum BannerError {
    #[error("Banner not found")]
    NotFound,

    #[error("Vendor not found")]
    VendorNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<BannerError> for AppError {
    fn from(e: BannerError) -> Self {
        match e {
            BannerError::NotFound => AppError::NotFound("Banner not found".to_string()),
            BannerError::VendorNotFound => AppError::NotFound("Vendor not found".to_string()),
            BannerError::Validation(msg) => AppError::InvalidInput(msg),
            BannerError::Database(e) => AppError::Database(e),
        }
    }
}

/// Draft banner fields before validation and targeting normalization.
#[derive(Debug, Clone)]
pub struct BannerDraft {
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

/// Partial fields for an update; unset fields keep the stored value.
#[derive(Debug, Clone, Default)]
pub struct BannerPatch {
    pub name: Option<String>,
    pub media_type: Option<BannerMediaType>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub status: Option<BannerStatus>,
    pub placement: Option<Vec<String>>,
    pub is_vendor_specific: Option<bool>,
    pub vendor_id: Option<Uuid>,
    pub custom_url: Option<String>,
    pub active_from: Option<DateTime<Utc>>,
    pub active_until: Option<DateTime<Utc>>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Validates a draft and normalizes the mutually-exclusive targeting payload:
/// a vendor-specific banner carries a vendor link and no custom URL, a custom
/// banner carries a URL and no vendor link. Runs on create and on every
/// update, against the merged document.
pub fn validate_and_normalize(draft: BannerDraft) -> Result<BannerRecord, BannerError> {
    let name = draft.name.trim().to_string();
    if name.is_empty() {
        return Err(BannerError::Validation(
            "Banner name is required".to_string(),
        ));
    }

    let placement: Vec<String> = draft
        .placement
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if placement.is_empty() {
        return Err(BannerError::Validation(
            "At least one placement is required".to_string(),
        ));
    }

    let image_url = non_blank(draft.image_url);
    let video_url = non_blank(draft.video_url);
    let (image_url, video_url) = match draft.media_type {
        BannerMediaType::Image => {
            if image_url.is_none() {
                return Err(BannerError::Validation(
                    "Image URL is required for image banners".to_string(),
                ));
            }
            (image_url, None)
        }
        BannerMediaType::Video => {
            if video_url.is_none() {
                return Err(BannerError::Validation(
                    "Video URL is required for video banners".to_string(),
                ));
            }
            (None, video_url)
        }
    };

    let (vendor_id, custom_url) = if draft.is_vendor_specific {
        let vendor_id = draft.vendor_id.ok_or_else(|| {
            BannerError::Validation("Vendor is required for vendor-specific banners".to_string())
        })?;
        (Some(vendor_id), None)
    } else {
        let custom_url = non_blank(draft.custom_url).ok_or_else(|| {
            BannerError::Validation("Custom URL is required for non-vendor banners".to_string())
        })?;
        (None, Some(custom_url))
    };

    if let (Some(from), Some(until)) = (draft.active_from, draft.active_until) {
        if until <= from {
            return Err(BannerError::Validation(
                "activeUntil must be after activeFrom".to_string(),
            ));
        }
    }

    Ok(BannerRecord {
        name,
        media_type: draft.media_type,
        image_url,
        video_url,
        status: draft.status,
        placement,
        is_vendor_specific: draft.is_vendor_specific,
        vendor_id,
        custom_url,
        active_from: draft.active_from,
        active_until: draft.active_until,
    })
}

/// Merges a patch onto a stored banner, producing the draft that is then
/// re-validated with the create rules.
pub fn merge_patch(existing: &AdBanner, patch: BannerPatch) -> BannerDraft {
    BannerDraft {
        name: patch.name.unwrap_or_else(|| existing.name.clone()),
        media_type: patch.media_type.unwrap_or(existing.media_type),
        image_url: patch.image_url.or_else(|| existing.image_url.clone()),
        video_url: patch.video_url.or_else(|| existing.video_url.clone()),
        status: patch.status.unwrap_or(existing.status),
        placement: patch
            .placement
            .unwrap_or_else(|| existing.placement.clone()),
        is_vendor_specific: patch
            .is_vendor_specific
            .unwrap_or(existing.is_vendor_specific),
        vendor_id: patch.vendor_id.or(existing.vendor_id),
        custom_url: patch.custom_url.or_else(|| existing.custom_url.clone()),
        active_from: patch.active_from.or(existing.active_from),
        active_until: patch.active_until.or(existing.active_until),
    }
}

async fn check_vendor_exists(pool: &PgPool, record: &BannerRecord) -> Result<(), BannerError> {
    if let Some(vendor_id) = record.vendor_id {
        Vendor::find_by_id(pool, vendor_id)
            .await?
            .ok_or(BannerError::VendorNotFound)?;
    }
    Ok(())
}

pub async fn create_banner(pool: &PgPool, draft: BannerDraft) -> Result<AdBanner, BannerError> {
    let record = validate_and_normalize(draft)?;
    check_vendor_exists(pool, &record).await?;

    let banner = AdBanner::create(pool, record).await?;

    tracing::info!(banner_id = %banner.id, name = %banner.name, "Banner created");

    Ok(banner)
}

pub async fn update_banner(
    pool: &PgPool,
    id: Uuid,
    patch: BannerPatch,
) -> Result<AdBanner, BannerError> {
    let existing = AdBanner::find_by_id(pool, id)
        .await?
        .ok_or(BannerError::NotFound)?;

    let record = validate_and_normalize(merge_patch(&existing, patch))?;
    check_vendor_exists(pool, &record).await?;

    let banner = AdBanner::update(pool, id, record).await?;

    tracing::info!(banner_id = %banner.id, "Banner updated");

    Ok(banner)
}

pub async fn toggle_banner_status(pool: &PgPool, id: Uuid) -> Result<AdBanner, BannerError> {
    let banner = AdBanner::find_by_id(pool, id)
        .await?
        .ok_or(BannerError::NotFound)?;

    let new_status = match banner.status {
        BannerStatus::Active => BannerStatus::Inactive,
        BannerStatus::Inactive => BannerStatus::Active,
    };

    AdBanner::set_status(pool, id, new_status).await?;

    tracing::info!(banner_id = %id, status = ?new_status, "Banner status toggled");

    AdBanner::find_by_id(pool, id)
        .await?
        .ok_or(BannerError::NotFound)
}

pub async fn delete_banner(pool: &PgPool, id: Uuid) -> Result<(), BannerError> {
    let deleted = AdBanner::delete(pool, id).await?;
    if deleted == 0 {
        return Err(BannerError::NotFound);
    }

    tracing::info!(banner_id = %id, "Banner deleted");

    Ok(())
}

pub async fn list_active(
    pool: &PgPool,
    placement: Option<&str>,
    within_window: bool,
) -> Result<Vec<ActiveBanner>, BannerError> {
    Ok(AdBanner::list_active(pool, placement, within_window, Utc::now()).await?)
}

pub fn parse_sort(sort_by: Option<&str>) -> BannerSort {
    match sort_by {
        Some("name") => BannerSort::Name,
        Some("status") => BannerSort::Status,
        Some("activeUntil") | Some("active_until") => BannerSort::ActiveUntil,
        _ => BannerSort::CreatedAt,
    }
}

pub async fn list_admin(
    pool: &PgPool,
    search: Option<&str>,
    status: Option<BannerStatus>,
    placements: Option<&[String]>,
    sort_by: Option<&str>,
    sort_order: Option<&str>,
) -> Result<Vec<AdBanner>, BannerError> {
    let descending = !matches!(sort_order, Some("asc"));
    Ok(AdBanner::list_admin(
        pool,
        search,
        status,
        placements,
        parse_sort(sort_by),
        descending,
    )
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vendor_draft(vendor_id: Option<Uuid>) -> BannerDraft {
        BannerDraft {
            name: "Summer promo".to_string(),
            media_type: BannerMediaType::Image,
            image_url: Some("https://cdn.example.com/promo.png".to_string()),
            video_url: None,
            status: BannerStatus::Active,
            placement: vec!["home".to_string()],
            is_vendor_specific: true,
            vendor_id,
            custom_url: Some("https://example.com/ignored".to_string()),
            active_from: None,
            active_until: None,
        }
    }

    fn custom_draft(custom_url: Option<&str>) -> BannerDraft {
        BannerDraft {
            name: "Sale".to_string(),
            media_type: BannerMediaType::Image,
            image_url: Some("https://cdn.example.com/sale.png".to_string()),
            video_url: None,
            status: BannerStatus::Active,
            placement: vec!["category".to_string()],
            is_vendor_specific: false,
            vendor_id: Some(Uuid::new_v4()),
            custom_url: custom_url.map(String::from),
            active_from: None,
            active_until: None,
        }
    }

    #[test]
    fn vendor_specific_requires_vendor() {
        assert!(matches!(
            validate_and_normalize(vendor_draft(None)),
            Err(BannerError::Validation(_))
        ));
    }

    #[test]
    fn vendor_specific_clears_custom_url() {
        let record = validate_and_normalize(vendor_draft(Some(Uuid::new_v4()))).unwrap();
        assert!(record.vendor_id.is_some());
        assert!(record.custom_url.is_none());
    }

    #[test]
    fn custom_banner_requires_url_and_clears_vendor() {
        assert!(matches!(
            validate_and_normalize(custom_draft(None)),
            Err(BannerError::Validation(_))
        ));

        let record =
            validate_and_normalize(custom_draft(Some("https://example.com/sale"))).unwrap();
        assert!(record.vendor_id.is_none());
        assert_eq!(
            record.custom_url.as_deref(),
            Some("https://example.com/sale")
        );
    }

    #[test]
    fn placement_must_be_non_empty() {
        let mut draft = custom_draft(Some("https://example.com"));
        draft.placement = vec!["   ".to_string()];
        assert!(matches!(
            validate_and_normalize(draft),
            Err(BannerError::Validation(_))
        ));
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut draft = custom_draft(Some("https://example.com"));
        draft.name = "  ".to_string();
        assert!(matches!(
            validate_and_normalize(draft),
            Err(BannerError::Validation(_))
        ));
    }

    #[test]
    fn media_url_must_match_media_type() {
        let mut draft = custom_draft(Some("https://example.com"));
        draft.media_type = BannerMediaType::Video;
        draft.video_url = None;
        assert!(matches!(
            validate_and_normalize(draft),
            Err(BannerError::Validation(_))
        ));

        let mut draft = custom_draft(Some("https://example.com"));
        draft.media_type = BannerMediaType::Video;
        draft.video_url = Some("https://cdn.example.com/spot.mp4".to_string());
        let record = validate_and_normalize(draft).unwrap();
        assert!(record.image_url.is_none());
        assert!(record.video_url.is_some());
    }

    #[test]
    fn inverted_window_is_rejected() {
        let mut draft = custom_draft(Some("https://example.com"));
        let now = Utc::now();
        draft.active_from = Some(now);
        draft.active_until = Some(now - chrono::Duration::days(1));
        assert!(matches!(
            validate_and_normalize(draft),
            Err(BannerError::Validation(_))
        ));
    }

    #[test]
    fn merged_patch_switching_to_custom_requires_url() {
        // Stored vendor-specific banner has no custom_url; flipping the flag
        // without providing one must fail the re-validation.
        let record = validate_and_normalize(vendor_draft(Some(Uuid::new_v4()))).unwrap();
        let existing = AdBanner {
            id: Uuid::new_v4(),
            name: record.name.clone(),
            media_type: record.media_type,
            image_url: record.image_url.clone(),
            video_url: record.video_url.clone(),
            status: record.status,
            placement: record.placement.clone(),
            is_vendor_specific: record.is_vendor_specific,
            vendor_id: record.vendor_id,
            custom_url: record.custom_url.clone(),
            active_from: record.active_from,
            active_until: record.active_until,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let patch = BannerPatch {
            is_vendor_specific: Some(false),
            ..Default::default()
        };
        assert!(matches!(
            validate_and_normalize(merge_patch(&existing, patch)),
            Err(BannerError::Validation(_))
        ));

        // Providing the URL makes the same switch valid and drops the vendor link
        let patch = BannerPatch {
            is_vendor_specific: Some(false),
            custom_url: Some("https://example.com/landing".to_string()),
            ..Default::default()
        };
        let merged = validate_and_normalize(merge_patch(&existing, patch)).unwrap();
        assert!(merged.vendor_id.is_none());
        assert_eq!(
            merged.custom_url.as_deref(),
            Some("https://example.com/landing")
        );
    }

    #[test]
    fn sort_keys_are_whitelisted() {
        assert_eq!(parse_sort(Some("name")), BannerSort::Name);
        assert_eq!(parse_sort(Some("activeUntil")), BannerSort::ActiveUntil);
        assert_eq!(
            parse_sort(Some("created_at; DROP TABLE")),
            BannerSort::CreatedAt
        );
        assert_eq!(parse_sort(None), BannerSort::CreatedAt);
    }
}
