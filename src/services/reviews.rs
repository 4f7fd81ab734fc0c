use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    review::{CreateReviewData, Review, ReviewFilter, ReviewStatus, ReviewWithAuthor},
    vendor::Vendor,
};
use crate::services::rating;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(thiserror::Error, Debug)]
pub enum ReviewError {
    #[error("Vendor not found")]
    VendorNotFound,

    #[error("Review not found")]
    NotFound,

    #[error("You can only modify your own review")]
    NotOwner,

    #[error("You have already reviewed this vendor")]
    Duplicate,

    #[error("Review is already flagged for removal")]
    AlreadyFlagged,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ReviewError> for AppError {
    fn from(e: ReviewError) -> Self {
        match e {
            ReviewError::VendorNotFound => AppError::NotFound("Vendor not found".to_string()),
            ReviewError::NotFound => AppError::NotFound("Review not found".to_string()),
            ReviewError::NotOwner => {
                AppError::Forbidden("You can only modify your own review".to_string())
            }
            ReviewError::Duplicate => {
                AppError::Conflict("You have already reviewed this vendor".to_string())
            }
            ReviewError::AlreadyFlagged => {
                AppError::Conflict("Review is already flagged for removal".to_string())
            }
            ReviewError::Validation(msg) => AppError::InvalidInput(msg),
            ReviewError::Database(e) => AppError::Database(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub rating: i16,
    pub comment: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewPatch {
    pub rating: Option<i16>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ModerationPatch {
    pub status: Option<ReviewStatus>,
    pub flagged_for_removal: Option<bool>,
}

/// 1-indexed pagination with the shared default page size.
#[derive(Debug, Clone, Copy)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl PageParams {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total == 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}

#[derive(Debug)]
pub struct ReviewPage {
    pub reviews: Vec<ReviewWithAuthor>,
    pub total: i64,
    pub total_pages: i64,
    pub page: i64,
}

fn validate_rating(rating: i16) -> Result<(), ReviewError> {
    if !(1..=5).contains(&rating) {
        return Err(ReviewError::Validation(
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

fn validate_comment(comment: &str) -> Result<String, ReviewError> {
    let trimmed = comment.trim();
    if trimmed.is_empty() {
        return Err(ReviewError::Validation("Comment is required".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Moderation transition rules:
/// - flagging forces the review back to pending (re-review required)
/// - approving clears the removal flag
/// - explicitly clearing the flag approves the review
///
/// The flag change is applied before the status change, so an explicit status
/// in the same patch wins over the status implied by the flag.
pub fn apply_moderation(
    current_status: ReviewStatus,
    currently_flagged: bool,
    patch: &ModerationPatch,
) -> (ReviewStatus, bool) {
    let mut status = current_status;
    let mut flagged = currently_flagged;

    if let Some(new_flag) = patch.flagged_for_removal {
        flagged = new_flag;
        status = if new_flag {
            ReviewStatus::Pending
        } else {
            ReviewStatus::Approved
        };
    }

    if let Some(new_status) = patch.status {
        status = new_status;
        if new_status == ReviewStatus::Approved {
            flagged = false;
        }
    }

    (status, flagged)
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.constraint() == Some("reviews_vendor_id_author_id_key"))
}

/// Creates a review for a vendor. New reviews start pending and require
/// moderation before they count toward the vendor's aggregate.
pub async fn create_review(
    pool: &PgPool,
    vendor_id: Uuid,
    author_id: Uuid,
    new: NewReview,
) -> Result<Review, ReviewError> {
    validate_rating(new.rating)?;
    let comment = validate_comment(&new.comment)?;

    Vendor::find_by_id(pool, vendor_id)
        .await?
        .ok_or(ReviewError::VendorNotFound)?;

    if Review::exists_for_author(pool, vendor_id, author_id).await? {
        return Err(ReviewError::Duplicate);
    }

    let review = Review::create(
        pool,
        CreateReviewData {
            vendor_id,
            author_id,
            rating: new.rating,
            comment,
        },
    )
    .await
    .map_err(|e| {
        // Concurrent create of the same (vendor, author) pair lands here
        if is_unique_violation(&e) {
            ReviewError::Duplicate
        } else {
            ReviewError::Database(e)
        }
    })?;

    tracing::info!(review_id = %review.id, vendor_id = %vendor_id, "Review created");

    // A new review is pending and cannot change the approved set; the trigger
    // is kept so every mutation path recomputes and the aggregate self-heals.
    rating::recompute_vendor_rating_guarded(pool, vendor_id).await;

    Ok(review)
}

/// Updates the author-editable fields of the requester's own review.
pub async fn update_review(
    pool: &PgPool,
    review_id: Uuid,
    requester_id: Uuid,
    patch: ReviewPatch,
) -> Result<Review, ReviewError> {
    if let Some(rating) = patch.rating {
        validate_rating(rating)?;
    }
    let comment = match &patch.comment {
        Some(c) => Some(validate_comment(c)?),
        None => None,
    };

    let review = Review::find_by_id(pool, review_id)
        .await?
        .ok_or(ReviewError::NotFound)?;

    if review.author_id != requester_id {
        return Err(ReviewError::NotOwner);
    }

    let updated = Review::update_fields(pool, review_id, patch.rating, comment).await?;

    tracing::info!(review_id = %review_id, "Review updated");

    // Rating changes on an already-approved review shift the aggregate
    rating::recompute_vendor_rating_guarded(pool, updated.vendor_id).await;

    Ok(updated)
}

pub async fn delete_review(
    pool: &PgPool,
    review_id: Uuid,
    requester_id: Uuid,
    is_admin: bool,
) -> Result<(), ReviewError> {
    let review = Review::find_by_id(pool, review_id)
        .await?
        .ok_or(ReviewError::NotFound)?;

    if !is_admin && review.author_id != requester_id {
        return Err(ReviewError::NotOwner);
    }

    Review::delete(pool, review_id).await?;

    tracing::info!(review_id = %review_id, vendor_id = %review.vendor_id, "Review deleted");

    rating::recompute_vendor_rating_guarded(pool, review.vendor_id).await;

    Ok(())
}

/// A vendor flags a review on its own listing for removal. Flagging pulls the
/// review out of the approved set until an admin re-reviews it.
pub async fn flag_review(
    pool: &PgPool,
    review_id: Uuid,
    actor_vendor_id: Uuid,
) -> Result<Review, ReviewError> {
    let review = Review::find_by_id(pool, review_id)
        .await?
        .ok_or(ReviewError::NotFound)?;

    if review.vendor_id != actor_vendor_id {
        return Err(ReviewError::NotOwner);
    }

    if review.flagged_for_removal {
        return Err(ReviewError::AlreadyFlagged);
    }

    let flagged = Review::set_moderation(pool, review_id, ReviewStatus::Pending, true).await?;

    tracing::info!(review_id = %review_id, vendor_id = %review.vendor_id, "Review flagged for removal");

    rating::recompute_vendor_rating_guarded(pool, review.vendor_id).await;

    Ok(flagged)
}

/// Admin moderation of status and/or removal flag, applying the cross-field
/// transition rules.
pub async fn moderate_review(
    pool: &PgPool,
    review_id: Uuid,
    patch: ModerationPatch,
) -> Result<Review, ReviewError> {
    let review = Review::find_by_id(pool, review_id)
        .await?
        .ok_or(ReviewError::NotFound)?;

    let (status, flagged) = apply_moderation(review.status, review.flagged_for_removal, &patch);

    let moderated = Review::set_moderation(pool, review_id, status, flagged).await?;

    tracing::info!(
        review_id = %review_id,
        status = ?moderated.status,
        flagged = moderated.flagged_for_removal,
        "Review moderated"
    );

    rating::recompute_vendor_rating_guarded(pool, review.vendor_id).await;

    Ok(moderated)
}

async fn list_page(
    pool: &PgPool,
    filter: ReviewFilter,
    params: PageParams,
) -> Result<ReviewPage, ReviewError> {
    let total = Review::count(pool, &filter).await?;
    let reviews = Review::list(pool, &filter, params.limit, params.offset()).await?;

    Ok(ReviewPage {
        reviews,
        total,
        total_pages: total_pages(total, params.limit),
        page: params.page,
    })
}

/// Public listing: approved reviews only, newest first.
pub async fn list_for_vendor_public(
    pool: &PgPool,
    vendor_id: Uuid,
    rating: Option<i16>,
    params: PageParams,
) -> Result<ReviewPage, ReviewError> {
    Vendor::find_by_id(pool, vendor_id)
        .await?
        .ok_or(ReviewError::VendorNotFound)?;

    list_page(
        pool,
        ReviewFilter {
            vendor_id: Some(vendor_id),
            status: Some(ReviewStatus::Approved),
            rating,
            ..Default::default()
        },
        params,
    )
    .await
}

/// Vendor/admin listing across all statuses with comment search.
pub async fn list_for_vendor_privileged(
    pool: &PgPool,
    vendor_id: Uuid,
    status: Option<ReviewStatus>,
    rating: Option<i16>,
    search: Option<String>,
    params: PageParams,
) -> Result<ReviewPage, ReviewError> {
    Vendor::find_by_id(pool, vendor_id)
        .await?
        .ok_or(ReviewError::VendorNotFound)?;

    list_page(
        pool,
        ReviewFilter {
            vendor_id: Some(vendor_id),
            status,
            rating,
            search,
            flagged_only: false,
        },
        params,
    )
    .await
}

/// Global admin listing across vendors.
pub async fn list_all_admin(
    pool: &PgPool,
    status: Option<ReviewStatus>,
    rating: Option<i16>,
    search: Option<String>,
    flagged_only: bool,
    params: PageParams,
) -> Result<ReviewPage, ReviewError> {
    list_page(
        pool,
        ReviewFilter {
            vendor_id: None,
            status,
            rating,
            search,
            flagged_only,
        },
        params,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flagging_forces_pending() {
        let patch = ModerationPatch {
            status: None,
            flagged_for_removal: Some(true),
        };
        let (status, flagged) = apply_moderation(ReviewStatus::Approved, false, &patch);
        assert_eq!(status, ReviewStatus::Pending);
        assert!(flagged);
    }

    #[test]
    fn clearing_flag_approves() {
        let patch = ModerationPatch {
            status: None,
            flagged_for_removal: Some(false),
        };
        let (status, flagged) = apply_moderation(ReviewStatus::Pending, true, &patch);
        assert_eq!(status, ReviewStatus::Approved);
        assert!(!flagged);
    }

    #[test]
    fn approving_clears_flag() {
        let patch = ModerationPatch {
            status: Some(ReviewStatus::Approved),
            flagged_for_removal: None,
        };
        let (status, flagged) = apply_moderation(ReviewStatus::Pending, true, &patch);
        assert_eq!(status, ReviewStatus::Approved);
        assert!(!flagged);
    }

    #[test]
    fn rejecting_leaves_flag_untouched() {
        let patch = ModerationPatch {
            status: Some(ReviewStatus::Rejected),
            flagged_for_removal: None,
        };
        let (status, flagged) = apply_moderation(ReviewStatus::Pending, true, &patch);
        assert_eq!(status, ReviewStatus::Rejected);
        assert!(flagged);
    }

    #[test]
    fn explicit_status_wins_over_flag_in_same_patch() {
        let patch = ModerationPatch {
            status: Some(ReviewStatus::Approved),
            flagged_for_removal: Some(true),
        };
        let (status, flagged) = apply_moderation(ReviewStatus::Pending, false, &patch);
        assert_eq!(status, ReviewStatus::Approved);
        assert!(!flagged);
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let patch = ModerationPatch::default();
        let (status, flagged) = apply_moderation(ReviewStatus::Rejected, true, &patch);
        assert_eq!(status, ReviewStatus::Rejected);
        assert!(flagged);
    }

    #[test]
    fn rating_bounds_are_enforced() {
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
    }

    #[test]
    fn comment_is_trimmed_and_required() {
        assert_eq!(validate_comment("  great stall  ").unwrap(), "great stall");
        assert!(validate_comment("   ").is_err());
        assert!(validate_comment("").is_err());
    }

    #[test]
    fn page_params_apply_defaults_and_bounds() {
        let params = PageParams::new(None, None);
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 10);
        assert_eq!(params.offset(), 0);

        let params = PageParams::new(Some(3), Some(25));
        assert_eq!(params.offset(), 50);

        let params = PageParams::new(Some(0), Some(0));
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 1);

        let params = PageParams::new(Some(2), Some(500));
        assert_eq!(params.limit, 100);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(95, 10), 10);
    }
}
