use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{review::Review, vendor::Vendor};

/// Aggregate over a vendor's approved reviews.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i64,
    /// Count of reviews per star value, index 0 = 1 star .. index 4 = 5 stars.
    pub breakdown: [i64; 5],
}

impl RatingSummary {
    /// Breakdown as the persisted JSON shape: {"1": n, .., "5": n}.
    pub fn breakdown_json(&self) -> serde_json::Value {
        serde_json::json!({
            "1": self.breakdown[0],
            "2": self.breakdown[1],
            "3": self.breakdown[2],
            "4": self.breakdown[3],
            "5": self.breakdown[4],
        })
    }
}

/// Computes count, per-star breakdown and the average rounded half-away-from-zero
/// to one decimal place. An empty set yields an average of 0.
pub fn summarize(ratings: &[i16]) -> RatingSummary {
    let mut breakdown = [0i64; 5];
    let mut sum = 0i64;

    for &rating in ratings {
        debug_assert!((1..=5).contains(&rating));
        breakdown[(rating - 1) as usize] += 1;
        sum += rating as i64;
    }

    let count = ratings.len() as i64;
    let average = if count == 0 {
        0.0
    } else {
        (sum as f64 / count as f64 * 10.0).round() / 10.0
    };

    RatingSummary {
        average,
        count,
        breakdown,
    }
}

/// Recomputes a vendor's derived rating fields from its approved reviews and
/// persists them. Idempotent; touches no other vendor fields.
pub async fn recompute_vendor_rating(pool: &PgPool, vendor_id: Uuid) -> Result<(), sqlx::Error> {
    let ratings = Review::approved_ratings(pool, vendor_id).await?;
    let summary = summarize(&ratings);

    Vendor::set_rating_fields(
        pool,
        vendor_id,
        summary.average,
        summary.count,
        summary.breakdown_json(),
    )
    .await?;

    tracing::debug!(
        vendor_id = %vendor_id,
        average = summary.average,
        count = summary.count,
        "Recomputed vendor rating"
    );

    Ok(())
}

/// Trigger variant used after review mutations: a failed recompute is logged
/// and swallowed so it never rolls back the mutation that triggered it. The
/// aggregate self-corrects on the next successful recompute.
pub async fn recompute_vendor_rating_guarded(pool: &PgPool, vendor_id: Uuid) {
    if let Err(e) = recompute_vendor_rating(pool, vendor_id).await {
        tracing::error!(
            vendor_id = %vendor_id,
            error = %e,
            "Vendor rating recompute failed; aggregate left stale until next trigger"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_rounds_half_away_from_zero() {
        // mean of [5,5,4,3] is 4.25, which rounds up to 4.3
        let summary = summarize(&[5, 5, 4, 3]);
        assert_eq!(summary.average, 4.3);
        assert_eq!(summary.count, 4);
        assert_eq!(summary.breakdown, [0, 0, 1, 1, 2]);
    }

    #[test]
    fn summarize_empty_set_yields_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.breakdown, [0, 0, 0, 0, 0]);
    }

    #[test]
    fn summarize_single_review() {
        let summary = summarize(&[4]);
        assert_eq!(summary.average, 4.0);
        assert_eq!(summary.count, 1);
        assert_eq!(summary.breakdown, [0, 0, 0, 1, 0]);
    }

    #[test]
    fn breakdown_counts_sum_to_review_count() {
        let ratings = [1, 1, 2, 3, 3, 3, 4, 5, 5, 5];
        let summary = summarize(&ratings);
        let total: i64 = summary.breakdown.iter().sum();
        assert_eq!(total, summary.count);
    }

    #[test]
    fn summarize_is_deterministic() {
        let ratings = [2, 4, 4, 5];
        assert_eq!(summarize(&ratings), summarize(&ratings));
    }

    #[test]
    fn breakdown_json_lists_all_five_stars() {
        let summary = summarize(&[3]);
        let json = summary.breakdown_json();
        for star in ["1", "2", "3", "4", "5"] {
            assert!(json.get(star).is_some(), "missing star {}", star);
        }
        assert_eq!(json["3"], 1);
        assert_eq!(json["5"], 0);
    }
}
