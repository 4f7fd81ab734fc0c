use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::models::vendor::{Vendor, VendorStatus};
use crate::services::mailer::Mailer;

/// Day offsets at which expiry warnings go out ahead of the subscription end.
pub const WARNING_OFFSETS_DAYS: [i64; 3] = [30, 7, 2];

/// The admin channel is only alerted at the last warning, to avoid alert fatigue.
const ADMIN_ALERT_OFFSET_DAYS: i64 = 2;

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSweepStats {
    pub warnings_sent: usize,
    pub admin_alerts_sent: usize,
    pub expired: usize,
    pub errors: Vec<String>,
}

/// The UTC day `days_ahead` days from now, as a half-open interval
/// `[day_start, next_day_start)`.
pub fn warning_window(now: DateTime<Utc>, days_ahead: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    let day_start = (now.date_naive() + Duration::days(days_ahead))
        .and_time(NaiveTime::MIN)
        .and_utc();
    (day_start, day_start + Duration::days(1))
}

/// Daily subscription sweep.
///
/// Phase 1 warns approved vendors whose subscription ends exactly 30, 7 or 2
/// days from today; the admin channel is copied at the 2-day mark. Phase 2
/// expires approved vendors whose end date has passed and notifies each one.
/// Per-vendor failures are recorded and do not abort the batch; a failure of
/// the phase queries themselves aborts the sweep and is retried on the next
/// scheduled tick. Warnings are not deduplicated across re-runs within the
/// same day.
pub async fn run_subscription_sweep(
    pool: &PgPool,
    mailer: &Mailer,
) -> Result<SubscriptionSweepStats, sqlx::Error> {
    let now = Utc::now();
    let mut stats = SubscriptionSweepStats::default();

    tracing::info!("Starting subscription sweep");

    // Phase 1: warnings
    for days in WARNING_OFFSETS_DAYS {
        let (from, to) = warning_window(now, days);
        let vendors = Vendor::approved_ending_within(pool, from, to).await?;

        for vendor in &vendors {
            match mailer.send_subscription_warning(vendor, days).await {
                Ok(()) => stats.warnings_sent += 1,
                Err(e) => {
                    tracing::error!(
                        vendor_id = %vendor.id,
                        days_remaining = days,
                        error = %e,
                        "Failed to send subscription warning"
                    );
                    stats.errors.push(format!("warning {}: {}", vendor.id, e));
                    continue;
                }
            }

            if days == ADMIN_ALERT_OFFSET_DAYS {
                match mailer.send_admin_subscription_warning(vendor, days).await {
                    Ok(()) => stats.admin_alerts_sent += 1,
                    Err(e) => {
                        tracing::error!(
                            vendor_id = %vendor.id,
                            error = %e,
                            "Failed to send admin subscription alert"
                        );
                        stats
                            .errors
                            .push(format!("admin alert {}: {}", vendor.id, e));
                    }
                }
            }
        }
    }

    // Phase 2: expiration. Only still-approved vendors match, so a re-run
    // does not reprocess vendors expired here.
    let lapsed = Vendor::approved_expired(pool, now).await?;

    for vendor in &lapsed {
        if let Err(e) = Vendor::set_status(pool, vendor.id, VendorStatus::Expired).await {
            tracing::error!(
                vendor_id = %vendor.id,
                error = %e,
                "Failed to expire vendor"
            );
            stats.errors.push(format!("expire {}: {}", vendor.id, e));
            continue;
        }

        stats.expired += 1;

        if let Err(e) = mailer.send_subscription_expired(vendor).await {
            tracing::error!(
                vendor_id = %vendor.id,
                error = %e,
                "Failed to send expiration notice"
            );
            stats
                .errors
                .push(format!("expired notice {}: {}", vendor.id, e));
        }
    }

    tracing::info!(
        warnings_sent = stats.warnings_sent,
        admin_alerts_sent = stats.admin_alerts_sent,
        expired = stats.expired,
        errors = stats.errors.len(),
        "Subscription sweep completed"
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn warning_window_is_a_whole_utc_day() {
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 15, 30, 0).unwrap();
        let (from, to) = warning_window(now, 2);
        assert_eq!(from, Utc.with_ymd_and_hms(2025, 6, 12, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2025, 6, 13, 0, 0, 0).unwrap());
    }

    #[test]
    fn window_is_anchored_to_the_day_boundary_not_the_current_time() {
        let morning = Utc.with_ymd_and_hms(2025, 6, 10, 0, 5, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2025, 6, 10, 23, 55, 0).unwrap();
        assert_eq!(warning_window(morning, 7), warning_window(evening, 7));
    }

    #[test]
    fn an_end_date_matches_exactly_one_offset() {
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
        // Ends two days out, mid-day
        let end = Utc.with_ymd_and_hms(2025, 6, 12, 18, 0, 0).unwrap();

        let matching: Vec<i64> = WARNING_OFFSETS_DAYS
            .into_iter()
            .filter(|&days| {
                let (from, to) = warning_window(now, days);
                end >= from && end < to
            })
            .collect();

        assert_eq!(matching, vec![2]);
    }

    #[test]
    fn only_the_two_day_offset_alerts_the_admin() {
        assert!(WARNING_OFFSETS_DAYS.contains(&ADMIN_ALERT_OFFSET_DAYS));
        assert_eq!(ADMIN_ALERT_OFFSET_DAYS, 2);
    }
}
