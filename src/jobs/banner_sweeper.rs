use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerSweepStats {
    pub deactivated: u64,
}

/// Daily sweep that deactivates banners whose visibility window has elapsed.
///
/// Only active banners with a non-null `active_until` in the past are touched;
/// open-ended banners are never deactivated and nothing is ever reactivated,
/// so re-running the sweep matches zero additional rows.
pub async fn deactivate_expired_banners(pool: &PgPool) -> Result<BannerSweepStats, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE ad_banners
        SET status = 'inactive', updated_at = NOW()
        WHERE status = 'active'
          AND active_until IS NOT NULL
          AND active_until < NOW()
        "#,
    )
    .execute(pool)
    .await?;

    let stats = BannerSweepStats {
        deactivated: result.rows_affected(),
    };

    tracing::info!(deactivated = stats.deactivated, "Banner sweep completed");

    Ok(stats)
}
