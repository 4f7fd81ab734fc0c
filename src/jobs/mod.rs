// Scheduled maintenance jobs

pub mod banner_sweeper;
pub mod subscription_checker;

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::services::mailer::Mailer;

/// Registers both daily sweeps on the configured cron schedule and starts the
/// scheduler. The two jobs run on independent timers and are not coordinated
/// with each other or with API requests; both are idempotent.
pub async fn start_scheduler(
    pool: PgPool,
    mailer: Arc<Mailer>,
    schedule: &str,
) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let banner_pool = pool.clone();
    scheduler
        .add(Job::new_async(schedule, move |_id, _lock| {
            let pool = banner_pool.clone();
            Box::pin(async move {
                if let Err(e) = banner_sweeper::deactivate_expired_banners(&pool).await {
                    tracing::error!(error = %e, "Banner sweep failed");
                }
            })
        })?)
        .await?;

    let sweep_pool = pool.clone();
    let sweep_mailer = mailer.clone();
    scheduler
        .add(Job::new_async(schedule, move |_id, _lock| {
            let pool = sweep_pool.clone();
            let mailer = sweep_mailer.clone();
            Box::pin(async move {
                if let Err(e) = subscription_checker::run_subscription_sweep(&pool, &mailer).await {
                    tracing::error!(error = %e, "Subscription sweep failed");
                }
            })
        })?)
        .await?;

    scheduler.start().await?;

    tracing::info!(schedule = schedule, "Maintenance jobs scheduled");

    Ok(scheduler)
}
