//! Scheduled maintenance
//!
//! Periodic cleanup of rows that would otherwise accumulate forever: finished
//! sessions, old entries of the payment edition ledger and parked dead letters.

use sqlx::PgPool;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{error, info};

/// Maintenance job errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

// =========================================================================
// Session cleanup
// =========================================================================

/// Delete sessions that expired or were revoked more than `retention` ago
pub async fn purge_stale_sessions(pool: &PgPool, retention: Duration) -> Result<u64, JobError> {
    let result = sqlx::query(
        r#"
        DELETE FROM sessions
        WHERE expires_at < NOW() - make_interval(secs => $1)
           OR revoked_at < NOW() - make_interval(secs => $1)
        "#,
    )
    .bind(retention.as_secs_f64())
    .execute(pool)
    .await?;

    let rows_deleted = result.rows_affected();
    if rows_deleted > 0 {
        info!(rows_deleted, "Deleted stale sessions");
    }

    Ok(rows_deleted)
}

// =========================================================================
// Edition ledger cleanup
// =========================================================================

/// Delete ledger entries processed more than `retention` ago. Once an entry is
/// gone, its message id would be applied again, so `retention` must outlast
/// every redelivery of that message.
pub async fn purge_edition_ledger(pool: &PgPool, retention: Duration) -> Result<u64, JobError> {
    let result = sqlx::query(
        r#"
        DELETE FROM payment_editions
        WHERE processed_at < NOW() - make_interval(secs => $1)
        "#,
    )
    .bind(retention.as_secs_f64())
    .execute(pool)
    .await?;

    let rows_deleted = result.rows_affected();
    if rows_deleted > 0 {
        info!(rows_deleted, "Deleted expired payment edition ledger entries");
    }

    Ok(rows_deleted)
}

// =========================================================================
// Dead letter cleanup
// =========================================================================

/// Delete dead-lettered messages parked more than `retention` ago
pub async fn purge_dead_messages(pool: &PgPool, retention: Duration) -> Result<u64, JobError> {
    let result = sqlx::query(
        r#"
        DELETE FROM queue_messages
        WHERE status = 'dead'
          AND COALESCE(dead_at, created_at) < NOW() - make_interval(secs => $1)
        "#,
    )
    .bind(retention.as_secs_f64())
    .execute(pool)
    .await?;

    let rows_deleted = result.rows_affected();
    if rows_deleted > 0 {
        info!(rows_deleted, "Deleted expired dead letters");
    }

    Ok(rows_deleted)
}

// =========================================================================
// Job Scheduler
// =========================================================================

/// How often maintenance runs and how long finished rows are kept
#[derive(Debug, Clone)]
pub struct RetentionConfig {
    /// Delay between maintenance runs
    pub cleanup_interval: Duration,
    /// Kept after a session expires or is revoked
    pub sessions: Duration,
    /// Kept after an edition is applied
    pub edition_ledger: Duration,
    /// Kept after a message is dead-lettered
    pub dead_letters: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: Duration::from_secs(3600),
            sessions: Duration::from_secs(24 * 3600),
            edition_ledger: Duration::from_secs(7 * 24 * 3600),
            dead_letters: Duration::from_secs(14 * 24 * 3600),
        }
    }
}

/// Rows removed by one maintenance run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub sessions_deleted: u64,
    pub ledger_entries_deleted: u64,
    pub dead_letters_deleted: u64,
    pub errors: Vec<String>,
}

/// Runs the cleanup jobs on an interval
pub struct JobScheduler {
    pool: PgPool,
    config: RetentionConfig,
}

impl JobScheduler {
    pub fn new(pool: PgPool, config: RetentionConfig) -> Self {
        Self { pool, config }
    }

    /// Start the scheduler in the background until `shutdown` flips to true
    pub fn start(self, shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run(shutdown).await;
        })
    }

    async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("Job scheduler started");

        let mut ticker = interval(self.config.cleanup_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.run_all_once().await;
                    for e in &report.errors {
                        error!(error = %e, "Maintenance job failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Job scheduler stopped");
    }

    /// Run every cleanup job once
    pub async fn run_all_once(&self) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        match purge_stale_sessions(&self.pool, self.config.sessions).await {
            Ok(count) => report.sessions_deleted = count,
            Err(e) => report.errors.push(format!("Session cleanup: {e}")),
        }

        match purge_edition_ledger(&self.pool, self.config.edition_ledger).await {
            Ok(count) => report.ledger_entries_deleted = count,
            Err(e) => report.errors.push(format!("Ledger cleanup: {e}")),
        }

        match purge_dead_messages(&self.pool, self.config.dead_letters).await {
            Ok(count) => report.dead_letters_deleted = count,
            Err(e) => report.errors.push(format!("Dead letter cleanup: {e}")),
        }

        report
    }
}
