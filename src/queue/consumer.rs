use sqlx::PgPool;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::payment::models::{EditionOutcome, PaymentEditionMessage};
use crate::payment::PaymentService;

use super::store::QueueStore;
use super::{ConsumerConfig, QueueError, QueueMessage};

/// What happened to the messages leased by one poll
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    pub claimed: usize,
    pub acked: usize,
    pub retried: usize,
    pub dead_lettered: usize,
}

enum Disposition {
    Ack,
    Retry(String),
    Dead(String),
}

/// Subscription to the payment edition queue. Forwards every message to
/// [`PaymentService::process_payment_edition`].
pub struct PaymentEditionConsumer {
    pool: PgPool,
    config: ConsumerConfig,
}

impl PaymentEditionConsumer {
    pub fn new(pool: PgPool, config: ConsumerConfig) -> Self {
        Self { pool, config }
    }

    /// Start consuming in the background until `shutdown` flips to true
    pub fn start(self, shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run(shutdown).await;
        })
    }

    async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(queue = %self.config.queue, "Payment edition consumer started");

        let mut ticker = interval(self.config.poll_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Keep draining while full batches come back
                    loop {
                        match self.poll_once().await {
                            Ok(report) if report.claimed as i64 >= self.config.batch_size => continue,
                            Ok(_) => break,
                            Err(e) => {
                                error!(error = %e, queue = %self.config.queue, "Queue poll failed");
                                break;
                            }
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(queue = %self.config.queue, "Payment edition consumer stopped");
    }

    /// Lease one batch and settle every message in it
    pub async fn poll_once(&self) -> Result<PollReport, QueueError> {
        let messages = QueueStore::claim(
            &self.pool,
            &self.config.queue,
            self.config.batch_size,
            self.config.visibility_timeout,
        )
        .await?;

        let mut report = PollReport {
            claimed: messages.len(),
            ..Default::default()
        };

        for message in messages {
            match self.dispose(&message).await {
                Disposition::Ack => {
                    QueueStore::ack(&self.pool, message.id).await?;
                    report.acked += 1;
                }
                Disposition::Retry(reason) => {
                    let delay = self.config.retry_delay(message.attempts);
                    warn!(
                        queue_message = message.id,
                        attempts = message.attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %reason,
                        "Payment edition failed, will retry"
                    );
                    QueueStore::retry_later(&self.pool, message.id, delay, &reason).await?;
                    report.retried += 1;
                }
                Disposition::Dead(reason) => {
                    error!(
                        queue_message = message.id,
                        attempts = message.attempts,
                        error = %reason,
                        "Payment edition dead-lettered"
                    );
                    QueueStore::dead_letter(&self.pool, message.id, &reason).await?;
                    report.dead_lettered += 1;
                }
            }
        }

        Ok(report)
    }

    async fn dispose(&self, message: &QueueMessage) -> Disposition {
        let payload: PaymentEditionMessage = match serde_json::from_value(message.payload.clone())
        {
            Ok(payload) => payload,
            Err(e) => return Disposition::Dead(format!("Malformed payload: {e}")),
        };

        match self.receive(&payload).await {
            Ok(_) => Disposition::Ack,
            Err(AppError::ValidationError(reason)) => Disposition::Dead(reason),
            Err(e) if message.attempts >= self.config.max_attempts => {
                Disposition::Dead(format!("Gave up after {} attempts: {e}", message.attempts))
            }
            Err(e) => Disposition::Retry(e.to_string()),
        }
    }

    /// Forward one edition event to the payment service
    pub async fn receive(
        &self,
        payload: &PaymentEditionMessage,
    ) -> Result<EditionOutcome, AppError> {
        info!(
            message_id = %payload.message_id,
            edition = %payload.edition_type,
            "Receiving payment edition"
        );

        let outcome = PaymentService::process_payment_edition(&self.pool, payload).await?;

        info!(
            message_id = %payload.message_id,
            edition = %payload.edition_type,
            duplicate = matches!(outcome, EditionOutcome::Duplicate),
            "Payment edition received"
        );

        Ok(outcome)
    }
}
