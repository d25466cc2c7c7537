//! Durable message queue
//!
//! Messages live in the `queue_messages` table and are delivered at least once:
//! a consumer leases a batch, processes it, then acks, reschedules or
//! dead-letters each message.

mod consumer;
mod publisher;
mod store;

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::time::Duration;

pub use consumer::{PaymentEditionConsumer, PollReport};
pub use publisher::Publisher;
pub use store::{MessageStatus, QueueStore};

/// One leased queue message
#[derive(Debug, Clone, FromRow)]
pub struct QueueMessage {
    pub id: i64,
    pub queue: String,
    pub payload: serde_json::Value,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

/// Queue plumbing errors
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Subscription settings for the payment edition queue consumer
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Queue name
    pub queue: String,
    /// Delay between polls when the queue is drained
    pub poll_interval: Duration,
    /// Maximum messages leased per poll
    pub batch_size: i64,
    /// Deliveries before a failing message is dead-lettered
    pub max_attempts: i32,
    /// How long a leased message stays invisible to other consumers
    pub visibility_timeout: Duration,
    /// First retry delay; doubles on each attempt
    pub retry_base: Duration,
    /// Upper bound for the retry delay
    pub retry_max: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            queue: "payments_edition_queue".to_string(),
            poll_interval: Duration::from_millis(500),
            batch_size: 10,
            max_attempts: 5,
            visibility_timeout: Duration::from_secs(30),
            retry_base: Duration::from_secs(1),
            retry_max: Duration::from_secs(60),
        }
    }
}

impl ConsumerConfig {
    /// Backoff before the next delivery of a message that failed `attempts` times
    pub fn retry_delay(&self, attempts: i32) -> Duration {
        let exponent = attempts.saturating_sub(1).clamp(0, 16) as u32;
        self.retry_base
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(self.retry_max)
    }

    /// Longest time a message can keep being redelivered after its first
    /// delivery: every attempt may hold the lease and then wait out its backoff
    pub fn redelivery_horizon(&self) -> Duration {
        (1..=self.max_attempts).fold(Duration::ZERO, |total, attempt| {
            total
                .saturating_add(self.visibility_timeout)
                .saturating_add(self.retry_delay(attempt))
        })
    }
}
