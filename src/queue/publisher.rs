use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

use super::store::QueueStore;
use super::QueueError;

/// Publishes JSON payloads onto one named queue
#[derive(Debug, Clone)]
pub struct Publisher {
    queue: String,
}

impl Publisher {
    pub fn new(queue: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
        }
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Serialize and enqueue a payload, returning the stored message id
    pub async fn publish<T: Serialize>(&self, pool: &PgPool, payload: &T) -> Result<i64, QueueError> {
        let value = serde_json::to_value(payload)?;
        let id = QueueStore::enqueue(pool, &self.queue, &value).await?;

        info!(queue = %self.queue, queue_message = id, "Message published");

        Ok(id)
    }
}
