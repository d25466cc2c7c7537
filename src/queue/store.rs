use sqlx::PgPool;
use std::time::Duration;

use super::{QueueError, QueueMessage};

/// Delivery state of a stored message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    Ready,
    Dead,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Ready => "ready",
            MessageStatus::Dead => "dead",
        }
    }
}

/// SQL access to the `queue_messages` table
pub struct QueueStore;

impl QueueStore {
    /// Append a message to a queue, returning its id
    pub async fn enqueue(
        pool: &PgPool,
        queue: &str,
        payload: &serde_json::Value,
    ) -> Result<i64, QueueError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO queue_messages (queue, payload)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(queue)
        .bind(payload)
        .fetch_one(pool)
        .await?;

        Ok(id)
    }

    /// Lease up to `limit` ready messages. Leased messages are hidden from other
    /// consumers until `visibility` elapses, and their attempt counter is bumped.
    pub async fn claim(
        pool: &PgPool,
        queue: &str,
        limit: i64,
        visibility: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        let mut messages = sqlx::query_as::<_, QueueMessage>(
            r#"
            UPDATE queue_messages
            SET attempts = attempts + 1,
                available_at = NOW() + make_interval(secs => $3)
            WHERE id IN (
                SELECT id
                FROM queue_messages
                WHERE queue = $1
                  AND status = 'ready'
                  AND available_at <= NOW()
                ORDER BY id
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, queue, payload, attempts, created_at
            "#,
        )
        .bind(queue)
        .bind(limit)
        .bind(visibility.as_secs_f64())
        .fetch_all(pool)
        .await?;

        // RETURNING does not preserve the subquery order
        messages.sort_by_key(|m| m.id);
        Ok(messages)
    }

    /// Acknowledge a processed message
    pub async fn ack(pool: &PgPool, id: i64) -> Result<(), QueueError> {
        sqlx::query("DELETE FROM queue_messages WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Make a failed message visible again after `delay`
    pub async fn retry_later(
        pool: &PgPool,
        id: i64,
        delay: Duration,
        error: &str,
    ) -> Result<(), QueueError> {
        sqlx::query(
            r#"
            UPDATE queue_messages
            SET available_at = NOW() + make_interval(secs => $2),
                last_error = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(delay.as_secs_f64())
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Park a message that will never succeed
    pub async fn dead_letter(pool: &PgPool, id: i64, error: &str) -> Result<(), QueueError> {
        sqlx::query(
            r#"
            UPDATE queue_messages
            SET status = 'dead', last_error = $2, dead_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Number of messages in a queue with the given status
    pub async fn depth(
        pool: &PgPool,
        queue: &str,
        status: MessageStatus,
    ) -> Result<i64, QueueError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM queue_messages WHERE queue = $1 AND status = $2",
        )
        .bind(queue)
        .bind(status.as_str())
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}
