//! SQLite Delivery Log - 投递审计日志
//!
//! 只追加；一行对应一次 HTTP 尝试

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{
    DeliveryAttempt, DeliveryLogError, DeliveryLogPort, DeliveryOutcome,
};

/// SQLite 投递日志
pub struct SqliteDeliveryLog {
    pool: DbPool,
}

impl SqliteDeliveryLog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct AttemptRow {
    subscription_id: String,
    event_type: String,
    attempt_number: i64,
    status_code: Option<i64>,
    outcome: String,
    error_message: Option<String>,
    occurred_at: String,
}

impl TryFrom<AttemptRow> for DeliveryAttempt {
    type Error = DeliveryLogError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        Ok(DeliveryAttempt {
            subscription_id: Uuid::parse_str(&row.subscription_id)
                .map_err(|e| DeliveryLogError::SerializationError(e.to_string()))?,
            event_type: row.event_type,
            attempt_number: row.attempt_number as u32,
            status_code: row.status_code.map(|c| c as u16),
            outcome: DeliveryOutcome::parse(&row.outcome).ok_or_else(|| {
                DeliveryLogError::SerializationError(format!("unknown outcome: {}", row.outcome))
            })?,
            error_message: row.error_message,
            occurred_at: DateTime::parse_from_rfc3339(&row.occurred_at)
                .map_err(|e| DeliveryLogError::SerializationError(e.to_string()))?
                .with_timezone(&Utc),
        })
    }
}

const SELECT_COLUMNS: &str = "subscription_id, event_type, attempt_number, status_code, \
                              outcome, error_message, occurred_at";

#[async_trait]
impl DeliveryLogPort for SqliteDeliveryLog {
    async fn append(&self, attempt: &DeliveryAttempt) -> Result<(), DeliveryLogError> {
        sqlx::query(
            r#"
            INSERT INTO delivery_attempts
                (subscription_id, event_type, attempt_number, status_code,
                 outcome, error_message, occurred_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(attempt.subscription_id.to_string())
        .bind(&attempt.event_type)
        .bind(attempt.attempt_number as i64)
        .bind(attempt.status_code.map(|c| c as i64))
        .bind(attempt.outcome.as_str())
        .bind(&attempt.error_message)
        .bind(attempt.occurred_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| DeliveryLogError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_by_subscription(
        &self,
        subscription_id: Uuid,
    ) -> Result<Vec<DeliveryAttempt>, DeliveryLogError> {
        let rows: Vec<AttemptRow> = sqlx::query_as(&format!(
            "SELECT {} FROM delivery_attempts WHERE subscription_id = ? ORDER BY id",
            SELECT_COLUMNS
        ))
        .bind(subscription_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DeliveryLogError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(DeliveryAttempt::try_from).collect()
    }

    async fn find_by_event_type(
        &self,
        event_type: &str,
    ) -> Result<Vec<DeliveryAttempt>, DeliveryLogError> {
        let rows: Vec<AttemptRow> = sqlx::query_as(&format!(
            "SELECT {} FROM delivery_attempts WHERE event_type = ? ORDER BY id",
            SELECT_COLUMNS
        ))
        .bind(event_type)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DeliveryLogError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(DeliveryAttempt::try_from).collect()
    }
}
