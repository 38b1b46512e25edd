//! SQLite Subscription Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::collections::HashSet;
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{RepositoryError, SubscriptionRepositoryPort};
use crate::domain::Subscription;

/// SQLite Subscription Repository
pub struct SqliteSubscriptionRepository {
    pool: DbPool,
}

impl SqliteSubscriptionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct SubscriptionRow {
    id: String,
    name: String,
    url: String,
    event_types: String,
    secret: Option<String>,
    active: i64,
    created_at: String,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = RepositoryError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let event_types: HashSet<String> = serde_json::from_str(&row.event_types)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        Ok(Subscription {
            id: Uuid::parse_str(&row.id)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            name: row.name,
            url: row.url,
            event_types,
            secret: row.secret,
            active: row.active != 0,
            created_at: DateTime::parse_from_rfc3339(&row.created_at)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?
                .with_timezone(&Utc),
        })
    }
}

const SELECT_COLUMNS: &str =
    "id, name, url, event_types, secret, active, created_at";

#[async_trait]
impl SubscriptionRepositoryPort for SqliteSubscriptionRepository {
    async fn save(&self, subscription: &Subscription) -> Result<(), RepositoryError> {
        let event_types = serde_json::to_string(&subscription.event_types)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO subscriptions (id, name, url, event_types, secret, active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                url = excluded.url,
                event_types = excluded.event_types,
                secret = excluded.secret,
                active = excluded.active
            "#,
        )
        .bind(subscription.id.to_string())
        .bind(&subscription.name)
        .bind(&subscription.url)
        .bind(event_types)
        .bind(&subscription.secret)
        .bind(subscription.active as i64)
        .bind(subscription.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subscription>, RepositoryError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE id = ?",
            SELECT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Subscription>, RepositoryError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM subscriptions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};

    async fn test_repo() -> SqliteSubscriptionRepository {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteSubscriptionRepository::new(pool)
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let repo = test_repo().await;
        let sub = Subscription::new("crm", "https://crm.example.com/hook", ["book.created"])
            .with_secret("s3cret");

        repo.save(&sub).await.unwrap();

        let found = repo.find_by_id(sub.id).await.unwrap().unwrap();
        assert_eq!(found.name, "crm");
        assert_eq!(found.url, "https://crm.example.com/hook");
        assert!(found.event_types.contains("book.created"));
        assert_eq!(found.secret.as_deref(), Some("s3cret"));
        assert!(found.active);
    }

    #[tokio::test]
    async fn test_save_is_upsert() {
        let repo = test_repo().await;
        let mut sub = Subscription::new("crm", "https://crm.example.com/hook", ["book.created"]);
        repo.save(&sub).await.unwrap();

        sub.active = false;
        sub.url = "https://crm.example.com/hook/v2".to_string();
        repo.save(&sub).await.unwrap();

        let found = repo.find_by_id(sub.id).await.unwrap().unwrap();
        assert!(!found.active);
        assert_eq!(found.url, "https://crm.example.com/hook/v2");
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = test_repo().await;
        let sub = Subscription::new("crm", "https://crm.example.com/hook", ["book.created"]);
        repo.save(&sub).await.unwrap();

        repo.delete(sub.id).await.unwrap();
        assert!(repo.find_by_id(sub.id).await.unwrap().is_none());
    }
}
