use crate::application::ports::durable_store::DurablePersistence;
use crate::domain::entities::offline::QueueEntry;
use crate::infrastructure::database::DbPool;
use crate::infrastructure::offline::rows::QueueEntryRow;
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite};

/// SQLite-backed durable store: one key-value table for the named
/// snapshot blobs and one queue table indexed by scope id.
pub struct SqliteDurableStore {
    pool: DbPool,
}

impl SqliteDurableStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DurablePersistence for SqliteDurableStore {
    async fn put_blob(&self, key: &str, value: &Value) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO key_value (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_blob(&self, key: &str) -> Result<Option<Value>, AppError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM key_value WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some((raw,)) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn append_entry(&self, entry: &QueueEntry) -> Result<(), AppError> {
        let json = serde_json::to_string(entry)?;

        sqlx::query(
            r#"
            INSERT INTO offline_queue (id, action_type, scope_id, entry, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&entry.id)
        .bind(entry.mutation.kind())
        .bind(entry.mutation.scope_id())
        .bind(&json)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn entries_for_scope(&self, scope_id: &str) -> Result<Vec<QueueEntry>, AppError> {
        // No ORDER BY on purpose: callers must not assume storage order
        // equals creation order.
        let rows: Vec<QueueEntryRow> = sqlx::query_as(
            "SELECT id, action_type, scope_id, entry, created_at FROM offline_queue WHERE scope_id = ?1",
        )
        .bind(scope_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(QueueEntryRow::into_entry).collect()
    }

    async fn all_entries(&self) -> Result<Vec<QueueEntry>, AppError> {
        let rows: Vec<QueueEntryRow> =
            sqlx::query_as("SELECT id, action_type, scope_id, entry, created_at FROM offline_queue")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(QueueEntryRow::into_entry).collect()
    }

    async fn delete_entries(&self, ids: &[String]) -> Result<(), AppError> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("DELETE FROM offline_queue WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        builder.build().execute(&self.pool).await?;

        Ok(())
    }
}
