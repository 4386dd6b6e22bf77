use crate::domain::entities::offline::QueueEntry;
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;

/// Names of the snapshot blobs held in the key-value table.
pub mod blob_keys {
    pub const DATA: &str = "data";
    pub const USERS: &str = "users";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const AUDIT_LOGS: &str = "auditLogs";
    pub const SESSION: &str = "session";
}

/// Local durable storage: named snapshot blobs plus the offline queue.
///
/// The queue outlives process restarts. Scanning a scope returns entries
/// in storage order, which is NOT guaranteed to be creation order; the
/// sync engine sorts by timestamp before replay.
#[async_trait]
pub trait DurablePersistence: Send + Sync {
    async fn put_blob(&self, key: &str, value: &Value) -> Result<(), AppError>;
    async fn get_blob(&self, key: &str) -> Result<Option<Value>, AppError>;

    async fn append_entry(&self, entry: &QueueEntry) -> Result<(), AppError>;
    async fn entries_for_scope(&self, scope_id: &str) -> Result<Vec<QueueEntry>, AppError>;
    async fn all_entries(&self) -> Result<Vec<QueueEntry>, AppError>;
    async fn delete_entries(&self, ids: &[String]) -> Result<(), AppError>;
}
