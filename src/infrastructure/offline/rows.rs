use crate::domain::entities::offline::QueueEntry;
use crate::shared::error::AppError;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct QueueEntryRow {
    pub id: String,
    pub action_type: String,
    pub scope_id: String,
    pub entry: String,
    pub created_at: i64,
}

impl QueueEntryRow {
    pub fn into_entry(self) -> Result<QueueEntry, AppError> {
        Ok(serde_json::from_str(&self.entry)?)
    }
}
