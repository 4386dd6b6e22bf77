use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow and offline state of an entity record.
///
/// Reports always carry one of these; other record kinds carry it only
/// while they have unsynced offline history. `Validated` is terminal and
/// locks the record against further edits and deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordStatus {
    Pending,
    Validated,
    Rejected,
    Offline,
    OfflineModified,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Validated => "validated",
            RecordStatus::Rejected => "rejected",
            RecordStatus::Offline => "offline",
            RecordStatus::OfflineModified => "offline-modified",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RecordStatus::Validated)
    }

    pub fn has_offline_history(&self) -> bool {
        matches!(self, RecordStatus::Offline | RecordStatus::OfflineModified)
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
