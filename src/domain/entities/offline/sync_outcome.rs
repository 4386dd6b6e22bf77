use serde::{Deserialize, Serialize};

/// Per-scope sync accounting, surfaced to the user as "M of N actions
/// synced". A shortfall is a warning, not a fatal error; failed entries
/// stay queued for a later attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub success_count: u32,
    pub total_count: u32,
}

impl SyncOutcome {
    pub fn new(success_count: u32, total_count: u32) -> Self {
        Self {
            success_count,
            total_count,
        }
    }

    pub fn empty() -> Self {
        Self::new(0, 0)
    }

    pub fn is_complete(&self) -> bool {
        self.success_count == self.total_count
    }
}
