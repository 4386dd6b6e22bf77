use crate::domain::value_objects::RecordStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurchActivity {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurchActivityDraft {
    pub title: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

impl ChurchActivity {
    pub fn from_draft(draft: ChurchActivityDraft, id: String, status: Option<RecordStatus>) -> Self {
        Self {
            id,
            title: draft.title,
            date: draft.date,
            kind: draft.kind,
            description: draft.description,
            status,
        }
    }
}
