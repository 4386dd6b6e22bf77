use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BureauMember {
    pub id: String,
    pub name: String,
    pub position: String,
    pub contact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BureauMemberDraft {
    pub name: String,
    pub position: String,
    pub contact: String,
}

impl BureauMember {
    pub fn from_draft(draft: BureauMemberDraft, id: String) -> Self {
        Self {
            id,
            name: draft.name,
            position: draft.position,
            contact: draft.contact,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BureauActivity {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BureauActivityDraft {
    pub title: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

impl BureauActivity {
    pub fn from_draft(draft: BureauActivityDraft, id: String) -> Self {
        Self {
            id,
            title: draft.title,
            date: draft.date,
            kind: draft.kind,
            description: draft.description,
        }
    }
}
