use crate::domain::value_objects::RecordStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    pub men: u32,
    pub women: u32,
    pub children: u32,
}

impl Attendance {
    pub fn total(&self) -> u32 {
        self.men + self.women + self.children
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Offering {
    pub tithes: f64,
    pub regular: f64,
    pub special: f64,
}

impl Offering {
    pub fn total(&self) -> f64 {
        self.tithes + self.regular + self.special
    }
}

/// A worship-service report. The only record kind subject to the
/// validation workflow, so its status is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorshipService {
    pub id: String,
    pub date: NaiveDate,
    pub speaker: String,
    pub president: String,
    pub attendance: Attendance,
    pub offering: Offering,
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorshipServiceDraft {
    pub date: NaiveDate,
    pub speaker: String,
    pub president: String,
    pub attendance: Attendance,
    pub offering: Offering,
}

impl WorshipService {
    pub fn from_draft(draft: WorshipServiceDraft, id: String, status: RecordStatus) -> Self {
        Self {
            id,
            date: draft.date,
            speaker: draft.speaker,
            president: draft.president,
            attendance: draft.attendance,
            offering: draft.offering,
            status,
            rejection_reason: None,
        }
    }
}
