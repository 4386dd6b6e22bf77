use crate::domain::entities::activity::{ChurchActivity, ChurchActivityDraft};
use crate::domain::entities::announcement::{Announcement, AnnouncementDraft};
use crate::domain::entities::member::{BaptizedMember, BaptizedMemberDraft};
use crate::domain::entities::report::{WorshipService, WorshipServiceDraft};
use crate::domain::value_objects::record_id;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWorshipServicePayload {
    pub church_id: String,
    #[serde(flatten)]
    pub service: WorshipServiceDraft,
    pub offline_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorshipServicePayload {
    pub church_id: String,
    #[serde(flatten)]
    pub service: WorshipService,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteWorshipServicePayload {
    pub church_id: String,
    pub service_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBaptizedMemberPayload {
    pub church_id: String,
    #[serde(flatten)]
    pub member: BaptizedMemberDraft,
    pub offline_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBaptizedMemberPayload {
    pub church_id: String,
    #[serde(flatten)]
    pub member: BaptizedMember,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBaptizedMemberPayload {
    pub church_id: String,
    pub member_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChurchActivityPayload {
    pub church_id: String,
    #[serde(flatten)]
    pub activity: ChurchActivityDraft,
    pub offline_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChurchActivityPayload {
    pub church_id: String,
    #[serde(flatten)]
    pub activity: ChurchActivity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteChurchActivityPayload {
    pub church_id: String,
    pub activity_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAnnouncementPayload {
    pub church_id: String,
    #[serde(flatten)]
    pub announcement: AnnouncementDraft,
    pub offline_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAnnouncementPayload {
    pub church_id: String,
    #[serde(flatten)]
    pub announcement: Announcement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAnnouncementPayload {
    pub church_id: String,
    pub announcement_id: String,
}

/// The closed set of mutations that can wait in the offline queue.
///
/// Dispatch is always an exhaustive `match`, so adding a kind is a
/// compile-time-checked extension. Serialized adjacently tagged as
/// `{"type": ..., "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum QueuedMutation {
    #[serde(rename = "ADD_WORSHIP_SERVICE")]
    AddWorshipService(AddWorshipServicePayload),
    #[serde(rename = "UPDATE_WORSHIP_SERVICE")]
    UpdateWorshipService(UpdateWorshipServicePayload),
    #[serde(rename = "DELETE_WORSHIP_SERVICE")]
    DeleteWorshipService(DeleteWorshipServicePayload),
    #[serde(rename = "ADD_BAPTIZED_MEMBER")]
    AddBaptizedMember(AddBaptizedMemberPayload),
    #[serde(rename = "UPDATE_BAPTIZED_MEMBER")]
    UpdateBaptizedMember(UpdateBaptizedMemberPayload),
    #[serde(rename = "DELETE_BAPTIZED_MEMBER")]
    DeleteBaptizedMember(DeleteBaptizedMemberPayload),
    #[serde(rename = "ADD_CHURCH_ACTIVITY")]
    AddChurchActivity(AddChurchActivityPayload),
    #[serde(rename = "UPDATE_CHURCH_ACTIVITY")]
    UpdateChurchActivity(UpdateChurchActivityPayload),
    #[serde(rename = "DELETE_CHURCH_ACTIVITY")]
    DeleteChurchActivity(DeleteChurchActivityPayload),
    #[serde(rename = "ADD_ANNOUNCEMENT")]
    AddAnnouncement(AddAnnouncementPayload),
    #[serde(rename = "UPDATE_ANNOUNCEMENT")]
    UpdateAnnouncement(UpdateAnnouncementPayload),
    #[serde(rename = "DELETE_ANNOUNCEMENT")]
    DeleteAnnouncement(DeleteAnnouncementPayload),
}

impl QueuedMutation {
    pub fn kind(&self) -> &'static str {
        match self {
            QueuedMutation::AddWorshipService(_) => "ADD_WORSHIP_SERVICE",
            QueuedMutation::UpdateWorshipService(_) => "UPDATE_WORSHIP_SERVICE",
            QueuedMutation::DeleteWorshipService(_) => "DELETE_WORSHIP_SERVICE",
            QueuedMutation::AddBaptizedMember(_) => "ADD_BAPTIZED_MEMBER",
            QueuedMutation::UpdateBaptizedMember(_) => "UPDATE_BAPTIZED_MEMBER",
            QueuedMutation::DeleteBaptizedMember(_) => "DELETE_BAPTIZED_MEMBER",
            QueuedMutation::AddChurchActivity(_) => "ADD_CHURCH_ACTIVITY",
            QueuedMutation::UpdateChurchActivity(_) => "UPDATE_CHURCH_ACTIVITY",
            QueuedMutation::DeleteChurchActivity(_) => "DELETE_CHURCH_ACTIVITY",
            QueuedMutation::AddAnnouncement(_) => "ADD_ANNOUNCEMENT",
            QueuedMutation::UpdateAnnouncement(_) => "UPDATE_ANNOUNCEMENT",
            QueuedMutation::DeleteAnnouncement(_) => "DELETE_ANNOUNCEMENT",
        }
    }

    /// The owning church id, the sole sharding key for scoped sync.
    pub fn scope_id(&self) -> &str {
        match self {
            QueuedMutation::AddWorshipService(p) => &p.church_id,
            QueuedMutation::UpdateWorshipService(p) => &p.church_id,
            QueuedMutation::DeleteWorshipService(p) => &p.church_id,
            QueuedMutation::AddBaptizedMember(p) => &p.church_id,
            QueuedMutation::UpdateBaptizedMember(p) => &p.church_id,
            QueuedMutation::DeleteBaptizedMember(p) => &p.church_id,
            QueuedMutation::AddChurchActivity(p) => &p.church_id,
            QueuedMutation::UpdateChurchActivity(p) => &p.church_id,
            QueuedMutation::DeleteChurchActivity(p) => &p.church_id,
            QueuedMutation::AddAnnouncement(p) => &p.church_id,
            QueuedMutation::UpdateAnnouncement(p) => &p.church_id,
            QueuedMutation::DeleteAnnouncement(p) => &p.church_id,
        }
    }

    /// The temporary id carried by create-type mutations.
    pub fn offline_id(&self) -> Option<&str> {
        match self {
            QueuedMutation::AddWorshipService(p) => Some(&p.offline_id),
            QueuedMutation::AddBaptizedMember(p) => Some(&p.offline_id),
            QueuedMutation::AddChurchActivity(p) => Some(&p.offline_id),
            QueuedMutation::AddAnnouncement(p) => Some(&p.offline_id),
            _ => None,
        }
    }
}

/// One durable record of a pending offline mutation. Persisted as
/// `{id, type, payload, timestamp}` and destroyed only after confirmed
/// replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: String,
    #[serde(flatten)]
    pub mutation: QueuedMutation,
    /// Creation time in epoch microseconds; replay order within a
    /// scope. Microsecond resolution keeps back-to-back appends ordered.
    pub timestamp: i64,
}

impl QueueEntry {
    pub fn new(mutation: QueuedMutation) -> Self {
        Self {
            id: record_id::generate("oq"),
            mutation,
            timestamp: Utc::now().timestamp_micros(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::report::{Attendance, Offering};
    use chrono::NaiveDate;

    fn sample_draft() -> WorshipServiceDraft {
        WorshipServiceDraft {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            speaker: "A".into(),
            president: "B".into(),
            attendance: Attendance {
                men: 5,
                women: 5,
                children: 0,
            },
            offering: Offering {
                tithes: 10.0,
                regular: 0.0,
                special: 0.0,
            },
        }
    }

    #[test]
    fn entry_wire_shape_matches_schema() {
        let entry = QueueEntry::new(QueuedMutation::AddWorshipService(AddWorshipServicePayload {
            church_id: "church_1".into(),
            service: sample_draft(),
            offline_id: "offline_abc".into(),
        }));

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "ADD_WORSHIP_SERVICE");
        assert_eq!(value["payload"]["churchId"], "church_1");
        assert_eq!(value["payload"]["offlineId"], "offline_abc");
        assert_eq!(value["payload"]["speaker"], "A");
        assert!(value["id"].is_string());
        assert!(value["timestamp"].is_i64());

        let decoded: QueueEntry = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn offline_id_is_present_only_on_creates() {
        let add = QueuedMutation::AddWorshipService(AddWorshipServicePayload {
            church_id: "church_1".into(),
            service: sample_draft(),
            offline_id: "offline_abc".into(),
        });
        let delete = QueuedMutation::DeleteWorshipService(DeleteWorshipServicePayload {
            church_id: "church_1".into(),
            service_id: "ws_1".into(),
        });

        assert_eq!(add.offline_id(), Some("offline_abc"));
        assert_eq!(delete.offline_id(), None);
        assert_eq!(add.scope_id(), "church_1");
    }
}
