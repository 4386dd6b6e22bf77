use crate::domain::entities::church::NationalData;
use crate::domain::entities::system::{AuditLog, Notification};
use crate::domain::entities::user::User;
use serde::{Deserialize, Serialize};

/// Everything the authoritative store returns from one full round trip.
/// The snapshot store holds exactly this shape and replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullSnapshot {
    pub data: NationalData,
    pub users: Vec<User>,
    pub notifications: Vec<Notification>,
    pub audit_logs: Vec<AuditLog>,
}
