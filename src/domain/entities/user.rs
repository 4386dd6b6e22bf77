use crate::domain::value_objects::Permission;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    National,
    Region,
    Church,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    /// Only present on creation/update payloads, never stored long-term.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub role_id: String,
    pub level: AccessLevel,
    pub permissions: Vec<Permission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub church_id: Option<String>,
    #[serde(default)]
    pub force_password_change: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub role_id: String,
    pub level: AccessLevel,
    pub permissions: Vec<Permission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub church_id: Option<String>,
    #[serde(default)]
    pub force_password_change: bool,
}

impl User {
    pub fn from_draft(draft: UserDraft, id: String) -> Self {
        Self {
            id,
            username: draft.username,
            password: draft.password,
            role_id: draft.role_id,
            level: draft.level,
            permissions: draft.permissions,
            region_id: draft.region_id,
            church_id: draft.church_id,
            force_password_change: draft.force_password_change,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}
