use crate::application::ports::durable_store::{blob_keys, DurablePersistence};
use crate::application::ports::remote_store::RemoteDataStore;
use crate::domain::entities::{
    Announcement, AnnouncementDraft, AuditLog, BaptizedMember, BaptizedMemberDraft, BureauActivity,
    BureauActivityDraft, BureauMember, BureauMemberDraft, ChurchActivity, ChurchActivityDraft,
    FullSnapshot, NationalData, Notification, User, UserDraft, WorshipService, WorshipServiceDraft,
};
use crate::domain::value_objects::{record_id, Permission, RecordStatus, Scope};
use crate::infrastructure::server::seed;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

struct ServerState {
    data: NationalData,
    users: Vec<User>,
    notifications: Vec<Notification>,
    audit_logs: Vec<AuditLog>,
    session: Option<User>,
    notification_seq: i64,
}

impl ServerState {
    fn blob(&self, key: &str) -> Result<Value, AppError> {
        match key {
            blob_keys::DATA => Ok(serde_json::to_value(&self.data)?),
            blob_keys::USERS => Ok(serde_json::to_value(&self.users)?),
            blob_keys::NOTIFICATIONS => Ok(serde_json::to_value(&self.notifications)?),
            blob_keys::AUDIT_LOGS => Ok(serde_json::to_value(&self.audit_logs)?),
            blob_keys::SESSION => Ok(serde_json::to_value(&self.session)?),
            other => Err(AppError::Internal(format!("unknown blob key: {other}"))),
        }
    }
}

/// In-process stand-in for the authoritative server. Owns canonical
/// identifiers, the report status machine, and audit/notification
/// emission; every mutation is atomic over the single state it holds
/// and is persisted to the durable blobs before returning.
pub struct ServerSimulator {
    state: RwLock<ServerState>,
    durable: Arc<dyn DurablePersistence>,
    latency: Duration,
    fail_transport: AtomicBool,
}

impl ServerSimulator {
    /// Loads canonical state from the durable blobs, seeding the
    /// initial dataset on first run.
    pub async fn bootstrap(
        durable: Arc<dyn DurablePersistence>,
        latency_ms: u64,
    ) -> Result<Self, AppError> {
        let data = durable.get_blob(blob_keys::DATA).await?;
        let users = durable.get_blob(blob_keys::USERS).await?;
        let notifications = durable.get_blob(blob_keys::NOTIFICATIONS).await?;
        let audit_logs = durable.get_blob(blob_keys::AUDIT_LOGS).await?;
        let session = durable.get_blob(blob_keys::SESSION).await?;

        let state = match (data, users, notifications, audit_logs) {
            (Some(data), Some(users), Some(notifications), Some(audit_logs)) => {
                let notifications: Vec<Notification> = serde_json::from_value(notifications)?;
                let notification_seq = notifications.iter().map(|n| n.id).max().unwrap_or(0);
                ServerState {
                    data: serde_json::from_value(data)?,
                    users: serde_json::from_value(users)?,
                    notifications,
                    audit_logs: serde_json::from_value(audit_logs)?,
                    session: session
                        .map(serde_json::from_value::<Option<User>>)
                        .transpose()?
                        .flatten(),
                    notification_seq,
                }
            }
            _ => {
                info!("no persisted snapshot found, seeding initial dataset");
                let (data, users, notifications) = seed::initial_dataset();
                let notification_seq = notifications.iter().map(|n| n.id).max().unwrap_or(0);
                ServerState {
                    data,
                    users,
                    notifications,
                    audit_logs: Vec::new(),
                    session: None,
                    notification_seq,
                }
            }
        };

        let simulator = Self {
            state: RwLock::new(state),
            durable,
            latency: Duration::from_millis(latency_ms),
            fail_transport: AtomicBool::new(false),
        };
        simulator
            .persist(&[
                blob_keys::DATA,
                blob_keys::USERS,
                blob_keys::NOTIFICATIONS,
                blob_keys::AUDIT_LOGS,
                blob_keys::SESSION,
            ])
            .await?;
        Ok(simulator)
    }

    /// Makes every subsequent call fail with a transport error until
    /// cleared. Used to exercise the network failure paths.
    pub fn set_transport_failure(&self, fail: bool) {
        self.fail_transport.store(fail, Ordering::SeqCst);
    }

    async fn round_trip(&self) -> Result<(), AppError> {
        if self.fail_transport.load(Ordering::SeqCst) {
            return Err(AppError::Network("simulated transport failure".to_string()));
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(())
    }

    async fn persist(&self, keys: &[&str]) -> Result<(), AppError> {
        let blobs: Vec<(String, Value)> = {
            let state = self.state.read().await;
            keys.iter()
                .map(|key| Ok((key.to_string(), state.blob(key)?)))
                .collect::<Result<_, AppError>>()?
        };
        for (key, value) in blobs {
            self.durable.put_blob(&key, &value).await?;
        }
        Ok(())
    }

    fn log_action(state: &mut ServerState, action: &str, details: String) {
        let Some(actor) = &state.session else {
            return;
        };
        state.audit_logs.insert(
            0,
            AuditLog {
                id: record_id::generate("log"),
                timestamp: Utc::now(),
                actor_username: actor.username.clone(),
                action: action.to_string(),
                details,
            },
        );
    }

    fn push_notification(state: &mut ServerState, message: String) {
        state.notification_seq += 1;
        state.notifications.insert(
            0,
            Notification {
                id: state.notification_seq,
                message,
                read: false,
                timestamp: Utc::now(),
            },
        );
    }

    fn church_name(state: &ServerState, church_id: &str) -> String {
        state
            .data
            .church(church_id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| church_id.to_string())
    }

    fn require_permission(state: &ServerState, permission: Permission) -> Result<(), AppError> {
        match &state.session {
            Some(user) if user.has_permission(permission) => Ok(()),
            Some(user) => Err(AppError::Unauthorized(format!(
                "user {} lacks the required permission",
                user.username
            ))),
            None => Err(AppError::Unauthorized("no active session".to_string())),
        }
    }

    fn bureau_of<'a>(
        data: &'a mut NationalData,
        scope: &Scope,
    ) -> Result<&'a mut Vec<BureauMember>, AppError> {
        match scope {
            Scope::National => Ok(&mut data.bureau),
            Scope::Region(id) => data
                .regions
                .get_mut(id)
                .map(|r| &mut r.bureau)
                .ok_or_else(|| AppError::NotFound(format!("region {id} not found"))),
            Scope::Church(id) => data
                .churches
                .get_mut(id)
                .map(|c| &mut c.bureau)
                .ok_or_else(|| AppError::NotFound(format!("church {id} not found"))),
        }
    }

    fn bureau_activities_of<'a>(
        data: &'a mut NationalData,
        scope: &Scope,
    ) -> Result<&'a mut Vec<BureauActivity>, AppError> {
        match scope {
            Scope::National => Ok(&mut data.activities),
            Scope::Region(id) => data
                .regions
                .get_mut(id)
                .map(|r| &mut r.activities)
                .ok_or_else(|| AppError::NotFound(format!("region {id} not found"))),
            Scope::Church(_) => Err(AppError::Unsupported(
                "church-level bureaus do not keep their own activity log".to_string(),
            )),
        }
    }
}

#[async_trait]
impl RemoteDataStore for ServerSimulator {
    async fn login(&self, username: &str, _password: &str) -> Result<User, AppError> {
        self.round_trip().await?;
        let user = {
            let mut state = self.state.write().await;
            let user = state
                .users
                .iter()
                .find(|u| u.username == username)
                .cloned()
                .ok_or_else(|| AppError::Unauthorized("invalid credentials".to_string()))?;
            state.session = Some(user.clone());
            user
        };
        self.persist(&[blob_keys::SESSION]).await?;
        Ok(user)
    }

    async fn logout(&self) -> Result<(), AppError> {
        {
            let mut state = self.state.write().await;
            state.session = None;
        }
        self.persist(&[blob_keys::SESSION]).await
    }

    async fn current_user(&self) -> Result<Option<User>, AppError> {
        Ok(self.state.read().await.session.clone())
    }

    async fn change_password(
        &self,
        user_id: &str,
        _old_password: &str,
        _new_password: &str,
    ) -> Result<(), AppError> {
        self.round_trip().await?;
        {
            let mut state = self.state.write().await;
            let session_matches = state
                .session
                .as_ref()
                .map(|u| u.id == user_id)
                .unwrap_or(false);
            if !session_matches {
                return Err(AppError::Unauthorized(
                    "could not change password".to_string(),
                ));
            }
            if let Some(session) = state.session.as_mut() {
                session.force_password_change = false;
            }
            let username = state
                .session
                .as_ref()
                .map(|u| u.username.clone())
                .unwrap_or_default();
            if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
                user.force_password_change = false;
            }
            Self::log_action(
                &mut state,
                "CHANGE_PASSWORD",
                format!("User {username} changed their password."),
            );
        }
        self.persist(&[blob_keys::SESSION, blob_keys::USERS, blob_keys::AUDIT_LOGS])
            .await
    }

    async fn get_full_snapshot(&self) -> Result<FullSnapshot, AppError> {
        self.round_trip().await?;
        let state = self.state.read().await;
        Ok(FullSnapshot {
            data: state.data.clone(),
            users: state.users.clone(),
            notifications: state.notifications.clone(),
            audit_logs: state.audit_logs.clone(),
        })
    }

    async fn add_user(&self, draft: UserDraft) -> Result<User, AppError> {
        self.round_trip().await?;
        let user = {
            let mut state = self.state.write().await;
            let user = User::from_draft(draft, record_id::generate("user"));
            state.users.push(user.clone());
            Self::log_action(
                &mut state,
                "ADD_USER",
                format!("Created user {}.", user.username),
            );
            user
        };
        self.persist(&[blob_keys::USERS, blob_keys::AUDIT_LOGS]).await?;
        Ok(user)
    }

    async fn update_user(&self, user: User) -> Result<User, AppError> {
        self.round_trip().await?;
        let updated = {
            let mut state = self.state.write().await;
            let index = state
                .users
                .iter()
                .position(|u| u.id == user.id)
                .ok_or_else(|| AppError::NotFound(format!("user {} not found", user.id)))?;
            state.users[index] = user.clone();
            Self::log_action(
                &mut state,
                "UPDATE_USER",
                format!("Updated user {}.", user.username),
            );
            user
        };
        self.persist(&[blob_keys::USERS, blob_keys::AUDIT_LOGS]).await?;
        Ok(updated)
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        self.round_trip().await?;
        {
            let mut state = self.state.write().await;
            let removed = state.users.iter().find(|u| u.id == user_id).cloned();
            state.users.retain(|u| u.id != user_id);
            if let Some(user) = removed {
                Self::log_action(
                    &mut state,
                    "DELETE_USER",
                    format!("Deleted user {}.", user.username),
                );
            }
        }
        self.persist(&[blob_keys::USERS, blob_keys::AUDIT_LOGS]).await
    }

    async fn add_worship_service(
        &self,
        church_id: &str,
        draft: WorshipServiceDraft,
        offline_id: Option<String>,
    ) -> Result<WorshipService, AppError> {
        self.round_trip().await?;
        let service = {
            let mut state = self.state.write().await;
            let service = {
                let church = state
                    .data
                    .church_mut(church_id)
                    .ok_or_else(|| AppError::NotFound(format!("church {church_id} not found")))?;
                let canonical_id = record_id::generate("ws");
                // A record still carrying the temporary id gets its id
                // overwritten in place instead of a duplicate append.
                let reconciled = match offline_id {
                    Some(temp_id) => church
                        .worship_services
                        .iter_mut()
                        .find(|s| s.id == temp_id),
                    None => None,
                };
                match reconciled {
                    Some(existing) => {
                        existing.id = canonical_id;
                        existing.status = RecordStatus::Pending;
                        existing.clone()
                    }
                    None => {
                        let service = WorshipService::from_draft(
                            draft,
                            canonical_id,
                            RecordStatus::Pending,
                        );
                        church.worship_services.push(service.clone());
                        service
                    }
                }
            };
            let church_name = Self::church_name(&state, church_id);
            Self::log_action(
                &mut state,
                "ADD_REPORT",
                format!(
                    "Added worship service for {church_name} on {}.",
                    service.date
                ),
            );
            Self::push_notification(
                &mut state,
                format!("New worship report submitted by {church_name}."),
            );
            service
        };
        self.persist(&[blob_keys::DATA, blob_keys::AUDIT_LOGS, blob_keys::NOTIFICATIONS])
            .await?;
        Ok(service)
    }

    async fn update_worship_service(
        &self,
        church_id: &str,
        service: WorshipService,
    ) -> Result<WorshipService, AppError> {
        self.round_trip().await?;
        let updated = {
            let mut state = self.state.write().await;
            let updated = {
                let church = state
                    .data
                    .church_mut(church_id)
                    .ok_or_else(|| AppError::NotFound(format!("church {church_id} not found")))?;
                let existing = church
                    .worship_services
                    .iter_mut()
                    .find(|s| s.id == service.id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("worship service {} not found", service.id))
                    })?;
                if existing.status.is_terminal() {
                    return Err(AppError::Consistency(
                        "validated reports can no longer be edited".to_string(),
                    ));
                }
                let mut stored = service;
                stored.status = RecordStatus::Pending;
                *existing = stored.clone();
                stored
            };
            let church_name = Self::church_name(&state, church_id);
            Self::log_action(
                &mut state,
                "UPDATE_REPORT",
                format!("Updated report for {church_name} from {}.", updated.date),
            );
            Self::push_notification(
                &mut state,
                format!("Worship report from {church_name} was updated."),
            );
            updated
        };
        self.persist(&[blob_keys::DATA, blob_keys::AUDIT_LOGS, blob_keys::NOTIFICATIONS])
            .await?;
        Ok(updated)
    }

    async fn delete_worship_service(
        &self,
        church_id: &str,
        service_id: &str,
    ) -> Result<(), AppError> {
        self.round_trip().await?;
        {
            let mut state = self.state.write().await;
            {
                let church = state
                    .data
                    .church_mut(church_id)
                    .ok_or_else(|| AppError::NotFound(format!("church {church_id} not found")))?;
                let existing = church
                    .worship_services
                    .iter()
                    .find(|s| s.id == service_id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("worship service {service_id} not found"))
                    })?;
                if existing.status.is_terminal() {
                    return Err(AppError::Consistency(
                        "validated reports can no longer be deleted".to_string(),
                    ));
                }
                church.worship_services.retain(|s| s.id != service_id);
            }
            let church_name = Self::church_name(&state, church_id);
            Self::log_action(
                &mut state,
                "DELETE_REPORT",
                format!("Deleted report from {church_name} (ID: {service_id})."),
            );
        }
        self.persist(&[blob_keys::DATA, blob_keys::AUDIT_LOGS]).await
    }

    async fn validate_worship_service(
        &self,
        church_id: &str,
        service_id: &str,
    ) -> Result<(), AppError> {
        self.round_trip().await?;
        {
            let mut state = self.state.write().await;
            Self::require_permission(&state, Permission::ValidateReports)?;
            let date = {
                let church = state
                    .data
                    .church_mut(church_id)
                    .ok_or_else(|| AppError::NotFound(format!("church {church_id} not found")))?;
                let service = church
                    .worship_services
                    .iter_mut()
                    .find(|s| s.id == service_id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("worship service {service_id} not found"))
                    })?;
                if service.status.is_terminal() {
                    return Err(AppError::Consistency(
                        "report is already validated".to_string(),
                    ));
                }
                service.status = RecordStatus::Validated;
                service.date
            };
            let church_name = Self::church_name(&state, church_id);
            Self::log_action(
                &mut state,
                "VALIDATE_REPORT",
                format!("Validated report for {church_name} from {date}."),
            );
        }
        self.persist(&[blob_keys::DATA, blob_keys::AUDIT_LOGS]).await
    }

    async fn reject_worship_service(
        &self,
        church_id: &str,
        service_id: &str,
        reason: &str,
    ) -> Result<(), AppError> {
        if reason.trim().is_empty() {
            return Err(AppError::Validation(
                "a rejection reason is required".to_string(),
            ));
        }
        self.round_trip().await?;
        {
            let mut state = self.state.write().await;
            Self::require_permission(&state, Permission::ValidateReports)?;
            let date = {
                let church = state
                    .data
                    .church_mut(church_id)
                    .ok_or_else(|| AppError::NotFound(format!("church {church_id} not found")))?;
                let service = church
                    .worship_services
                    .iter_mut()
                    .find(|s| s.id == service_id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("worship service {service_id} not found"))
                    })?;
                if service.status.is_terminal() {
                    return Err(AppError::Consistency(
                        "report is already validated".to_string(),
                    ));
                }
                service.status = RecordStatus::Rejected;
                service.rejection_reason = Some(reason.to_string());
                service.date
            };
            let church_name = Self::church_name(&state, church_id);
            Self::log_action(
                &mut state,
                "REJECT_REPORT",
                format!("Rejected report for {church_name} from {date}. Reason: {reason}"),
            );
        }
        self.persist(&[blob_keys::DATA, blob_keys::AUDIT_LOGS]).await
    }

    async fn add_baptized_member(
        &self,
        church_id: &str,
        draft: BaptizedMemberDraft,
        offline_id: Option<String>,
    ) -> Result<BaptizedMember, AppError> {
        self.round_trip().await?;
        let member = {
            let mut state = self.state.write().await;
            let member = {
                let church = state
                    .data
                    .church_mut(church_id)
                    .ok_or_else(|| AppError::NotFound(format!("church {church_id} not found")))?;
                let canonical_id = record_id::generate("bm");
                let reconciled = match offline_id {
                    Some(temp_id) => church
                        .baptized_members
                        .iter_mut()
                        .find(|m| m.id == temp_id),
                    None => None,
                };
                match reconciled {
                    Some(existing) => {
                        existing.id = canonical_id;
                        existing.status = None;
                        existing.clone()
                    }
                    None => {
                        let member = BaptizedMember::from_draft(draft, canonical_id, None);
                        church.baptized_members.push(member.clone());
                        member
                    }
                }
            };
            let church_name = Self::church_name(&state, church_id);
            Self::log_action(
                &mut state,
                "ADD_MEMBER",
                format!("Added member {} to {church_name}.", member.full_name),
            );
            member
        };
        self.persist(&[blob_keys::DATA, blob_keys::AUDIT_LOGS]).await?;
        Ok(member)
    }

    async fn update_baptized_member(
        &self,
        church_id: &str,
        member: BaptizedMember,
    ) -> Result<BaptizedMember, AppError> {
        self.round_trip().await?;
        let updated = {
            let mut state = self.state.write().await;
            let updated = {
                let church = state
                    .data
                    .church_mut(church_id)
                    .ok_or_else(|| AppError::NotFound(format!("church {church_id} not found")))?;
                let index = church
                    .baptized_members
                    .iter()
                    .position(|m| m.id == member.id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("member {} not found", member.id))
                    })?;
                let mut stored = member;
                stored.status = None;
                church.baptized_members[index] = stored.clone();
                stored
            };
            let church_name = Self::church_name(&state, church_id);
            Self::log_action(
                &mut state,
                "UPDATE_MEMBER",
                format!("Updated member {} in {church_name}.", updated.full_name),
            );
            updated
        };
        self.persist(&[blob_keys::DATA, blob_keys::AUDIT_LOGS]).await?;
        Ok(updated)
    }

    async fn delete_baptized_member(
        &self,
        church_id: &str,
        member_id: &str,
    ) -> Result<(), AppError> {
        self.round_trip().await?;
        {
            let mut state = self.state.write().await;
            let full_name = {
                let church = state
                    .data
                    .church_mut(church_id)
                    .ok_or_else(|| AppError::NotFound(format!("church {church_id} not found")))?;
                let member = church
                    .baptized_members
                    .iter()
                    .find(|m| m.id == member_id)
                    .ok_or_else(|| AppError::NotFound(format!("member {member_id} not found")))?;
                let full_name = member.full_name.clone();
                church.baptized_members.retain(|m| m.id != member_id);
                full_name
            };
            let church_name = Self::church_name(&state, church_id);
            Self::log_action(
                &mut state,
                "DELETE_MEMBER",
                format!("Deleted member {full_name} from {church_name}."),
            );
        }
        self.persist(&[blob_keys::DATA, blob_keys::AUDIT_LOGS]).await
    }

    async fn add_church_activity(
        &self,
        church_id: &str,
        draft: ChurchActivityDraft,
        offline_id: Option<String>,
    ) -> Result<ChurchActivity, AppError> {
        self.round_trip().await?;
        let activity = {
            let mut state = self.state.write().await;
            let activity = {
                let church = state
                    .data
                    .church_mut(church_id)
                    .ok_or_else(|| AppError::NotFound(format!("church {church_id} not found")))?;
                let canonical_id = record_id::generate("ca");
                let reconciled = match offline_id {
                    Some(temp_id) => church.activities.iter_mut().find(|a| a.id == temp_id),
                    None => None,
                };
                match reconciled {
                    Some(existing) => {
                        existing.id = canonical_id;
                        existing.status = None;
                        existing.clone()
                    }
                    None => {
                        let activity = ChurchActivity::from_draft(draft, canonical_id, None);
                        church.activities.push(activity.clone());
                        activity
                    }
                }
            };
            let church_name = Self::church_name(&state, church_id);
            Self::log_action(
                &mut state,
                "ADD_CHURCH_ACTIVITY",
                format!("Added activity \"{}\" to {church_name}.", activity.title),
            );
            activity
        };
        self.persist(&[blob_keys::DATA, blob_keys::AUDIT_LOGS]).await?;
        Ok(activity)
    }

    async fn update_church_activity(
        &self,
        church_id: &str,
        activity: ChurchActivity,
    ) -> Result<ChurchActivity, AppError> {
        self.round_trip().await?;
        let updated = {
            let mut state = self.state.write().await;
            let updated = {
                let church = state
                    .data
                    .church_mut(church_id)
                    .ok_or_else(|| AppError::NotFound(format!("church {church_id} not found")))?;
                let index = church
                    .activities
                    .iter()
                    .position(|a| a.id == activity.id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("activity {} not found", activity.id))
                    })?;
                let mut stored = activity;
                stored.status = None;
                church.activities[index] = stored.clone();
                stored
            };
            let church_name = Self::church_name(&state, church_id);
            Self::log_action(
                &mut state,
                "UPDATE_CHURCH_ACTIVITY",
                format!("Updated activity \"{}\" in {church_name}.", updated.title),
            );
            updated
        };
        self.persist(&[blob_keys::DATA, blob_keys::AUDIT_LOGS]).await?;
        Ok(updated)
    }

    async fn delete_church_activity(
        &self,
        church_id: &str,
        activity_id: &str,
    ) -> Result<(), AppError> {
        self.round_trip().await?;
        {
            let mut state = self.state.write().await;
            let title = {
                let church = state
                    .data
                    .church_mut(church_id)
                    .ok_or_else(|| AppError::NotFound(format!("church {church_id} not found")))?;
                let activity = church
                    .activities
                    .iter()
                    .find(|a| a.id == activity_id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("activity {activity_id} not found"))
                    })?;
                let title = activity.title.clone();
                church.activities.retain(|a| a.id != activity_id);
                title
            };
            let church_name = Self::church_name(&state, church_id);
            Self::log_action(
                &mut state,
                "DELETE_CHURCH_ACTIVITY",
                format!("Deleted activity \"{title}\" from {church_name}."),
            );
        }
        self.persist(&[blob_keys::DATA, blob_keys::AUDIT_LOGS]).await
    }

    async fn add_announcement(
        &self,
        church_id: &str,
        draft: AnnouncementDraft,
        offline_id: Option<String>,
    ) -> Result<Announcement, AppError> {
        self.round_trip().await?;
        let announcement = {
            let mut state = self.state.write().await;
            let author = state
                .session
                .clone()
                .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))?;
            let now = Utc::now();
            let announcement = {
                let church = state
                    .data
                    .church_mut(church_id)
                    .ok_or_else(|| AppError::NotFound(format!("church {church_id} not found")))?;
                let canonical_id = record_id::generate("ann");
                let reconciled = match offline_id {
                    Some(temp_id) => church.announcements.iter_mut().find(|a| a.id == temp_id),
                    None => None,
                };
                match reconciled {
                    Some(existing) => {
                        existing.id = canonical_id;
                        existing.status = None;
                        existing.created_at = now;
                        existing.updated_at = now;
                        existing.clone()
                    }
                    None => {
                        let announcement = Announcement {
                            id: canonical_id,
                            title: draft.title,
                            content: draft.content,
                            author_id: author.id.clone(),
                            author_name: author.username.clone(),
                            created_at: now,
                            updated_at: now,
                            status: None,
                        };
                        church.announcements.push(announcement.clone());
                        announcement
                    }
                }
            };
            let church_name = Self::church_name(&state, church_id);
            Self::log_action(
                &mut state,
                "ADD_ANNOUNCEMENT",
                format!(
                    "Added announcement \"{}\" to {church_name}.",
                    announcement.title
                ),
            );
            Self::push_notification(
                &mut state,
                format!("New announcement published by {church_name}."),
            );
            announcement
        };
        self.persist(&[blob_keys::DATA, blob_keys::AUDIT_LOGS, blob_keys::NOTIFICATIONS])
            .await?;
        Ok(announcement)
    }

    async fn update_announcement(
        &self,
        church_id: &str,
        announcement: Announcement,
    ) -> Result<Announcement, AppError> {
        self.round_trip().await?;
        let updated = {
            let mut state = self.state.write().await;
            let updated = {
                let church = state
                    .data
                    .church_mut(church_id)
                    .ok_or_else(|| AppError::NotFound(format!("church {church_id} not found")))?;
                let index = church
                    .announcements
                    .iter()
                    .position(|a| a.id == announcement.id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("announcement {} not found", announcement.id))
                    })?;
                let mut stored = announcement;
                stored.updated_at = Utc::now();
                stored.status = None;
                church.announcements[index] = stored.clone();
                stored
            };
            let church_name = Self::church_name(&state, church_id);
            Self::log_action(
                &mut state,
                "UPDATE_ANNOUNCEMENT",
                format!(
                    "Updated announcement \"{}\" in {church_name}.",
                    updated.title
                ),
            );
            updated
        };
        self.persist(&[blob_keys::DATA, blob_keys::AUDIT_LOGS]).await?;
        Ok(updated)
    }

    async fn delete_announcement(
        &self,
        church_id: &str,
        announcement_id: &str,
    ) -> Result<(), AppError> {
        self.round_trip().await?;
        {
            let mut state = self.state.write().await;
            let title = {
                let church = state
                    .data
                    .church_mut(church_id)
                    .ok_or_else(|| AppError::NotFound(format!("church {church_id} not found")))?;
                let announcement = church
                    .announcements
                    .iter()
                    .find(|a| a.id == announcement_id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("announcement {announcement_id} not found"))
                    })?;
                let title = announcement.title.clone();
                church.announcements.retain(|a| a.id != announcement_id);
                title
            };
            let church_name = Self::church_name(&state, church_id);
            Self::log_action(
                &mut state,
                "DELETE_ANNOUNCEMENT",
                format!("Deleted announcement \"{title}\" from {church_name}."),
            );
        }
        self.persist(&[blob_keys::DATA, blob_keys::AUDIT_LOGS]).await
    }

    async fn add_bureau_member(
        &self,
        scope: &Scope,
        draft: BureauMemberDraft,
    ) -> Result<BureauMember, AppError> {
        self.round_trip().await?;
        let member = {
            let mut state = self.state.write().await;
            let member = {
                let bureau = Self::bureau_of(&mut state.data, scope)?;
                let member = BureauMember::from_draft(draft, record_id::generate("bm"));
                bureau.push(member.clone());
                member
            };
            Self::log_action(
                &mut state,
                "ADD_BUREAU_MEMBER",
                format!("Added bureau member {} to {scope}.", member.name),
            );
            member
        };
        self.persist(&[blob_keys::DATA, blob_keys::AUDIT_LOGS]).await?;
        Ok(member)
    }

    async fn update_bureau_member(
        &self,
        scope: &Scope,
        member: BureauMember,
    ) -> Result<BureauMember, AppError> {
        self.round_trip().await?;
        let updated = {
            let mut state = self.state.write().await;
            let updated = {
                let bureau = Self::bureau_of(&mut state.data, scope)?;
                let index = bureau
                    .iter()
                    .position(|m| m.id == member.id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("bureau member {} not found", member.id))
                    })?;
                bureau[index] = member.clone();
                member
            };
            Self::log_action(
                &mut state,
                "UPDATE_BUREAU_MEMBER",
                format!("Updated bureau member {} in {scope}.", updated.name),
            );
            updated
        };
        self.persist(&[blob_keys::DATA, blob_keys::AUDIT_LOGS]).await?;
        Ok(updated)
    }

    async fn delete_bureau_member(&self, scope: &Scope, member_id: &str) -> Result<(), AppError> {
        self.round_trip().await?;
        {
            let mut state = self.state.write().await;
            {
                let bureau = Self::bureau_of(&mut state.data, scope)?;
                if !bureau.iter().any(|m| m.id == member_id) {
                    return Err(AppError::NotFound(format!(
                        "bureau member {member_id} not found"
                    )));
                }
                bureau.retain(|m| m.id != member_id);
            }
            Self::log_action(
                &mut state,
                "DELETE_BUREAU_MEMBER",
                format!("Deleted bureau member (ID: {member_id}) from {scope}."),
            );
        }
        self.persist(&[blob_keys::DATA, blob_keys::AUDIT_LOGS]).await
    }

    async fn add_bureau_activity(
        &self,
        scope: &Scope,
        draft: BureauActivityDraft,
    ) -> Result<BureauActivity, AppError> {
        self.round_trip().await?;
        let activity = {
            let mut state = self.state.write().await;
            let activity = {
                let activities = Self::bureau_activities_of(&mut state.data, scope)?;
                let activity = BureauActivity::from_draft(draft, record_id::generate("ba"));
                activities.push(activity.clone());
                activity
            };
            Self::log_action(
                &mut state,
                "ADD_BUREAU_ACTIVITY",
                format!("Added bureau activity \"{}\" to {scope}.", activity.title),
            );
            activity
        };
        self.persist(&[blob_keys::DATA, blob_keys::AUDIT_LOGS]).await?;
        Ok(activity)
    }

    async fn update_bureau_activity(
        &self,
        scope: &Scope,
        activity: BureauActivity,
    ) -> Result<BureauActivity, AppError> {
        self.round_trip().await?;
        let updated = {
            let mut state = self.state.write().await;
            let updated = {
                let activities = Self::bureau_activities_of(&mut state.data, scope)?;
                let index = activities
                    .iter()
                    .position(|a| a.id == activity.id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("bureau activity {} not found", activity.id))
                    })?;
                activities[index] = activity.clone();
                activity
            };
            Self::log_action(
                &mut state,
                "UPDATE_BUREAU_ACTIVITY",
                format!("Updated bureau activity \"{}\" in {scope}.", updated.title),
            );
            updated
        };
        self.persist(&[blob_keys::DATA, blob_keys::AUDIT_LOGS]).await?;
        Ok(updated)
    }

    async fn delete_bureau_activity(
        &self,
        scope: &Scope,
        activity_id: &str,
    ) -> Result<(), AppError> {
        self.round_trip().await?;
        {
            let mut state = self.state.write().await;
            {
                let activities = Self::bureau_activities_of(&mut state.data, scope)?;
                if !activities.iter().any(|a| a.id == activity_id) {
                    return Err(AppError::NotFound(format!(
                        "bureau activity {activity_id} not found"
                    )));
                }
                activities.retain(|a| a.id != activity_id);
            }
            Self::log_action(
                &mut state,
                "DELETE_BUREAU_ACTIVITY",
                format!("Deleted bureau activity (ID: {activity_id}) from {scope}."),
            );
        }
        self.persist(&[blob_keys::DATA, blob_keys::AUDIT_LOGS]).await
    }

    async fn mark_notification_read(&self, notification_id: i64) -> Result<(), AppError> {
        {
            let mut state = self.state.write().await;
            if let Some(notification) = state
                .notifications
                .iter_mut()
                .find(|n| n.id == notification_id)
            {
                notification.read = true;
            }
        }
        self.persist(&[blob_keys::NOTIFICATIONS]).await
    }

    async fn mark_all_notifications_read(&self) -> Result<(), AppError> {
        {
            let mut state = self.state.write().await;
            for notification in state.notifications.iter_mut() {
                notification.read = true;
            }
        }
        self.persist(&[blob_keys::NOTIFICATIONS]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::report::{Attendance, Offering};
    use crate::infrastructure::database::MIGRATOR;
    use crate::infrastructure::offline::SqliteDurableStore;
    use chrono::NaiveDate;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_durable() -> Arc<dyn DurablePersistence> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        MIGRATOR.run(&pool).await.expect("migrations");
        Arc::new(SqliteDurableStore::new(pool))
    }

    async fn setup_server() -> ServerSimulator {
        let durable = setup_durable().await;
        ServerSimulator::bootstrap(durable, 0).await.expect("bootstrap")
    }

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

    #[tokio::test]
    async fn add_report_emits_audit_log_and_notification() {
        let server = setup_server().await;
        server.login("church_1_admin", "pw").await.unwrap();

        let service = server
            .add_worship_service("church_1", sample_draft(), None)
            .await
            .unwrap();
        assert_eq!(service.status, RecordStatus::Pending);

        let snapshot = server.get_full_snapshot().await.unwrap();
        assert_eq!(snapshot.audit_logs[0].action, "ADD_REPORT");
        assert_eq!(snapshot.audit_logs[0].actor_username, "church_1_admin");
        assert!(snapshot.notifications[0].message.contains("worship report"));
    }

    #[tokio::test]
    async fn create_with_offline_id_reconciles_in_place() {
        let durable = setup_durable().await;
        // Simulate a restart that left an optimistically created record
        // carrying its temporary id in the persisted collections.
        {
            let server = ServerSimulator::bootstrap(durable.clone(), 0).await.unwrap();
            server.login("church_1_admin", "pw").await.unwrap();
            let service = server
                .add_worship_service("church_1", sample_draft(), None)
                .await
                .unwrap();
            let mut stranded = service.clone();
            stranded.id = "offline_stranded".into();
            stranded.status = RecordStatus::Offline;
            // Rewrite the blob so the collection holds the temp id.
            let mut snapshot = server.get_full_snapshot().await.unwrap();
            snapshot.data.church_mut("church_1").unwrap().worship_services = vec![stranded];
            durable
                .put_blob(blob_keys::DATA, &serde_json::to_value(&snapshot.data).unwrap())
                .await
                .unwrap();
        }

        let server = ServerSimulator::bootstrap(durable, 0).await.unwrap();
        let reconciled = server
            .add_worship_service("church_1", sample_draft(), Some("offline_stranded".into()))
            .await
            .unwrap();

        assert_ne!(reconciled.id, "offline_stranded");
        assert_eq!(reconciled.status, RecordStatus::Pending);
        let snapshot = server.get_full_snapshot().await.unwrap();
        let services = &snapshot.data.church("church_1").unwrap().worship_services;
        assert_eq!(services.len(), 1, "reconciliation must not append a duplicate");
        assert_eq!(services[0].id, reconciled.id);
    }

    #[tokio::test]
    async fn validated_reports_are_locked() {
        let server = setup_server().await;
        server.login("national_admin", "pw").await.unwrap();

        let service = server
            .add_worship_service("church_1", sample_draft(), None)
            .await
            .unwrap();
        server
            .validate_worship_service("church_1", &service.id)
            .await
            .unwrap();

        let err = server
            .update_worship_service("church_1", service.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Consistency(_)));

        let err = server
            .delete_worship_service("church_1", &service.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Consistency(_)));

        let err = server
            .validate_worship_service("church_1", &service.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Consistency(_)));
    }

    #[tokio::test]
    async fn reject_requires_reason_and_permission() {
        let server = setup_server().await;
        server.login("national_admin", "pw").await.unwrap();
        let service = server
            .add_worship_service("church_1", sample_draft(), None)
            .await
            .unwrap();

        let err = server
            .reject_worship_service("church_1", &service.id, "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        server
            .reject_worship_service("church_1", &service.id, "attendance looks wrong")
            .await
            .unwrap();
        let snapshot = server.get_full_snapshot().await.unwrap();
        let stored = &snapshot.data.church("church_1").unwrap().worship_services[0];
        assert_eq!(stored.status, RecordStatus::Rejected);
        assert_eq!(stored.rejection_reason.as_deref(), Some("attendance looks wrong"));

        // Church admins hold no validation permission.
        server.login("church_1_admin", "pw").await.unwrap();
        let err = server
            .validate_worship_service("church_1", &service.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn update_of_missing_report_is_not_found() {
        let server = setup_server().await;
        server.login("church_1_admin", "pw").await.unwrap();

        let mut ghost = WorshipService::from_draft(
            sample_draft(),
            "ws_missing".into(),
            RecordStatus::Pending,
        );
        ghost.speaker = "Nobody".into();
        let err = server
            .update_worship_service("church_1", ghost)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn church_scope_has_no_bureau_activities() {
        let server = setup_server().await;
        server.login("national_admin", "pw").await.unwrap();

        let draft = BureauActivityDraft {
            title: "Planning".into(),
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            kind: "meeting".into(),
            description: "Quarterly planning".into(),
        };

        server
            .add_bureau_activity(&Scope::National, draft.clone())
            .await
            .unwrap();
        let err = server
            .add_bureau_activity(&Scope::Church("church_1".into()), draft)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unsupported(_)));
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_network_error() {
        let server = setup_server().await;
        server.set_transport_failure(true);
        let err = server.get_full_snapshot().await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)));

        server.set_transport_failure(false);
        assert!(server.get_full_snapshot().await.is_ok());
    }

    #[tokio::test]
    async fn announcement_create_requires_session_and_notifies() {
        let server = setup_server().await;
        let draft = AnnouncementDraft {
            title: "Revival week".into(),
            content: "Starts Monday".into(),
        };

        let err = server
            .add_announcement("church_1", draft.clone(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        server.login("church_1_admin", "pw").await.unwrap();
        let announcement = server
            .add_announcement("church_1", draft, None)
            .await
            .unwrap();
        assert_eq!(announcement.author_name, "church_1_admin");

        let snapshot = server.get_full_snapshot().await.unwrap();
        assert!(snapshot.notifications[0].message.contains("announcement"));
    }
}
