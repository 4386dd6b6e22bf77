use crate::domain::entities::{
    Announcement, AnnouncementDraft, BaptizedMember, BaptizedMemberDraft, BureauActivity,
    BureauActivityDraft, BureauMember, BureauMemberDraft, ChurchActivity, ChurchActivityDraft,
    FullSnapshot, User, UserDraft, WorshipService, WorshipServiceDraft,
};
use crate::domain::value_objects::Scope;
use crate::shared::error::AppError;
use async_trait::async_trait;

/// The authoritative store. It owns canonical identifiers, the report
/// status machine, and audit/notification emission. Both the online
/// mutation path and queued replay go through these same entry points;
/// create calls accept the temporary id so the store can reconcile it
/// instead of appending a duplicate record.
#[async_trait]
pub trait RemoteDataStore: Send + Sync {
    // Session
    async fn login(&self, username: &str, password: &str) -> Result<User, AppError>;
    async fn logout(&self) -> Result<(), AppError>;
    async fn current_user(&self) -> Result<Option<User>, AppError>;
    async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError>;

    async fn get_full_snapshot(&self) -> Result<FullSnapshot, AppError>;

    // User management
    async fn add_user(&self, draft: UserDraft) -> Result<User, AppError>;
    async fn update_user(&self, user: User) -> Result<User, AppError>;
    async fn delete_user(&self, user_id: &str) -> Result<(), AppError>;

    // Worship services
    async fn add_worship_service(
        &self,
        church_id: &str,
        draft: WorshipServiceDraft,
        offline_id: Option<String>,
    ) -> Result<WorshipService, AppError>;
    async fn update_worship_service(
        &self,
        church_id: &str,
        service: WorshipService,
    ) -> Result<WorshipService, AppError>;
    async fn delete_worship_service(
        &self,
        church_id: &str,
        service_id: &str,
    ) -> Result<(), AppError>;
    async fn validate_worship_service(
        &self,
        church_id: &str,
        service_id: &str,
    ) -> Result<(), AppError>;
    async fn reject_worship_service(
        &self,
        church_id: &str,
        service_id: &str,
        reason: &str,
    ) -> Result<(), AppError>;

    // Baptized members
    async fn add_baptized_member(
        &self,
        church_id: &str,
        draft: BaptizedMemberDraft,
        offline_id: Option<String>,
    ) -> Result<BaptizedMember, AppError>;
    async fn update_baptized_member(
        &self,
        church_id: &str,
        member: BaptizedMember,
    ) -> Result<BaptizedMember, AppError>;
    async fn delete_baptized_member(
        &self,
        church_id: &str,
        member_id: &str,
    ) -> Result<(), AppError>;

    // Church activities
    async fn add_church_activity(
        &self,
        church_id: &str,
        draft: ChurchActivityDraft,
        offline_id: Option<String>,
    ) -> Result<ChurchActivity, AppError>;
    async fn update_church_activity(
        &self,
        church_id: &str,
        activity: ChurchActivity,
    ) -> Result<ChurchActivity, AppError>;
    async fn delete_church_activity(
        &self,
        church_id: &str,
        activity_id: &str,
    ) -> Result<(), AppError>;

    // Announcements
    async fn add_announcement(
        &self,
        church_id: &str,
        draft: AnnouncementDraft,
        offline_id: Option<String>,
    ) -> Result<Announcement, AppError>;
    async fn update_announcement(
        &self,
        church_id: &str,
        announcement: Announcement,
    ) -> Result<Announcement, AppError>;
    async fn delete_announcement(
        &self,
        church_id: &str,
        announcement_id: &str,
    ) -> Result<(), AppError>;

    // Bureau (online-only, scope-addressed)
    async fn add_bureau_member(
        &self,
        scope: &Scope,
        draft: BureauMemberDraft,
    ) -> Result<BureauMember, AppError>;
    async fn update_bureau_member(
        &self,
        scope: &Scope,
        member: BureauMember,
    ) -> Result<BureauMember, AppError>;
    async fn delete_bureau_member(&self, scope: &Scope, member_id: &str) -> Result<(), AppError>;
    async fn add_bureau_activity(
        &self,
        scope: &Scope,
        draft: BureauActivityDraft,
    ) -> Result<BureauActivity, AppError>;
    async fn update_bureau_activity(
        &self,
        scope: &Scope,
        activity: BureauActivity,
    ) -> Result<BureauActivity, AppError>;
    async fn delete_bureau_activity(
        &self,
        scope: &Scope,
        activity_id: &str,
    ) -> Result<(), AppError>;

    // Notifications
    async fn mark_notification_read(&self, notification_id: i64) -> Result<(), AppError>;
    async fn mark_all_notifications_read(&self) -> Result<(), AppError>;
}
