use crate::application::ports::durable_store::DurablePersistence;
use crate::application::ports::remote_store::RemoteDataStore;
use crate::application::services::snapshot_store::SnapshotStore;
use crate::domain::entities::offline::{
    AddAnnouncementPayload, AddBaptizedMemberPayload, AddChurchActivityPayload,
    AddWorshipServicePayload, DeleteAnnouncementPayload, DeleteBaptizedMemberPayload,
    DeleteChurchActivityPayload, DeleteWorshipServicePayload, OptimisticPatch, QueueEntry,
    QueuedMutation, UpdateAnnouncementPayload, UpdateBaptizedMemberPayload,
    UpdateChurchActivityPayload, UpdateWorshipServicePayload,
};
use crate::domain::entities::{
    Announcement, AnnouncementDraft, BaptizedMember, BaptizedMemberDraft, BureauActivity,
    BureauActivityDraft, BureauMember, BureauMemberDraft, ChurchActivity, ChurchActivityDraft,
    User, UserDraft, WorshipService, WorshipServiceDraft,
};
use crate::domain::value_objects::{record_id, RecordStatus, Scope};
use crate::shared::error::AppError;
use chrono::Utc;
use std::sync::Arc;

/// The mutation router. Every entity mutation flows through here, either
/// as an online call (authoritative store, then wholesale snapshot
/// refresh) or as an offline one (optimistic snapshot patch plus a
/// durable queue entry). It is the only writer of the snapshot store
/// besides the sync engine.
pub struct DataService {
    remote: Arc<dyn RemoteDataStore>,
    durable: Arc<dyn DurablePersistence>,
    snapshot: Arc<SnapshotStore>,
}

impl DataService {
    pub fn new(
        remote: Arc<dyn RemoteDataStore>,
        durable: Arc<dyn DurablePersistence>,
        snapshot: Arc<SnapshotStore>,
    ) -> Self {
        Self {
            remote,
            durable,
            snapshot,
        }
    }

    pub fn snapshot_store(&self) -> &Arc<SnapshotStore> {
        &self.snapshot
    }

    /// Replaces the snapshot wholesale with the current canonical state.
    /// Never a partial merge, so the client cannot diverge silently.
    pub async fn refresh(&self) -> Result<(), AppError> {
        let snapshot = self.remote.get_full_snapshot().await?;
        self.snapshot.replace(snapshot).await;
        Ok(())
    }

    // --- Online mutations -------------------------------------------------

    pub async fn add_worship_service(
        &self,
        church_id: &str,
        draft: WorshipServiceDraft,
    ) -> Result<WorshipService, AppError> {
        let service = self
            .remote
            .add_worship_service(church_id, draft, None)
            .await?;
        self.refresh().await?;
        Ok(service)
    }

    pub async fn update_worship_service(
        &self,
        church_id: &str,
        service: WorshipService,
    ) -> Result<WorshipService, AppError> {
        let updated = self.remote.update_worship_service(church_id, service).await?;
        self.refresh().await?;
        Ok(updated)
    }

    pub async fn delete_worship_service(
        &self,
        church_id: &str,
        service_id: &str,
    ) -> Result<(), AppError> {
        self.remote
            .delete_worship_service(church_id, service_id)
            .await?;
        self.refresh().await
    }

    pub async fn validate_worship_service(
        &self,
        church_id: &str,
        service_id: &str,
    ) -> Result<(), AppError> {
        self.remote
            .validate_worship_service(church_id, service_id)
            .await?;
        self.refresh().await
    }

    pub async fn reject_worship_service(
        &self,
        church_id: &str,
        service_id: &str,
        reason: &str,
    ) -> Result<(), AppError> {
        self.remote
            .reject_worship_service(church_id, service_id, reason)
            .await?;
        self.refresh().await
    }

    pub async fn add_baptized_member(
        &self,
        church_id: &str,
        draft: BaptizedMemberDraft,
    ) -> Result<BaptizedMember, AppError> {
        let member = self.remote.add_baptized_member(church_id, draft, None).await?;
        self.refresh().await?;
        Ok(member)
    }

    pub async fn update_baptized_member(
        &self,
        church_id: &str,
        member: BaptizedMember,
    ) -> Result<BaptizedMember, AppError> {
        let updated = self.remote.update_baptized_member(church_id, member).await?;
        self.refresh().await?;
        Ok(updated)
    }

    pub async fn delete_baptized_member(
        &self,
        church_id: &str,
        member_id: &str,
    ) -> Result<(), AppError> {
        self.remote
            .delete_baptized_member(church_id, member_id)
            .await?;
        self.refresh().await
    }

    pub async fn add_church_activity(
        &self,
        church_id: &str,
        draft: ChurchActivityDraft,
    ) -> Result<ChurchActivity, AppError> {
        let activity = self.remote.add_church_activity(church_id, draft, None).await?;
        self.refresh().await?;
        Ok(activity)
    }

    pub async fn update_church_activity(
        &self,
        church_id: &str,
        activity: ChurchActivity,
    ) -> Result<ChurchActivity, AppError> {
        let updated = self.remote.update_church_activity(church_id, activity).await?;
        self.refresh().await?;
        Ok(updated)
    }

    pub async fn delete_church_activity(
        &self,
        church_id: &str,
        activity_id: &str,
    ) -> Result<(), AppError> {
        self.remote
            .delete_church_activity(church_id, activity_id)
            .await?;
        self.refresh().await
    }

    pub async fn add_announcement(
        &self,
        church_id: &str,
        draft: AnnouncementDraft,
    ) -> Result<Announcement, AppError> {
        let announcement = self.remote.add_announcement(church_id, draft, None).await?;
        self.refresh().await?;
        Ok(announcement)
    }

    pub async fn update_announcement(
        &self,
        church_id: &str,
        announcement: Announcement,
    ) -> Result<Announcement, AppError> {
        let updated = self
            .remote
            .update_announcement(church_id, announcement)
            .await?;
        self.refresh().await?;
        Ok(updated)
    }

    pub async fn delete_announcement(
        &self,
        church_id: &str,
        announcement_id: &str,
    ) -> Result<(), AppError> {
        self.remote
            .delete_announcement(church_id, announcement_id)
            .await?;
        self.refresh().await
    }

    pub async fn add_user(&self, draft: UserDraft) -> Result<User, AppError> {
        let user = self.remote.add_user(draft).await?;
        self.refresh().await?;
        Ok(user)
    }

    pub async fn update_user(&self, user: User) -> Result<User, AppError> {
        let updated = self.remote.update_user(user).await?;
        self.refresh().await?;
        Ok(updated)
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        self.remote.delete_user(user_id).await?;
        self.refresh().await
    }

    pub async fn add_bureau_member(
        &self,
        scope: &Scope,
        draft: BureauMemberDraft,
    ) -> Result<BureauMember, AppError> {
        let member = self.remote.add_bureau_member(scope, draft).await?;
        self.refresh().await?;
        Ok(member)
    }

    pub async fn update_bureau_member(
        &self,
        scope: &Scope,
        member: BureauMember,
    ) -> Result<BureauMember, AppError> {
        let updated = self.remote.update_bureau_member(scope, member).await?;
        self.refresh().await?;
        Ok(updated)
    }

    pub async fn delete_bureau_member(
        &self,
        scope: &Scope,
        member_id: &str,
    ) -> Result<(), AppError> {
        self.remote.delete_bureau_member(scope, member_id).await?;
        self.refresh().await
    }

    pub async fn add_bureau_activity(
        &self,
        scope: &Scope,
        draft: BureauActivityDraft,
    ) -> Result<BureauActivity, AppError> {
        let activity = self.remote.add_bureau_activity(scope, draft).await?;
        self.refresh().await?;
        Ok(activity)
    }

    pub async fn update_bureau_activity(
        &self,
        scope: &Scope,
        activity: BureauActivity,
    ) -> Result<BureauActivity, AppError> {
        let updated = self.remote.update_bureau_activity(scope, activity).await?;
        self.refresh().await?;
        Ok(updated)
    }

    pub async fn delete_bureau_activity(
        &self,
        scope: &Scope,
        activity_id: &str,
    ) -> Result<(), AppError> {
        self.remote.delete_bureau_activity(scope, activity_id).await?;
        self.refresh().await
    }

    pub async fn mark_notification_read(&self, notification_id: i64) -> Result<(), AppError> {
        self.remote.mark_notification_read(notification_id).await?;
        self.refresh().await
    }

    pub async fn mark_all_notifications_read(&self) -> Result<(), AppError> {
        self.remote.mark_all_notifications_read().await?;
        self.refresh().await
    }

    // --- Offline mutations ------------------------------------------------

    /// Applies the optimistic patch, then durably appends the queue
    /// entry. The patch is rolled back if the append fails, so the UI
    /// never shows a change that was not recorded.
    async fn enqueue(&self, patch: OptimisticPatch, entry: QueueEntry) -> Result<(), AppError> {
        let previous = self.snapshot.apply(&patch).await;
        if let Err(err) = self.durable.append_entry(&entry).await {
            tracing::error!(entry_id = %entry.id, error = %err, "offline enqueue failed, rolling back patch");
            if let Some(previous) = previous {
                self.snapshot.restore(previous).await;
            }
            return Err(err);
        }
        Ok(())
    }

    pub async fn add_worship_service_offline(
        &self,
        church_id: &str,
        draft: WorshipServiceDraft,
    ) -> Result<WorshipService, AppError> {
        let service = WorshipService::from_draft(
            draft.clone(),
            record_id::generate_offline(),
            RecordStatus::Offline,
        );
        let patch = OptimisticPatch::InsertService {
            church_id: church_id.to_string(),
            service: service.clone(),
        };
        let entry = QueueEntry::new(QueuedMutation::AddWorshipService(AddWorshipServicePayload {
            church_id: church_id.to_string(),
            service: draft,
            offline_id: service.id.clone(),
        }));
        self.enqueue(patch, entry).await?;
        Ok(service)
    }

    /// Queues a batch of reports captured in one entry session.
    pub async fn add_worship_services_offline(
        &self,
        church_id: &str,
        drafts: Vec<WorshipServiceDraft>,
    ) -> Result<Vec<WorshipService>, AppError> {
        let mut services = Vec::with_capacity(drafts.len());
        for draft in drafts {
            services.push(self.add_worship_service_offline(church_id, draft).await?);
        }
        Ok(services)
    }

    pub async fn update_worship_service_offline(
        &self,
        church_id: &str,
        service: WorshipService,
    ) -> Result<WorshipService, AppError> {
        let mut patched = service.clone();
        patched.status = RecordStatus::OfflineModified;
        let patch = OptimisticPatch::ReplaceService {
            church_id: church_id.to_string(),
            service: patched.clone(),
        };
        let entry = QueueEntry::new(QueuedMutation::UpdateWorshipService(
            UpdateWorshipServicePayload {
                church_id: church_id.to_string(),
                service,
            },
        ));
        self.enqueue(patch, entry).await?;
        Ok(patched)
    }

    pub async fn delete_worship_service_offline(
        &self,
        church_id: &str,
        service_id: &str,
    ) -> Result<(), AppError> {
        let patch = OptimisticPatch::RemoveService {
            church_id: church_id.to_string(),
            service_id: service_id.to_string(),
        };
        let entry = QueueEntry::new(QueuedMutation::DeleteWorshipService(
            DeleteWorshipServicePayload {
                church_id: church_id.to_string(),
                service_id: service_id.to_string(),
            },
        ));
        self.enqueue(patch, entry).await
    }

    pub async fn add_baptized_member_offline(
        &self,
        church_id: &str,
        draft: BaptizedMemberDraft,
    ) -> Result<BaptizedMember, AppError> {
        let member = BaptizedMember::from_draft(
            draft.clone(),
            record_id::generate_offline(),
            Some(RecordStatus::Offline),
        );
        let patch = OptimisticPatch::InsertMember {
            church_id: church_id.to_string(),
            member: member.clone(),
        };
        let entry = QueueEntry::new(QueuedMutation::AddBaptizedMember(AddBaptizedMemberPayload {
            church_id: church_id.to_string(),
            member: draft,
            offline_id: member.id.clone(),
        }));
        self.enqueue(patch, entry).await?;
        Ok(member)
    }

    pub async fn update_baptized_member_offline(
        &self,
        church_id: &str,
        member: BaptizedMember,
    ) -> Result<BaptizedMember, AppError> {
        let mut patched = member.clone();
        patched.status = Some(RecordStatus::OfflineModified);
        let patch = OptimisticPatch::ReplaceMember {
            church_id: church_id.to_string(),
            member: patched.clone(),
        };
        let entry = QueueEntry::new(QueuedMutation::UpdateBaptizedMember(
            UpdateBaptizedMemberPayload {
                church_id: church_id.to_string(),
                member,
            },
        ));
        self.enqueue(patch, entry).await?;
        Ok(patched)
    }

    pub async fn delete_baptized_member_offline(
        &self,
        church_id: &str,
        member_id: &str,
    ) -> Result<(), AppError> {
        let patch = OptimisticPatch::RemoveMember {
            church_id: church_id.to_string(),
            member_id: member_id.to_string(),
        };
        let entry = QueueEntry::new(QueuedMutation::DeleteBaptizedMember(
            DeleteBaptizedMemberPayload {
                church_id: church_id.to_string(),
                member_id: member_id.to_string(),
            },
        ));
        self.enqueue(patch, entry).await
    }

    pub async fn add_church_activity_offline(
        &self,
        church_id: &str,
        draft: ChurchActivityDraft,
    ) -> Result<ChurchActivity, AppError> {
        let activity = ChurchActivity::from_draft(
            draft.clone(),
            record_id::generate_offline(),
            Some(RecordStatus::Offline),
        );
        let patch = OptimisticPatch::InsertActivity {
            church_id: church_id.to_string(),
            activity: activity.clone(),
        };
        let entry = QueueEntry::new(QueuedMutation::AddChurchActivity(AddChurchActivityPayload {
            church_id: church_id.to_string(),
            activity: draft,
            offline_id: activity.id.clone(),
        }));
        self.enqueue(patch, entry).await?;
        Ok(activity)
    }

    pub async fn update_church_activity_offline(
        &self,
        church_id: &str,
        activity: ChurchActivity,
    ) -> Result<ChurchActivity, AppError> {
        let mut patched = activity.clone();
        patched.status = Some(RecordStatus::OfflineModified);
        let patch = OptimisticPatch::ReplaceActivity {
            church_id: church_id.to_string(),
            activity: patched.clone(),
        };
        let entry = QueueEntry::new(QueuedMutation::UpdateChurchActivity(
            UpdateChurchActivityPayload {
                church_id: church_id.to_string(),
                activity,
            },
        ));
        self.enqueue(patch, entry).await?;
        Ok(patched)
    }

    pub async fn delete_church_activity_offline(
        &self,
        church_id: &str,
        activity_id: &str,
    ) -> Result<(), AppError> {
        let patch = OptimisticPatch::RemoveActivity {
            church_id: church_id.to_string(),
            activity_id: activity_id.to_string(),
        };
        let entry = QueueEntry::new(QueuedMutation::DeleteChurchActivity(
            DeleteChurchActivityPayload {
                church_id: church_id.to_string(),
                activity_id: activity_id.to_string(),
            },
        ));
        self.enqueue(patch, entry).await
    }

    pub async fn add_announcement_offline(
        &self,
        church_id: &str,
        draft: AnnouncementDraft,
    ) -> Result<Announcement, AppError> {
        let author = self
            .remote
            .current_user()
            .await?
            .ok_or_else(|| AppError::Unauthorized("sign in to add announcements".to_string()))?;
        let now = Utc::now();
        let announcement = Announcement {
            id: record_id::generate_offline(),
            title: draft.title.clone(),
            content: draft.content.clone(),
            author_id: author.id,
            author_name: author.username,
            created_at: now,
            updated_at: now,
            status: Some(RecordStatus::Offline),
        };
        let patch = OptimisticPatch::InsertAnnouncement {
            church_id: church_id.to_string(),
            announcement: announcement.clone(),
        };
        let entry = QueueEntry::new(QueuedMutation::AddAnnouncement(AddAnnouncementPayload {
            church_id: church_id.to_string(),
            announcement: draft,
            offline_id: announcement.id.clone(),
        }));
        self.enqueue(patch, entry).await?;
        Ok(announcement)
    }

    pub async fn update_announcement_offline(
        &self,
        church_id: &str,
        announcement: Announcement,
    ) -> Result<Announcement, AppError> {
        let mut patched = announcement.clone();
        patched.status = Some(RecordStatus::OfflineModified);
        let patch = OptimisticPatch::ReplaceAnnouncement {
            church_id: church_id.to_string(),
            announcement: patched.clone(),
        };
        let entry = QueueEntry::new(QueuedMutation::UpdateAnnouncement(
            UpdateAnnouncementPayload {
                church_id: church_id.to_string(),
                announcement,
            },
        ));
        self.enqueue(patch, entry).await?;
        Ok(patched)
    }

    pub async fn delete_announcement_offline(
        &self,
        church_id: &str,
        announcement_id: &str,
    ) -> Result<(), AppError> {
        let patch = OptimisticPatch::RemoveAnnouncement {
            church_id: church_id.to_string(),
            announcement_id: announcement_id.to_string(),
        };
        let entry = QueueEntry::new(QueuedMutation::DeleteAnnouncement(
            DeleteAnnouncementPayload {
                church_id: church_id.to_string(),
                announcement_id: announcement_id.to_string(),
            },
        ));
        self.enqueue(patch, entry).await
    }

    // --- Queue introspection ----------------------------------------------

    pub async fn offline_queue(&self) -> Result<Vec<QueueEntry>, AppError> {
        self.durable.all_entries().await
    }

    /// Number of unsynced actions for one church, shown as a badge.
    pub async fn pending_count(&self, church_id: &str) -> Result<usize, AppError> {
        Ok(self.durable.entries_for_scope(church_id).await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::report::{Attendance, Offering};
    use crate::infrastructure::database::MIGRATOR;
    use crate::infrastructure::offline::SqliteDurableStore;
    use crate::infrastructure::server::ServerSimulator;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::Value;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_service() -> DataService {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        MIGRATOR.run(&pool).await.expect("migrations");

        let durable: Arc<dyn DurablePersistence> = Arc::new(SqliteDurableStore::new(pool));
        let remote = Arc::new(
            ServerSimulator::bootstrap(durable.clone(), 0)
                .await
                .expect("bootstrap"),
        );
        remote.login("church_1_admin", "pw").await.expect("login");

        let service = DataService::new(remote, durable, Arc::new(SnapshotStore::new()));
        service.refresh().await.expect("initial refresh");
        service
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

    /// Durable store whose queue writes always fail, for the rollback path.
    struct BrokenQueue;

    #[async_trait]
    impl DurablePersistence for BrokenQueue {
        async fn put_blob(&self, _key: &str, _value: &Value) -> Result<(), AppError> {
            Ok(())
        }
        async fn get_blob(&self, _key: &str) -> Result<Option<Value>, AppError> {
            Ok(None)
        }
        async fn append_entry(&self, _entry: &QueueEntry) -> Result<(), AppError> {
            Err(AppError::Storage("disk full".to_string()))
        }
        async fn entries_for_scope(&self, _scope_id: &str) -> Result<Vec<QueueEntry>, AppError> {
            Ok(Vec::new())
        }
        async fn all_entries(&self) -> Result<Vec<QueueEntry>, AppError> {
            Ok(Vec::new())
        }
        async fn delete_entries(&self, _ids: &[String]) -> Result<(), AppError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn online_add_refreshes_snapshot_wholesale() {
        let service = setup_service().await;

        let created = service
            .add_worship_service("church_1", sample_draft())
            .await
            .unwrap();
        assert_eq!(created.status, RecordStatus::Pending);

        let data = service.snapshot_store().data().await.unwrap();
        let services = &data.church("church_1").unwrap().worship_services;
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].id, created.id);
        assert!(service.offline_queue().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn offline_add_patches_snapshot_and_enqueues() {
        let service = setup_service().await;

        let created = service
            .add_worship_service_offline("church_1", sample_draft())
            .await
            .unwrap();
        assert!(record_id::is_offline(&created.id));
        assert_eq!(created.status, RecordStatus::Offline);

        let data = service.snapshot_store().data().await.unwrap();
        let services = &data.church("church_1").unwrap().worship_services;
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].status, RecordStatus::Offline);

        let queue = service.offline_queue().await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].mutation.offline_id(), Some(created.id.as_str()));
        assert_eq!(service.pending_count("church_1").await.unwrap(), 1);
        assert_eq!(service.pending_count("church_2").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn offline_update_marks_record_modified() {
        let service = setup_service().await;
        let created = service
            .add_worship_service("church_1", sample_draft())
            .await
            .unwrap();

        let mut edited = created.clone();
        edited.speaker = "C".into();
        let patched = service
            .update_worship_service_offline("church_1", edited)
            .await
            .unwrap();
        assert_eq!(patched.status, RecordStatus::OfflineModified);

        let data = service.snapshot_store().data().await.unwrap();
        let stored = &data.church("church_1").unwrap().worship_services[0];
        assert_eq!(stored.speaker, "C");
        assert_eq!(stored.status, RecordStatus::OfflineModified);
    }

    #[tokio::test]
    async fn failed_enqueue_rolls_back_the_optimistic_patch() {
        let setup = setup_service().await;
        let snapshot = setup.snapshot_store().clone();
        let broken = DataService::new(
            setup.remote.clone(),
            Arc::new(BrokenQueue),
            snapshot.clone(),
        );

        let err = broken
            .add_worship_service_offline("church_1", sample_draft())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));

        let data = snapshot.data().await.unwrap();
        assert!(
            data.church("church_1").unwrap().worship_services.is_empty(),
            "patch must not survive a failed enqueue"
        );
    }

    #[tokio::test]
    async fn online_failure_leaves_snapshot_untouched() {
        let service = setup_service().await;
        let before = service.snapshot_store().data().await.unwrap();

        let mut ghost = WorshipService::from_draft(
            sample_draft(),
            "ws_missing".into(),
            RecordStatus::Pending,
        );
        ghost.speaker = "Nobody".into();
        let err = service
            .update_worship_service("church_1", ghost)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let after = service.snapshot_store().data().await.unwrap();
        assert_eq!(before, after);
    }
}
