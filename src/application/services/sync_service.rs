use crate::application::ports::connectivity::ConnectivitySignal;
use crate::application::ports::durable_store::DurablePersistence;
use crate::application::ports::remote_store::RemoteDataStore;
use crate::application::services::snapshot_store::SnapshotStore;
use crate::domain::entities::offline::{QueueEntry, QueuedMutation, SyncOutcome};
use crate::shared::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Replays the offline queue for one scope at a time against the
/// authoritative store, reconciles temporary identifiers and reports
/// partial success. Two scopes may sync concurrently; the scope-keyed
/// queue scan is the isolation mechanism.
pub struct SyncService {
    remote: Arc<dyn RemoteDataStore>,
    durable: Arc<dyn DurablePersistence>,
    snapshot: Arc<SnapshotStore>,
    connectivity: Arc<dyn ConnectivitySignal>,
}

impl SyncService {
    pub fn new(
        remote: Arc<dyn RemoteDataStore>,
        durable: Arc<dyn DurablePersistence>,
        snapshot: Arc<SnapshotStore>,
        connectivity: Arc<dyn ConnectivitySignal>,
    ) -> Self {
        Self {
            remote,
            durable,
            snapshot,
            connectivity,
        }
    }

    pub async fn sync_scope(&self, church_id: &str) -> Result<SyncOutcome, AppError> {
        if !self.connectivity.is_online() {
            return Err(AppError::Network(
                "cannot sync while the connection is down".to_string(),
            ));
        }

        let mut entries = self.durable.entries_for_scope(church_id).await?;
        if entries.is_empty() {
            return Ok(SyncOutcome::empty());
        }

        // Storage iteration order is not creation order; update and
        // delete entries may target temporary ids minted by an earlier
        // create in the same batch, so replay must be time-sorted here.
        entries.sort_by_key(|entry| entry.timestamp);

        let total_count = entries.len() as u32;
        let mut reconciled: HashMap<String, String> = HashMap::new();
        let mut synced_ids: Vec<String> = Vec::new();

        for entry in &entries {
            match self.replay(entry, &mut reconciled).await {
                Ok(()) => synced_ids.push(entry.id.clone()),
                Err(err) => {
                    warn!(
                        entry_id = %entry.id,
                        action = entry.mutation.kind(),
                        error = %err,
                        "failed to sync queue entry, keeping it for retry"
                    );
                }
            }
        }

        if !synced_ids.is_empty() {
            self.durable.delete_entries(&synced_ids).await?;
        }

        // Refresh even on partial failure so the UI reflects whatever
        // did land. Entry deletion already happened; a refresh failure
        // here only delays convergence until the next one.
        if let Err(err) = self.refresh().await {
            warn!(error = %err, "snapshot refresh after sync failed");
        }

        let outcome = SyncOutcome::new(synced_ids.len() as u32, total_count);
        info!(
            scope = church_id,
            synced = outcome.success_count,
            total = outcome.total_count,
            "offline queue sync finished"
        );
        Ok(outcome)
    }

    async fn refresh(&self) -> Result<(), AppError> {
        let snapshot = self.remote.get_full_snapshot().await?;
        self.snapshot.replace(snapshot).await;
        Ok(())
    }

    /// Replays one entry through the same entry points the online path
    /// uses. Create replays record the temporary→canonical id mapping;
    /// later entries in the batch that still target a temporary id are
    /// rewritten through it, so a create followed by an update of the
    /// same temporary id lands on a single canonical record.
    async fn replay(
        &self,
        entry: &QueueEntry,
        reconciled: &mut HashMap<String, String>,
    ) -> Result<(), AppError> {
        match &entry.mutation {
            QueuedMutation::AddWorshipService(p) => {
                let created = self
                    .remote
                    .add_worship_service(&p.church_id, p.service.clone(), Some(p.offline_id.clone()))
                    .await?;
                reconciled.insert(p.offline_id.clone(), created.id);
            }
            QueuedMutation::UpdateWorshipService(p) => {
                let mut service = p.service.clone();
                if let Some(id) = reconciled.get(&service.id) {
                    service.id = id.clone();
                }
                self.remote
                    .update_worship_service(&p.church_id, service)
                    .await?;
            }
            QueuedMutation::DeleteWorshipService(p) => {
                let id = Self::resolve(reconciled, &p.service_id);
                self.remote.delete_worship_service(&p.church_id, &id).await?;
            }
            QueuedMutation::AddBaptizedMember(p) => {
                let created = self
                    .remote
                    .add_baptized_member(&p.church_id, p.member.clone(), Some(p.offline_id.clone()))
                    .await?;
                reconciled.insert(p.offline_id.clone(), created.id);
            }
            QueuedMutation::UpdateBaptizedMember(p) => {
                let mut member = p.member.clone();
                if let Some(id) = reconciled.get(&member.id) {
                    member.id = id.clone();
                }
                self.remote
                    .update_baptized_member(&p.church_id, member)
                    .await?;
            }
            QueuedMutation::DeleteBaptizedMember(p) => {
                let id = Self::resolve(reconciled, &p.member_id);
                self.remote.delete_baptized_member(&p.church_id, &id).await?;
            }
            QueuedMutation::AddChurchActivity(p) => {
                let created = self
                    .remote
                    .add_church_activity(&p.church_id, p.activity.clone(), Some(p.offline_id.clone()))
                    .await?;
                reconciled.insert(p.offline_id.clone(), created.id);
            }
            QueuedMutation::UpdateChurchActivity(p) => {
                let mut activity = p.activity.clone();
                if let Some(id) = reconciled.get(&activity.id) {
                    activity.id = id.clone();
                }
                self.remote
                    .update_church_activity(&p.church_id, activity)
                    .await?;
            }
            QueuedMutation::DeleteChurchActivity(p) => {
                let id = Self::resolve(reconciled, &p.activity_id);
                self.remote.delete_church_activity(&p.church_id, &id).await?;
            }
            QueuedMutation::AddAnnouncement(p) => {
                let created = self
                    .remote
                    .add_announcement(&p.church_id, p.announcement.clone(), Some(p.offline_id.clone()))
                    .await?;
                reconciled.insert(p.offline_id.clone(), created.id);
            }
            QueuedMutation::UpdateAnnouncement(p) => {
                let mut announcement = p.announcement.clone();
                if let Some(id) = reconciled.get(&announcement.id) {
                    announcement.id = id.clone();
                }
                self.remote
                    .update_announcement(&p.church_id, announcement)
                    .await?;
            }
            QueuedMutation::DeleteAnnouncement(p) => {
                let id = Self::resolve(reconciled, &p.announcement_id);
                self.remote.delete_announcement(&p.church_id, &id).await?;
            }
        }
        Ok(())
    }

    fn resolve(reconciled: &HashMap<String, String>, id: &str) -> String {
        reconciled
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}
