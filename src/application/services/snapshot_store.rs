use crate::domain::entities::offline::{apply_patch, OptimisticPatch};
use crate::domain::entities::{AuditLog, FullSnapshot, NationalData, Notification, User};
use tokio::sync::RwLock;

/// The in-memory mirror of the authoritative collections.
///
/// Single-writer by construction: the mutation router and the sync
/// engine are the only writers, and they mutate it exactly two ways,
/// wholesale `replace` after a successful round trip or an ephemeral
/// optimistic `apply`. Canonical data is never merged incrementally.
/// Created at session start, torn down with `clear` on logout.
#[derive(Default)]
pub struct SnapshotStore {
    inner: RwLock<Option<FullSnapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn replace(&self, snapshot: FullSnapshot) {
        *self.inner.write().await = Some(snapshot);
    }

    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }

    pub async fn is_loaded(&self) -> bool {
        self.inner.read().await.is_some()
    }

    pub async fn full(&self) -> Option<FullSnapshot> {
        self.inner.read().await.clone()
    }

    pub async fn data(&self) -> Option<NationalData> {
        self.inner.read().await.as_ref().map(|s| s.data.clone())
    }

    pub async fn users(&self) -> Vec<User> {
        self.inner
            .read()
            .await
            .as_ref()
            .map(|s| s.users.clone())
            .unwrap_or_default()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.inner
            .read()
            .await
            .as_ref()
            .map(|s| s.notifications.clone())
            .unwrap_or_default()
    }

    pub async fn audit_logs(&self) -> Vec<AuditLog> {
        self.inner
            .read()
            .await
            .as_ref()
            .map(|s| s.audit_logs.clone())
            .unwrap_or_default()
    }

    /// Applies an optimistic patch in place and hands back the previous
    /// collections tree so the caller can roll back if the durable
    /// enqueue fails. Returns `None` when no snapshot is loaded.
    pub async fn apply(&self, patch: &OptimisticPatch) -> Option<NationalData> {
        let mut guard = self.inner.write().await;
        let snapshot = guard.as_mut()?;
        let previous = snapshot.data.clone();
        snapshot.data = apply_patch(&snapshot.data, patch);
        Some(previous)
    }

    /// Restores a collections tree captured by `apply`.
    pub async fn restore(&self, data: NationalData) {
        if let Some(snapshot) = self.inner.write().await.as_mut() {
            snapshot.data = data;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::church::Church;
    use crate::domain::entities::report::{Attendance, Offering, WorshipService, WorshipServiceDraft};
    use crate::domain::value_objects::RecordStatus;
    use chrono::NaiveDate;

    fn sample_snapshot() -> FullSnapshot {
        let mut data = NationalData::default();
        data.churches.insert(
            "church_1".into(),
            Church::new("church_1".into(), "First".into(), "reg_1".into()),
        );
        FullSnapshot {
            data,
            users: vec![],
            notifications: vec![],
            audit_logs: vec![],
        }
    }

    fn sample_service() -> WorshipService {
        WorshipService::from_draft(
            WorshipServiceDraft {
                date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                speaker: "A".into(),
                president: "B".into(),
                attendance: Attendance {
                    men: 1,
                    women: 1,
                    children: 1,
                },
                offering: Offering {
                    tithes: 1.0,
                    regular: 0.0,
                    special: 0.0,
                },
            },
            "offline_1".into(),
            RecordStatus::Offline,
        )
    }

    #[tokio::test]
    async fn apply_returns_previous_tree_for_rollback() {
        let store = SnapshotStore::new();
        store.replace(sample_snapshot()).await;

        let previous = store
            .apply(&OptimisticPatch::InsertService {
                church_id: "church_1".into(),
                service: sample_service(),
            })
            .await
            .expect("snapshot loaded");

        assert!(previous.church("church_1").unwrap().worship_services.is_empty());
        let patched = store.data().await.unwrap();
        assert_eq!(patched.church("church_1").unwrap().worship_services.len(), 1);

        store.restore(previous).await;
        let restored = store.data().await.unwrap();
        assert!(restored.church("church_1").unwrap().worship_services.is_empty());
    }

    #[tokio::test]
    async fn apply_without_snapshot_is_none() {
        let store = SnapshotStore::new();
        let result = store
            .apply(&OptimisticPatch::RemoveService {
                church_id: "church_1".into(),
                service_id: "ws_1".into(),
            })
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn clear_tears_down_state() {
        let store = SnapshotStore::new();
        store.replace(sample_snapshot()).await;
        assert!(store.is_loaded().await);
        store.clear().await;
        assert!(!store.is_loaded().await);
    }
}
