use crate::application::ports::remote_store::RemoteDataStore;
use crate::application::services::snapshot_store::SnapshotStore;
use crate::domain::entities::User;
use crate::shared::error::AppError;
use std::sync::Arc;
use tracing::info;

/// Session lifecycle around the snapshot store: populated on login,
/// torn down on logout.
pub struct SessionService {
    remote: Arc<dyn RemoteDataStore>,
    snapshot: Arc<SnapshotStore>,
}

impl SessionService {
    pub fn new(remote: Arc<dyn RemoteDataStore>, snapshot: Arc<SnapshotStore>) -> Self {
        Self { remote, snapshot }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User, AppError> {
        let user = self.remote.login(username, password).await?;
        let snapshot = self.remote.get_full_snapshot().await?;
        self.snapshot.replace(snapshot).await;
        info!(username = %user.username, "session started");
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        self.remote.logout().await?;
        self.snapshot.clear().await;
        info!("session ended");
        Ok(())
    }

    pub async fn current_user(&self) -> Result<Option<User>, AppError> {
        self.remote.current_user().await
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        self.remote
            .change_password(user_id, old_password, new_password)
            .await
    }
}
