use crate::application::ports::connectivity::ConnectivitySignal;
use crate::application::ports::durable_store::DurablePersistence;
use crate::application::ports::remote_store::RemoteDataStore;
use crate::application::services::{DataService, SessionService, SnapshotStore, SyncService};
use crate::infrastructure::database::{Database, DbPool};
use crate::infrastructure::network::ConnectionMonitor;
use crate::infrastructure::offline::SqliteDurableStore;
use crate::infrastructure::server::ServerSimulator;
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::sync::Arc;

/// Everything a session needs, wired once at startup: the durable
/// store, the simulated server, the connectivity monitor and the
/// services over them.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub durable: Arc<dyn DurablePersistence>,
    pub remote: Arc<ServerSimulator>,
    pub connectivity: Arc<ConnectionMonitor>,
    pub snapshot: Arc<SnapshotStore>,
    pub data_service: Arc<DataService>,
    pub sync_service: Arc<SyncService>,
    pub session_service: Arc<SessionService>,
}

impl AppState {
    pub async fn new(config: &AppConfig) -> Result<Self, AppError> {
        config.validate().map_err(AppError::Internal)?;

        let db_pool =
            Database::initialize(&config.database.url, config.database.max_connections).await?;
        let durable: Arc<dyn DurablePersistence> =
            Arc::new(SqliteDurableStore::new(db_pool.clone()));
        let remote = Arc::new(
            ServerSimulator::bootstrap(durable.clone(), config.simulation.latency_ms).await?,
        );
        let connectivity = Arc::new(ConnectionMonitor::new(true));
        let snapshot = Arc::new(SnapshotStore::new());

        let remote_port: Arc<dyn RemoteDataStore> = remote.clone();
        let connectivity_signal: Arc<dyn ConnectivitySignal> = connectivity.clone();

        let data_service = Arc::new(DataService::new(
            remote_port.clone(),
            durable.clone(),
            snapshot.clone(),
        ));
        let sync_service = Arc::new(SyncService::new(
            remote_port.clone(),
            durable.clone(),
            snapshot.clone(),
            connectivity_signal,
        ));
        let session_service = Arc::new(SessionService::new(remote_port, snapshot.clone()));

        Ok(Self {
            db_pool,
            durable,
            remote,
            connectivity,
            snapshot,
            data_service,
            sync_service,
            session_service,
        })
    }
}
