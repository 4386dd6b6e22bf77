pub mod data_service;
pub mod session_service;
pub mod snapshot_store;
pub mod sync_service;

pub use data_service::DataService;
pub use session_service::SessionService;
pub use snapshot_store::SnapshotStore;
pub use sync_service::SyncService;
