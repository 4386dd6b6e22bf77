pub mod connectivity;
pub mod durable_store;
pub mod remote_store;

pub use connectivity::ConnectivitySignal;
pub use durable_store::DurablePersistence;
pub use remote_store::RemoteDataStore;
