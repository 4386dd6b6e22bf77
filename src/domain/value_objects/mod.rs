pub mod permission;
pub mod record_id;
pub mod record_status;
pub mod scope;

pub use permission::Permission;
pub use record_status::RecordStatus;
pub use scope::Scope;
