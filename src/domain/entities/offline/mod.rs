pub mod patch;
pub mod queue_entry;
pub mod sync_outcome;

pub use patch::{apply_patch, OptimisticPatch};
pub use queue_entry::{
    AddAnnouncementPayload, AddBaptizedMemberPayload, AddChurchActivityPayload,
    AddWorshipServicePayload, DeleteAnnouncementPayload, DeleteBaptizedMemberPayload,
    DeleteChurchActivityPayload, DeleteWorshipServicePayload, QueueEntry, QueuedMutation,
    UpdateAnnouncementPayload, UpdateBaptizedMemberPayload, UpdateChurchActivityPayload,
    UpdateWorshipServicePayload,
};
pub use sync_outcome::SyncOutcome;
