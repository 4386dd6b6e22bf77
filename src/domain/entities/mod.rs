pub mod activity;
pub mod announcement;
pub mod bureau;
pub mod church;
pub mod member;
pub mod offline;
pub mod report;
pub mod snapshot;
pub mod system;
pub mod user;

pub use activity::{ChurchActivity, ChurchActivityDraft};
pub use announcement::{Announcement, AnnouncementDraft};
pub use bureau::{BureauActivity, BureauActivityDraft, BureauMember, BureauMemberDraft};
pub use church::{Church, NationalData, Region};
pub use member::{BaptizedMember, BaptizedMemberDraft, Gender};
pub use report::{Attendance, Offering, WorshipService, WorshipServiceDraft};
pub use snapshot::FullSnapshot;
pub use system::{AuditLog, Notification};
pub use user::{AccessLevel, User, UserDraft};
