use crate::domain::entities::activity::ChurchActivity;
use crate::domain::entities::announcement::Announcement;
use crate::domain::entities::church::NationalData;
use crate::domain::entities::member::BaptizedMember;
use crate::domain::entities::report::WorshipService;

/// A local, ephemeral change to the snapshot, applied before server
/// confirmation and overwritten by the next wholesale refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum OptimisticPatch {
    InsertService {
        church_id: String,
        service: WorshipService,
    },
    ReplaceService {
        church_id: String,
        service: WorshipService,
    },
    RemoveService {
        church_id: String,
        service_id: String,
    },
    InsertMember {
        church_id: String,
        member: BaptizedMember,
    },
    ReplaceMember {
        church_id: String,
        member: BaptizedMember,
    },
    RemoveMember {
        church_id: String,
        member_id: String,
    },
    InsertActivity {
        church_id: String,
        activity: ChurchActivity,
    },
    ReplaceActivity {
        church_id: String,
        activity: ChurchActivity,
    },
    RemoveActivity {
        church_id: String,
        activity_id: String,
    },
    InsertAnnouncement {
        church_id: String,
        announcement: Announcement,
    },
    ReplaceAnnouncement {
        church_id: String,
        announcement: Announcement,
    },
    RemoveAnnouncement {
        church_id: String,
        announcement_id: String,
    },
}

/// Applies a patch and returns the resulting tree, leaving the input
/// untouched. Offline mutations defer business-rule errors to sync time,
/// so a patch addressing a missing church or record is a structural
/// no-op rather than a failure.
pub fn apply_patch(data: &NationalData, patch: &OptimisticPatch) -> NationalData {
    let mut next = data.clone();
    match patch {
        OptimisticPatch::InsertService { church_id, service } => {
            if let Some(church) = next.church_mut(church_id) {
                church.worship_services.push(service.clone());
            }
        }
        OptimisticPatch::ReplaceService { church_id, service } => {
            if let Some(church) = next.church_mut(church_id) {
                if let Some(existing) = church
                    .worship_services
                    .iter_mut()
                    .find(|s| s.id == service.id)
                {
                    *existing = service.clone();
                }
            }
        }
        OptimisticPatch::RemoveService {
            church_id,
            service_id,
        } => {
            if let Some(church) = next.church_mut(church_id) {
                church.worship_services.retain(|s| s.id != *service_id);
            }
        }
        OptimisticPatch::InsertMember { church_id, member } => {
            if let Some(church) = next.church_mut(church_id) {
                church.baptized_members.push(member.clone());
            }
        }
        OptimisticPatch::ReplaceMember { church_id, member } => {
            if let Some(church) = next.church_mut(church_id) {
                if let Some(existing) = church
                    .baptized_members
                    .iter_mut()
                    .find(|m| m.id == member.id)
                {
                    *existing = member.clone();
                }
            }
        }
        OptimisticPatch::RemoveMember {
            church_id,
            member_id,
        } => {
            if let Some(church) = next.church_mut(church_id) {
                church.baptized_members.retain(|m| m.id != *member_id);
            }
        }
        OptimisticPatch::InsertActivity { church_id, activity } => {
            if let Some(church) = next.church_mut(church_id) {
                church.activities.push(activity.clone());
            }
        }
        OptimisticPatch::ReplaceActivity { church_id, activity } => {
            if let Some(church) = next.church_mut(church_id) {
                if let Some(existing) =
                    church.activities.iter_mut().find(|a| a.id == activity.id)
                {
                    *existing = activity.clone();
                }
            }
        }
        OptimisticPatch::RemoveActivity {
            church_id,
            activity_id,
        } => {
            if let Some(church) = next.church_mut(church_id) {
                church.activities.retain(|a| a.id != *activity_id);
            }
        }
        OptimisticPatch::InsertAnnouncement {
            church_id,
            announcement,
        } => {
            if let Some(church) = next.church_mut(church_id) {
                church.announcements.push(announcement.clone());
            }
        }
        OptimisticPatch::ReplaceAnnouncement {
            church_id,
            announcement,
        } => {
            if let Some(church) = next.church_mut(church_id) {
                if let Some(existing) = church
                    .announcements
                    .iter_mut()
                    .find(|a| a.id == announcement.id)
                {
                    *existing = announcement.clone();
                }
            }
        }
        OptimisticPatch::RemoveAnnouncement {
            church_id,
            announcement_id,
        } => {
            if let Some(church) = next.church_mut(church_id) {
                church.announcements.retain(|a| a.id != *announcement_id);
            }
        }
    }
    next
}
