use crate::domain::entities::{
    AccessLevel, BureauMember, Church, NationalData, Notification, Region, User,
};
use crate::domain::value_objects::Permission;
use chrono::Utc;

/// First-run dataset, used when the durable store holds no snapshot
/// blobs yet.
pub fn initial_dataset() -> (NationalData, Vec<User>, Vec<Notification>) {
    let mut data = NationalData {
        bureau: vec![BureauMember {
            id: "nb_1".into(),
            name: "National President".into(),
            position: "President".into(),
            contact: "00000000".into(),
        }],
        ..NationalData::default()
    };

    let regions = [
        ("reg_abidjan_nord", "ABIDJAN NORD"),
        ("reg_bouake", "BOUAKÉ"),
    ];
    let churches = [
        ("church_1", "ABIDJAN NORD-1", "reg_abidjan_nord"),
        ("church_2", "ABIDJAN NORD-2", "reg_abidjan_nord"),
        ("church_3", "BOUAKÉ-1", "reg_bouake"),
    ];

    for (region_id, name) in regions {
        data.regions
            .insert(region_id.to_string(), Region::new(region_id.into(), name.into()));
    }
    for (church_id, name, region_id) in churches {
        data.churches.insert(
            church_id.to_string(),
            Church::new(church_id.into(), name.into(), region_id.into()),
        );
        if let Some(region) = data.regions.get_mut(region_id) {
            region.churches.push(church_id.to_string());
        }
    }

    let mut users = vec![User {
        id: "user_national_admin".into(),
        username: "national_admin".into(),
        password: None,
        role_id: "national_admin".into(),
        level: AccessLevel::National,
        permissions: vec![
            Permission::ManageUsers,
            Permission::ValidateReports,
            Permission::ViewFinances,
            Permission::ManageBureau,
            Permission::ManageActivities,
        ],
        region_id: None,
        church_id: None,
        force_password_change: false,
    }];

    for (region_id, _) in regions {
        users.push(User {
            id: format!("user_{region_id}"),
            username: format!("{region_id}_admin"),
            password: None,
            role_id: "region_admin".into(),
            level: AccessLevel::Region,
            permissions: vec![
                Permission::ValidateReports,
                Permission::ViewFinances,
                Permission::ManageBureau,
                Permission::ManageActivities,
            ],
            region_id: Some(region_id.to_string()),
            church_id: None,
            force_password_change: false,
        });
    }

    for (church_id, _, region_id) in churches {
        users.push(User {
            id: format!("user_{church_id}"),
            username: format!("{church_id}_admin"),
            password: None,
            role_id: "church_admin".into(),
            level: AccessLevel::Church,
            permissions: vec![
                Permission::ManageReports,
                Permission::ManageMembers,
                Permission::ManageActivities,
                Permission::ManageBureau,
                Permission::ViewFinances,
                Permission::ManageAnnouncements,
            ],
            region_id: Some(region_id.to_string()),
            church_id: Some(church_id.to_string()),
            force_password_change: false,
        });
    }

    let notifications = vec![Notification {
        id: 1,
        message: "Welcome to the national reporting dashboard.".into(),
        read: false,
        timestamp: Utc::now(),
    }];

    (data, users, notifications)
}
