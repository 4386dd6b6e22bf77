use crate::domain::entities::activity::ChurchActivity;
use crate::domain::entities::announcement::Announcement;
use crate::domain::entities::bureau::{BureauActivity, BureauMember};
use crate::domain::entities::member::BaptizedMember;
use crate::domain::entities::report::WorshipService;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Church {
    pub id: String,
    pub name: String,
    pub region_id: String,
    pub worship_services: Vec<WorshipService>,
    pub baptized_members: Vec<BaptizedMember>,
    pub activities: Vec<ChurchActivity>,
    pub bureau: Vec<BureauMember>,
    pub announcements: Vec<Announcement>,
}

impl Church {
    pub fn new(id: String, name: String, region_id: String) -> Self {
        Self {
            id,
            name,
            region_id,
            worship_services: Vec::new(),
            baptized_members: Vec::new(),
            activities: Vec::new(),
            bureau: Vec::new(),
            announcements: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: String,
    pub name: String,
    /// Ids of the churches belonging to this region.
    pub churches: Vec<String>,
    pub bureau: Vec<BureauMember>,
    pub activities: Vec<BureauActivity>,
}

impl Region {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            churches: Vec::new(),
            bureau: Vec::new(),
            activities: Vec::new(),
        }
    }
}

/// The whole collections tree, keyed for deterministic serialization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NationalData {
    pub bureau: Vec<BureauMember>,
    pub activities: Vec<BureauActivity>,
    pub regions: BTreeMap<String, Region>,
    pub churches: BTreeMap<String, Church>,
}

impl NationalData {
    pub fn church(&self, church_id: &str) -> Option<&Church> {
        self.churches.get(church_id)
    }

    pub fn church_mut(&mut self, church_id: &str) -> Option<&mut Church> {
        self.churches.get_mut(church_id)
    }
}
