use serde::{Deserialize, Serialize};
use std::fmt;

/// The ownership boundary of a collection: the national root, one region
/// or one church. Bureau operations are addressed by scope; the offline
/// queue is sharded by the owning church id only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "level", content = "id", rename_all = "lowercase")]
pub enum Scope {
    National,
    Region(String),
    Church(String),
}

impl Scope {
    pub fn level(&self) -> &'static str {
        match self {
            Scope::National => "national",
            Scope::Region(_) => "region",
            Scope::Church(_) => "church",
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Scope::National => None,
            Scope::Region(id) | Scope::Church(id) => Some(id.as_str()),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "{} {}", self.level(), id),
            None => write!(f, "{}", self.level()),
        }
    }
}
