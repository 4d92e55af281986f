use serde::{Deserialize, Serialize};
use crate::models::Stage;

/// Lead model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Option<i64>,
    pub uuid: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub course: Option<String>,
    pub source: Option<String>,
    pub stage: Stage,
    pub counselor_id: Option<i64>,
    pub manager_id: Option<i64>,
    pub created_ts: i64,
    pub modified_ts: i64,
}

impl Lead {
    /// Create a new, unassigned lead at the first pipeline stage
    pub fn new(name: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: None,
            uuid: uuid::Uuid::new_v4().to_string(),
            name,
            email: None,
            phone: None,
            country: None,
            course: None,
            source: None,
            stage: Stage::YetToAssign,
            counselor_id: None,
            manager_id: None,
            created_ts: now,
            modified_ts: now,
        }
    }

    /// Search used by the lead list: name and email case-insensitively, phone verbatim
    pub fn matches_search(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        let lower = term.to_lowercase();
        self.name.to_lowercase().contains(&lower)
            || self.email.as_deref().map_or(false, |e| e.to_lowercase().contains(&lower))
            || self.phone.as_deref().map_or(false, |p| p.contains(term))
    }
}

/// Lead fields supplied on creation (CSV import, `leads add`, seed data)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewLead {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub course: Option<String>,
    pub source: Option<String>,
}
