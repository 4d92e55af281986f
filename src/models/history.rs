use serde::{Deserialize, Serialize};
use crate::models::Stage;

/// What caused a stage history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOrigin {
    System,
    Import,
    Assignment,
    Task,
    Manual,
    Override,
}

impl HistoryOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryOrigin::System => "system",
            HistoryOrigin::Import => "import",
            HistoryOrigin::Assignment => "assignment",
            HistoryOrigin::Task => "task",
            HistoryOrigin::Manual => "manual",
            HistoryOrigin::Override => "override",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "system" => Some(HistoryOrigin::System),
            "import" => Some(HistoryOrigin::Import),
            "assignment" => Some(HistoryOrigin::Assignment),
            "task" => Some(HistoryOrigin::Task),
            "manual" => Some(HistoryOrigin::Manual),
            "override" => Some(HistoryOrigin::Override),
            _ => None,
        }
    }

    /// Tag appended to the actor in the stage log, e.g. "Sarah Miller (Manual)"
    pub fn display_tag(&self) -> Option<&'static str> {
        match self {
            HistoryOrigin::Task => Some("Task"),
            HistoryOrigin::Manual => Some("Manual"),
            HistoryOrigin::Override => Some("Admin Override"),
            HistoryOrigin::Assignment => Some("Assignment"),
            HistoryOrigin::System | HistoryOrigin::Import => None,
        }
    }
}

/// One stage a lead has occupied. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageHistoryEntry {
    pub id: Option<i64>,
    pub lead_id: i64,
    pub stage: Stage,
    pub actor: String,
    pub origin: HistoryOrigin,
    pub entry_ts: i64,
}

impl StageHistoryEntry {
    pub fn actor_display(&self) -> String {
        match self.origin.display_tag() {
            Some(tag) => format!("{} ({})", self.actor, tag),
            None => self.actor.clone(),
        }
    }
}

/// Free-text note on a lead. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Remark {
    pub id: Option<i64>,
    pub lead_id: i64,
    pub task_id: Option<i64>,
    pub note: String,
    pub actor: String,
    pub entry_ts: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_conversion() {
        for origin in [
            HistoryOrigin::System,
            HistoryOrigin::Import,
            HistoryOrigin::Assignment,
            HistoryOrigin::Task,
            HistoryOrigin::Manual,
            HistoryOrigin::Override,
        ] {
            assert_eq!(HistoryOrigin::from_str(origin.as_str()), Some(origin));
        }
        assert_eq!(HistoryOrigin::from_str("bogus"), None);
    }

    #[test]
    fn test_actor_display() {
        let entry = StageHistoryEntry {
            id: None,
            lead_id: 1,
            stage: Stage::ContactAgain,
            actor: "Sarah Miller".to_string(),
            origin: HistoryOrigin::Manual,
            entry_ts: 0,
        };
        assert_eq!(entry.actor_display(), "Sarah Miller (Manual)");
    }
}
