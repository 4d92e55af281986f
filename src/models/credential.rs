use serde::{Deserialize, Serialize};

pub const PASSWORD_MASK: &str = "••••••••";

/// University portal login captured from a credentials-logging task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniversityApplication {
    pub id: Option<i64>,
    pub lead_id: i64,
    pub task_id: Option<i64>,
    pub university_name: String,
    pub url: Option<String>,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub created_ts: i64,
}

impl UniversityApplication {
    /// Password as it should be shown; masked unless revealed
    pub fn password_display(&self, reveal: bool) -> String {
        match (&self.password, reveal) {
            (Some(password), true) => password.clone(),
            (Some(_), false) => PASSWORD_MASK.to_string(),
            (None, _) => "(none)".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_display() {
        let app = UniversityApplication {
            id: Some(1),
            lead_id: 1,
            task_id: None,
            university_name: "MIT".to_string(),
            url: None,
            username: Some("alice".to_string()),
            password: Some("hunter2".to_string()),
            created_ts: 0,
        };
        assert_eq!(app.password_display(false), PASSWORD_MASK);
        assert_eq!(app.password_display(true), "hunter2");
        let json = serde_json::to_string(&app).unwrap();
        assert!(!json.contains("hunter2"));
    }
}
