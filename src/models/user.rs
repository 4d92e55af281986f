use serde::{Deserialize, Serialize};

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Counselor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Counselor => "counselor",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "counselor" | "counsellor" => Some(Role::Counselor),
            _ => None,
        }
    }

    /// Admins can act wherever a counselor can; the reverse does not hold
    pub fn satisfies(&self, required: Role) -> bool {
        match required {
            Role::Admin => *self == Role::Admin,
            Role::Counselor => true,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CRM user (admin or counselor)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Option<i64>,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_ts: i64,
}

/// Server-side login session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub created_ts: i64,
    pub expires_ts: i64,
}

impl Session {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_ts
    }
}

/// Client-side session marker, written on login.
///
/// Only `token` is used for verification; the other fields are informational
/// and are re-read from the users table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMarker {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_conversion() {
        assert_eq!(Role::from_str("admin"), Some(Role::Admin));
        assert_eq!(Role::from_str("Counselor"), Some(Role::Counselor));
        assert_eq!(Role::from_str("manager"), None);
        assert_eq!(Role::Counselor.as_str(), "counselor");
    }

    #[test]
    fn test_role_satisfies() {
        assert!(Role::Admin.satisfies(Role::Admin));
        assert!(Role::Admin.satisfies(Role::Counselor));
        assert!(Role::Counselor.satisfies(Role::Counselor));
        assert!(!Role::Counselor.satisfies(Role::Admin));
    }

    #[test]
    fn test_marker_json_shape() {
        let marker = SessionMarker {
            id: 1,
            email: "admin@buildabroad.com".to_string(),
            name: "Admin".to_string(),
            role: Role::Admin,
            token: "t".to_string(),
        };
        let json = serde_json::to_value(&marker).unwrap();
        assert_eq!(json["role"], "admin");
        assert_eq!(json["email"], "admin@buildabroad.com");
    }
}
