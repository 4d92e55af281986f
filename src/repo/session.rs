use rusqlite::{Connection, OptionalExtension};
use crate::models::Session;
use anyhow::{Context, Result};

/// Server-side login sessions
pub struct SessionRepo;

impl SessionRepo {
    /// Open a session for a user and return it with its new token
    pub fn create(conn: &Connection, user_id: i64, ttl_hours: i64) -> Result<Session> {
        let now = chrono::Utc::now().timestamp();
        let expires_ts = ttl_hours
            .checked_mul(3600)
            .and_then(|secs| now.checked_add(secs))
            .with_context(|| format!("Session lifetime of {} hours is out of range", ttl_hours))?;
        let session = Session {
            token: uuid::Uuid::new_v4().simple().to_string(),
            user_id,
            created_ts: now,
            expires_ts,
        };

        conn.execute(
            "INSERT INTO sessions (token, user_id, created_ts, expires_ts) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![session.token, session.user_id, session.created_ts, session.expires_ts],
        )
        .with_context(|| format!("Failed to create session for user {}", user_id))?;

        Ok(session)
    }

    /// Look up a session by token, expired or not
    pub fn get(conn: &Connection, token: &str) -> Result<Option<Session>> {
        conn.query_row(
            "SELECT token, user_id, created_ts, expires_ts FROM sessions WHERE token = ?1",
            [token],
            |row| {
                Ok(Session {
                    token: row.get(0)?,
                    user_id: row.get(1)?,
                    created_ts: row.get(2)?,
                    expires_ts: row.get(3)?,
                })
            },
        )
        .optional()
        .context("Failed to query session")
    }

    /// A session that exists and has not expired
    pub fn validate(conn: &Connection, token: &str) -> Result<Option<Session>> {
        let now = chrono::Utc::now().timestamp();
        Ok(Self::get(conn, token)?.filter(|s| !s.is_expired(now)))
    }

    pub fn delete(conn: &Connection, token: &str) -> Result<bool> {
        let deleted = conn.execute("DELETE FROM sessions WHERE token = ?1", [token])?;
        Ok(deleted > 0)
    }

    /// Drop expired sessions, returning how many were removed
    pub fn purge_expired(conn: &Connection) -> Result<usize> {
        let now = chrono::Utc::now().timestamp();
        let purged = conn.execute("DELETE FROM sessions WHERE expires_ts <= ?1", [now])?;
        if purged > 0 {
            log::debug!("purged {} expired sessions", purged);
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::models::Role;
    use crate::repo::UserRepo;

    #[test]
    fn test_create_validate_delete() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let user = UserRepo::create(&conn, "a@x.com", "A", None, Role::Admin, "pw").unwrap();

        let session = SessionRepo::create(&conn, user.id.unwrap(), 12).unwrap();
        assert!(SessionRepo::validate(&conn, &session.token).unwrap().is_some());
        assert!(SessionRepo::validate(&conn, "forged").unwrap().is_none());

        assert!(SessionRepo::delete(&conn, &session.token).unwrap());
        assert!(SessionRepo::validate(&conn, &session.token).unwrap().is_none());
    }

    #[test]
    fn test_expired_session_rejected_and_purged() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let user = UserRepo::create(&conn, "a@x.com", "A", None, Role::Admin, "pw").unwrap();
        let session = SessionRepo::create(&conn, user.id.unwrap(), 0).unwrap();

        assert!(SessionRepo::validate(&conn, &session.token).unwrap().is_none());
        assert_eq!(SessionRepo::purge_expired(&conn).unwrap(), 1);
    }

    #[test]
    fn test_oversized_lifetime_is_an_error() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let user = UserRepo::create(&conn, "a@x.com", "A", None, Role::Admin, "pw").unwrap();

        assert!(SessionRepo::create(&conn, user.id.unwrap(), 9_000_000_000_000_000).is_err());
        assert!(SessionRepo::create(&conn, user.id.unwrap(), i64::MAX).is_err());
    }
}
