//! Login, logout and the command guard

pub mod guard;
pub mod marker;
pub mod password;

pub use guard::{require_role, require_session, AuthContext};

use rusqlite::Connection;
use anyhow::Result;
use crate::config::Config;
use crate::error::CrmError;
use crate::models::{SessionMarker, User};
use crate::repo::{SessionRepo, UserRepo};

/// Verify credentials, open a server-side session and write the marker file
pub fn login(conn: &Connection, config: &Config, email: &str, password: &str) -> Result<User> {
    let user = UserRepo::verify_credentials(conn, email, password)?
        .ok_or(CrmError::InvalidCredentials)?;
    let user_id = user.id.ok_or_else(|| anyhow::anyhow!("User {} has no id", user.email))?;

    SessionRepo::purge_expired(conn)?;

    // Replace any previous session held by this marker
    if let Some(old) = marker::read_marker(&config.session_location)? {
        SessionRepo::delete(conn, &old.token)?;
    }

    let session = SessionRepo::create(conn, user_id, config.session_ttl_hours)?;
    marker::write_marker(
        &config.session_location,
        &SessionMarker {
            id: user_id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            token: session.token,
        },
    )?;

    log::info!("{} logged in as {}", user.email, user.role);
    Ok(user)
}

/// Revoke the current session and remove the marker. Returns false when no
/// one was logged in.
pub fn logout(conn: &Connection, config: &Config) -> Result<bool> {
    let Some(current) = marker::read_marker(&config.session_location)? else {
        marker::remove_marker(&config.session_location)?;
        return Ok(false);
    };
    SessionRepo::delete(conn, &current.token)?;
    marker::remove_marker(&config.session_location)?;
    log::info!("{} logged out", current.email);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::models::Role;
    use tempfile::TempDir;

    #[test]
    fn test_invalid_credentials_are_generic() {
        let dir = TempDir::new().unwrap();
        let config = Config::defaults(dir.path());
        let conn = DbConnection::connect_in_memory().unwrap();
        UserRepo::create(&conn, "a@x.com", "A", None, Role::Admin, "pw").unwrap();

        let wrong_password = login(&conn, &config, "a@x.com", "nope").unwrap_err();
        let unknown_email = login(&conn, &config, "b@x.com", "pw").unwrap_err();
        assert_eq!(wrong_password.to_string(), "Invalid credentials.");
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(!config.session_location.exists());
    }

    #[test]
    fn test_login_writes_marker() {
        let dir = TempDir::new().unwrap();
        let config = Config::defaults(dir.path());
        let conn = DbConnection::connect_in_memory().unwrap();
        UserRepo::create(&conn, "a@x.com", "A", None, Role::Admin, "pw").unwrap();

        let user = login(&conn, &config, "a@x.com", "pw").unwrap();
        let m = marker::read_marker(&config.session_location).unwrap().unwrap();
        assert_eq!(m.id, user.id.unwrap());
        assert_eq!(m.role, Role::Admin);
        assert!(SessionRepo::validate(&conn, &m.token).unwrap().is_some());
    }
}
