use rusqlite::{Connection, OptionalExtension, Row};
use crate::auth::password;
use crate::error::CrmError;
use crate::models::{Role, User};
use anyhow::{Context, Result};

const USER_COLUMNS: &str = "id, email, name, phone, role, is_active, created_ts";

/// User directory repository
pub struct UserRepo;

impl UserRepo {
    /// Create a user with a freshly salted password digest
    pub fn create(
        conn: &Connection,
        email: &str,
        name: &str,
        phone: Option<&str>,
        role: Role,
        password: &str,
    ) -> Result<User> {
        let email = email.trim();
        let name = name.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(CrmError::Validation(format!("Invalid email address: '{}'", email)).into());
        }
        if name.is_empty() {
            return Err(CrmError::Validation("User name cannot be empty".to_string()).into());
        }
        if password.is_empty() {
            return Err(CrmError::Validation("Password cannot be empty".to_string()).into());
        }
        if Self::get_by_email(conn, email)?.is_some() {
            return Err(CrmError::Validation(format!("User '{}' already exists", email)).into());
        }

        let now = chrono::Utc::now().timestamp();
        let salt = password::generate_salt();
        let digest = password::hash_password(&salt, password);
        let phone = phone.map(str::trim).filter(|p| !p.is_empty());

        conn.execute(
            "INSERT INTO users (email, name, phone, role, password_salt, password_hash, is_active, created_ts, modified_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)",
            rusqlite::params![email, name, phone, role.as_str(), salt, digest, now],
        )
        .with_context(|| format!("Failed to create user: {}", email))?;

        let id = conn.last_insert_rowid();
        log::debug!("created {} user {} ({})", role, id, email);
        Ok(User {
            id: Some(id),
            email: email.to_string(),
            name: name.to_string(),
            phone: phone.map(str::to_string),
            role,
            is_active: true,
            created_ts: now,
        })
    }

    /// Get user by email (case-insensitive)
    pub fn get_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let user = stmt.query_row([email.trim()], row_to_user).optional()?;
        Ok(user)
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let user = stmt.query_row([id], row_to_user).optional()?;
        Ok(user)
    }

    /// List all users, admins first
    pub fn list(conn: &Connection) -> Result<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY role, id", USER_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    pub fn count(conn: &Connection) -> Result<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn count_active(conn: &Connection) -> Result<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM users WHERE is_active = 1", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Deactivate a user and revoke their sessions
    pub fn deactivate(conn: &Connection, email: &str) -> Result<User> {
        let user = Self::get_by_email(conn, email)?
            .ok_or_else(|| CrmError::UserNotFound(email.to_string()))?;
        let id = user.id.ok_or_else(|| anyhow::anyhow!("User {} has no id", email))?;

        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "UPDATE users SET is_active = 0, modified_ts = ?1 WHERE id = ?2",
            rusqlite::params![now, id],
        )
        .with_context(|| format!("Failed to deactivate user {}", email))?;
        conn.execute("DELETE FROM sessions WHERE user_id = ?1", [id])?;

        Ok(User { is_active: false, ..user })
    }

    /// Check a login attempt. Unknown email, wrong password and inactive
    /// accounts are indistinguishable to the caller.
    pub fn verify_credentials(conn: &Connection, email: &str, candidate: &str) -> Result<Option<User>> {
        let row = conn
            .query_row(
                "SELECT password_salt, password_hash FROM users WHERE email = ?1 AND is_active = 1",
                [email.trim()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((salt, digest)) = row else {
            return Ok(None);
        };
        if !password::verify_password(&salt, &digest, candidate) {
            return Ok(None);
        }
        Self::get_by_email(conn, email)
    }

    /// Find an active user who can own leads, by email or by name (case-insensitive)
    pub fn find_assignee(conn: &Connection, query: &str) -> Result<Option<User>> {
        let query = query.trim();
        if let Some(user) = Self::get_by_email(conn, query)? {
            return Ok(Some(user).filter(|u| u.is_active));
        }
        let lower = query.to_lowercase();
        let mut matches: Vec<User> = Self::list(conn)?
            .into_iter()
            .filter(|u| u.is_active && u.name.to_lowercase() == lower)
            .collect();
        if matches.len() > 1 {
            return Err(CrmError::Validation(format!(
                "Name '{}' matches {} users. Use an email address instead.",
                query,
                matches.len()
            ))
            .into());
        }
        Ok(matches.pop())
    }
}

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    let role: String = row.get(4)?;
    let role = Role::from_str(&role).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown role '{}'", role).into(),
        )
    })?;
    Ok(User {
        id: Some(row.get(0)?),
        email: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        role,
        is_active: row.get::<_, i64>(5)? != 0,
        created_ts: row.get(6)?,
    })
}
