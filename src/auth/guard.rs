//! Role-gated command guard.
//!
//! The marker file only tells us which token to check. The token must match a
//! live row in `sessions`, and the role always comes from `users`, so editing
//! the marker cannot grant a role.

use rusqlite::Connection;
use anyhow::Result;
use crate::auth::marker;
use crate::config::Config;
use crate::error::CrmError;
use crate::models::{Role, User};
use crate::repo::{SessionRepo, UserRepo};

/// The verified user behind the current invocation
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
    pub token: String,
}

impl AuthContext {
    pub fn user_id(&self) -> i64 {
        self.user.id.unwrap_or_default()
    }

    /// Name recorded in logs as the actor
    pub fn actor(&self) -> &str {
        &self.user.name
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }
}

/// Require any logged-in, active user
pub fn require_session(conn: &Connection, config: &Config) -> Result<AuthContext> {
    let marker = marker::read_marker(&config.session_location)?
        .ok_or(CrmError::NotLoggedIn)?;

    let session = SessionRepo::validate(conn, &marker.token)?
        .ok_or(CrmError::SessionExpired)?;

    let user = UserRepo::get_by_id(conn, session.user_id)?
        .filter(|u| u.is_active)
        .ok_or(CrmError::SessionExpired)?;

    if marker.role != user.role || marker.id != session.user_id {
        log::warn!(
            "session file does not match stored account {}; using stored role '{}'",
            user.email,
            user.role
        );
    }

    Ok(AuthContext { user, token: session.token })
}

/// Require a logged-in user whose stored role satisfies `required`
pub fn require_role(conn: &Connection, config: &Config, required: Role) -> Result<AuthContext> {
    let ctx = require_session(conn, config)?;
    if !ctx.role().satisfies(required) {
        return Err(CrmError::Forbidden { required }.into());
    }
    Ok(ctx)
}
