//! Domain errors.
//!
//! Everything here is a user-facing failure: the command was refused or the
//! input was wrong, and nothing was written. Database and I/O failures travel
//! as plain `anyhow` errors and are reported as internal errors instead.

use thiserror::Error;
use crate::models::{Role, Stage};

#[derive(Debug, Error)]
pub enum CrmError {
    #[error("Not logged in. Run 'abroad login <email>' first.")]
    NotLoggedIn,

    #[error("Session expired or revoked. Run 'abroad login <email>' again.")]
    SessionExpired,

    #[error("This command requires the {required} role.")]
    Forbidden { required: Role },

    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("Missing required field '{field}' for {task_type} task.")]
    MissingField {
        task_type: String,
        field: &'static str,
    },

    #[error("Invalid value '{value}' for {field}. Allowed: {}", allowed.join(", "))]
    InvalidValue {
        field: String,
        value: String,
        allowed: Vec<&'static str>,
    },

    #[error("Unrecognized field '{field}'.{}", suggestion.as_ref().map(|s| format!(" Did you mean '{}'?", s)).unwrap_or_default())]
    UnknownField {
        field: String,
        suggestion: Option<String>,
    },

    #[error("Unknown stage '{input}'.{}", suggestion.as_ref().map(|s| format!(" Did you mean '{}'?", s)).unwrap_or_default())]
    UnknownStage {
        input: String,
        suggestion: Option<String>,
    },

    #[error("Lead is already at the final stage '{stage}'.")]
    AlreadyAtFinalStage { stage: Stage },

    #[error("A non-empty reason is required for a stage override.")]
    EmptyOverrideReason,

    #[error("Lead {0} not found")]
    LeadNotFound(i64),

    #[error("Lead {0} is not assigned to you.")]
    NotAssigned(i64),

    #[error("User '{0}' not found")]
    UserNotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Import failed: {0}")]
    Import(String),
}

/// True when an error chain carries a `CrmError`, i.e. it is a user error
pub fn is_user_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.downcast_ref::<CrmError>().is_some())
}
