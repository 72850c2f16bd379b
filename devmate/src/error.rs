//! Error taxonomy for planning, validation, and execution.
//!
//! I/O adapters under [`crate::io`] report failures as `anyhow::Error`; those
//! pass through unchanged as [`DevmateError::Collaborator`].

use thiserror::Error;

/// Errors surfaced by the plan → validate → execute pipeline.
#[derive(Debug, Error)]
pub enum DevmateError {
    /// Action name has no registered handler.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// A handler's required payload key is missing or has the wrong type.
    #[error("action '{action}' requires payload key '{key}'")]
    InvalidPayload { action: String, key: String },

    /// Text-generation output could not be turned into a plan.
    #[error("planning failed: {0}")]
    PlanningFailed(String),

    /// Plan violated a structural or whitelist rule.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    /// A required credential or setting is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Filesystem, version-control, network, or template failure.
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

impl DevmateError {
    pub fn invalid_payload(action: &str, key: &str) -> Self {
        Self::InvalidPayload {
            action: action.to_string(),
            key: key.to_string(),
        }
    }
}

pub type Result<T, E = DevmateError> = std::result::Result<T, E>;
