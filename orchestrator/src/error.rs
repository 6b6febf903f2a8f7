//! Error types for the drafting workflow
//!
//! A checkpoint pause is not an error and never appears here; see
//! [`crate::checkpoint::StageOutcome`].

use thiserror::Error;

use crate::role::Role;
use crate::workflow::Stage;

/// Errors that can occur while building or driving a drafting session
#[derive(Error, Debug)]
pub enum DraftError {
    /// A role identifier outside the fixed set, or a role with no contributor
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// A contributor failed to produce its text; the stage was not committed
    #[error("{role} contributor failed: {message}")]
    ContributorFailure {
        /// Role whose contributor failed
        role: Role,
        /// Rendered error chain from the contributor
        message: String,
    },

    /// A stage operation was called out of order under strict sequencing
    #[error("cannot run stage {attempted} while session is at {current}")]
    StageSequence {
        /// Stage the caller tried to produce
        attempted: Stage,
        /// Stage the session has last committed
        current: Stage,
    },

    /// The session was aborted at a checkpoint
    #[error("session aborted: {0}")]
    SessionAborted(String),

    /// A stage was retried more often than allowed
    #[error("stage {stage} retried more than {limit} times")]
    RetryLimitExceeded {
        /// Stage being retried
        stage: Stage,
        /// Configured retry limit
        limit: u32,
    },

    /// The speech request failed validation
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration could not be used
    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl DraftError {
    /// Whether a human operator has to intervene before the session can go on
    ///
    /// Every variant is a hard failure except an abort, which is a decision
    /// the operator already made.
    pub fn requires_operator(&self) -> bool {
        !matches!(self, DraftError::SessionAborted(_))
    }
}

/// Result type alias for drafting operations
pub type DraftResult<T> = Result<T, DraftError>;
