use crate::query::QuerySyntaxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChangeSpecError {
    #[error("not initialized: run 'cs init'")]
    NotInitialized,

    #[error("changespec not found: {0}")]
    NotFound(String),

    #[error("changespec already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid changespec name '{0}': must be non-empty with no whitespace")]
    InvalidName(String),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("invalid commit entry reference: {0}")]
    InvalidEntryRef(String),

    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("parent cycle detected: {0}")]
    ParentCycle(String),

    #[error("hook not found on {name}: {command}")]
    HookNotFound { name: String, command: String },

    #[error("hook already exists on {name}: {command}")]
    HookExists { name: String, command: String },

    #[error("no proposal letters left for entry {0}")]
    ProposalsExhausted(u32),

    #[error("saved query not found: {0}")]
    QueryNotFound(String),

    #[error("failed to lock {path}: {source}")]
    Lock {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Query(#[from] QuerySyntaxError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ChangeSpecError>;
