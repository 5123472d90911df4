// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::types::OpId;

#[derive(Error, Debug)]
pub enum DagSchedError {
    /// The agent picked an operation that cannot receive workers right now.
    #[error("Invalid action on operation {op}: {reason}")]
    InvalidAction { op: OpId, reason: String },

    /// `pop` on an empty timeline. The step loop checks emptiness first, so
    /// seeing this means the engine itself is broken.
    #[error("Attempted to pop from an empty event timeline")]
    EmptyTimeline,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cycle detected in job DAG: {0}")]
    DagCycle(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DagSchedError>;
