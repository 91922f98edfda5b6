//! Simulation error types

use crate::sim::pool::TemplateId;

/// Errors raised by the simulation core.
///
/// Everything here is a configuration or programming error; nothing is
/// transient, so callers are expected to fail fast rather than retry.
#[derive(thiserror::Error, Debug)]
pub enum SimError {
    /// A template handle that was never registered with the pool
    #[error("invalid template: {0}")]
    InvalidTemplate(TemplateId),

    /// Missing or inconsistent setup data
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The track was ticked or queried before `initialize`
    #[error("segment track used before initialize")]
    NotInitialized,

    /// Settings file could not be parsed
    #[error("settings parse error: {0}")]
    Settings(#[from] serde_json::Error),

    /// Settings file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// Shorthand for an `InvalidConfiguration` error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }
}

/// Result alias used across the crate
pub type SimResult<T> = Result<T, SimError>;
