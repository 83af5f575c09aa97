//! Error types for the decomposition pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur in the decomposition pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The decision engine failed to produce a decision.
    #[error("decision engine error: {0}")]
    Decision(String),

    /// A well-formed action could not be applied to the item list.
    #[error("failed to apply action: {0}")]
    ActionApply(String),

    /// A scheduled task could not be joined.
    #[error("task join error for item {item_id}: {message}")]
    TaskJoin {
        /// Item whose task failed to join.
        item_id: String,
        /// Underlying join failure.
        message: String,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
