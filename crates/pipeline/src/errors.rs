//! Error types for the Groundwork pipeline domain.
//!
//! [`StageFailure`] is what a stage implementation raises. [`PipelineError`]
//! covers conditions that halt the run itself; a stage failure becomes
//! [`PipelineError::StageFailed`] on its way to the caller.
//!
//! Conditions the core absorbs (an unknown citation id, a loop that uses its
//! whole iteration budget) are not errors; they are logged and surfaced in the
//! run journal instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::StageName;

// ---------------------------------------------------------------------------
// Stage-level errors
// ---------------------------------------------------------------------------

/// A stage could not produce its output.
///
/// Never retried by the core: the run aborts and the failure is returned to
/// the caller. Timeouts and retries of the underlying work are the stage's
/// own business.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct StageFailure {
    /// Human-readable description of what went wrong.
    pub message: String,
}

impl StageFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline-level errors
// ---------------------------------------------------------------------------

/// Errors that halt the pipeline.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum PipelineError {
    /// A stage raised during execution. Shared state holds the outputs of
    /// every stage that completed before it and nothing from this one.
    #[error("Stage '{stage}' failed: {source}")]
    StageFailed {
        /// Name of the stage that raised.
        stage: StageName,
        /// The failure the stage reported.
        #[source]
        source: StageFailure,
    },

    /// The pipeline graph or runtime configuration is invalid.
    ///
    /// Produced at build time; the pipeline never starts with an invalid config.
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },
}

impl PipelineError {
    /// Shorthand for [`PipelineError::ConfigurationError`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }
}
