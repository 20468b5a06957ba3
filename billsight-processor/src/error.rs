//! Workflow error types.

use billsight_core::{ParseError, ProcessOutcome, QualityAssessment, Stage};
use billsight_store::StoreError;
use thiserror::Error;

/// Message returned to the caller when the quality gate rejects a bill.
pub const LOW_QUALITY_MESSAGE: &str = "Image quality too low. Please upload a clearer image.";

/// Errors that stop a processing run.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The input file was rejected before any model call.
    #[error("Image validation failed: {0}")]
    Validation(String),

    /// The input file could not be read.
    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),

    /// Every configured model failed.
    #[error("{message}")]
    ModelCall {
        /// Stage that issued the call.
        stage: Stage,
        /// Combined provider failure description.
        message: String,
    },

    /// A model answered but no usable JSON was found.
    #[error("{source}")]
    Parse {
        /// Stage that issued the call.
        stage: Stage,
        /// The extractor failure, carrying the raw reply.
        source: ParseError,
    },

    /// The extraction scored below the minimum confidence.
    #[error("Image quality too low. Please upload a clearer image.")]
    QualityRejected {
        /// The score that failed the gate.
        score: f64,
        /// The model's assessment.
        assessment: QualityAssessment,
    },

    /// The bill could not be stored.
    #[error("Failed to save bill: {0}")]
    Persistence(#[from] StoreError),

    /// Anything else, including panics inside the run.
    #[error("Processing failed: {0}")]
    Internal(String),
}

impl ProcessError {
    /// Returns the stage this error is reported under.
    pub fn stage(&self) -> Stage {
        match self {
            ProcessError::Validation(_) | ProcessError::Io(_) => Stage::Preparation,
            ProcessError::ModelCall { stage, .. } | ProcessError::Parse { stage, .. } => *stage,
            ProcessError::QualityRejected { .. } => Stage::QualityCheck,
            ProcessError::Persistence(_) => Stage::Persistence,
            ProcessError::Internal(_) => Stage::Unknown,
        }
    }

    /// Converts the error into the failure shape of the process entry point.
    pub fn into_outcome(self) -> ProcessOutcome {
        match self {
            ProcessError::QualityRejected { score, assessment } => {
                ProcessOutcome::rejected(score, assessment, LOW_QUALITY_MESSAGE)
            }
            other => ProcessOutcome::failed(other.stage(), other.to_string()),
        }
    }
}
