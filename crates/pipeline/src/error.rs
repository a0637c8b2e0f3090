//! Pipeline error types.

use domain::{ExternalId, JobStatus, SpecificationError};
use thiserror::Error;

use crate::state::Stage;

/// Errors that can occur while driving an order attempt.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The book specification or order parameters are invalid.
    #[error("Invalid specification: {0}")]
    InvalidSpecification(#[from] SpecificationError),

    /// An artifact upload failed; nothing partial persists.
    #[error("Upload failed: {reason}")]
    UploadFailed { reason: String },

    /// Provider-side file validation rejected an artifact.
    #[error("File validation failed: {}", messages.join("; "))]
    ValidationFailed { messages: Vec<String> },

    /// The submission to the provider failed. When `ambiguous` the
    /// provider may have created the job despite the failure.
    #[error("Submission failed{}: {reason}", if *ambiguous { " (outcome unknown)" } else { "" })]
    SubmissionFailed { reason: String, ambiguous: bool },

    /// Authentication with the provider failed after one token refresh.
    #[error("Provider authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The order requires a feature the license does not grant.
    #[error("Feature '{feature}' is not licensed")]
    FeatureNotLicensed { feature: String },

    /// The attempt was cancelled at a stage boundary before submission.
    #[error("Attempt cancelled during {stage}")]
    Cancelled { stage: Stage },

    /// No job is recorded under the given external id.
    #[error("No job found for external id '{0}'")]
    JobNotFound(ExternalId),

    /// The provider declined to cancel a job that is already past
    /// its cancellable window.
    #[error("Provider declined cancellation; job is {status}")]
    CancellationRejected { status: JobStatus },

    /// Print provider transport error.
    #[error("Print provider error: {0}")]
    Provider(String),

    /// Object storage transport error.
    #[error("Object storage error: {0}")]
    Storage(String),
}

impl PipelineError {
    /// The stage this error occurred in.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::InvalidSpecification(_) | PipelineError::FeatureNotLicensed { .. } => {
                Stage::Idle
            }
            PipelineError::UploadFailed { .. } | PipelineError::Storage(_) => Stage::Staging,
            PipelineError::ValidationFailed { .. } => Stage::Validating,
            PipelineError::SubmissionFailed { .. } | PipelineError::AuthenticationFailed(_) => {
                Stage::Submitting
            }
            PipelineError::Cancelled { stage } => *stage,
            PipelineError::JobNotFound(_)
            | PipelineError::CancellationRejected { .. }
            | PipelineError::Provider(_) => Stage::Polling,
        }
    }

    /// Whether an automatic retry with the same external id is safe
    /// and potentially useful.
    ///
    /// An ambiguous submission is not, until reconciliation settles
    /// whether the provider created the job. Validation and
    /// specification errors need changed inputs, not a retry.
    pub fn retry_with_same_external_id(&self) -> bool {
        match self {
            PipelineError::UploadFailed { .. }
            | PipelineError::Storage(_)
            | PipelineError::Provider(_)
            | PipelineError::AuthenticationFailed(_)
            | PipelineError::Cancelled { .. } => true,
            PipelineError::SubmissionFailed { ambiguous, .. } => !ambiguous,
            PipelineError::InvalidSpecification(_)
            | PipelineError::ValidationFailed { .. }
            | PipelineError::FeatureNotLicensed { .. }
            | PipelineError::JobNotFound(_)
            | PipelineError::CancellationRejected { .. } => false,
        }
    }
}

/// Convenience type alias for pipeline results.
pub type Result<T> = std::result::Result<T, PipelineError>;
