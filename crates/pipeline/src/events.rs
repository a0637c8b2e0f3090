//! Attempt lifecycle events.

use chrono::{DateTime, Utc};
use common::AttemptId;
use domain::{ExternalId, JobStatus, StagedFile, ValidationResult};
use serde::{Deserialize, Serialize};

use crate::state::Stage;

/// Events that can occur during an order attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AttemptEvent {
    /// Attempt execution started.
    AttemptStarted(AttemptStartedData),

    /// A pipeline stage was entered.
    StageEntered(StageData),

    /// Interior and cover artifacts were uploaded.
    FilesStaged(FilesStagedData),

    /// Both staged artifacts were validated.
    FilesValidated(FilesValidatedData),

    /// The provider accepted the print job.
    JobSubmitted(JobSubmittedData),

    /// A polled status was observed on the job.
    StatusObserved(StatusObservedData),

    /// The job reached a terminal provider status.
    AttemptCompleted(AttemptCompletedData),

    /// A stage failed, ending the attempt.
    StageFailed(StageFailedData),

    /// The attempt was cancelled at a stage boundary.
    AttemptCancelled(StageData),
}

impl AttemptEvent {
    /// Returns the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            AttemptEvent::AttemptStarted(_) => "AttemptStarted",
            AttemptEvent::StageEntered(_) => "StageEntered",
            AttemptEvent::FilesStaged(_) => "FilesStaged",
            AttemptEvent::FilesValidated(_) => "FilesValidated",
            AttemptEvent::JobSubmitted(_) => "JobSubmitted",
            AttemptEvent::StatusObserved(_) => "StatusObserved",
            AttemptEvent::AttemptCompleted(_) => "AttemptCompleted",
            AttemptEvent::StageFailed(_) => "StageFailed",
            AttemptEvent::AttemptCancelled(_) => "AttemptCancelled",
        }
    }
}

/// Data for AttemptStarted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptStartedData {
    /// The attempt instance ID.
    pub attempt_id: AttemptId,
    /// The caller's idempotency key.
    pub external_id: ExternalId,
    /// When the attempt started.
    pub started_at: DateTime<Utc>,
}

/// Data for events that carry only a stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageData {
    /// The stage in question.
    pub stage: Stage,
}

/// Data for FilesStaged event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesStagedData {
    /// The uploaded interior artifact.
    pub interior: StagedFile,
    /// The uploaded cover artifact.
    pub cover: StagedFile,
}

/// Data for FilesValidated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesValidatedData {
    /// Verdict for the interior artifact.
    pub interior: ValidationResult,
    /// Verdict for the cover artifact.
    pub cover: ValidationResult,
}

/// Data for JobSubmitted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSubmittedData {
    /// Provider-assigned job id.
    pub job_id: String,
    /// When the provider accepted the job.
    pub submitted_at: DateTime<Utc>,
}

/// Data for StatusObserved event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusObservedData {
    /// The status reported by the provider.
    pub status: JobStatus,
}

/// Data for AttemptCompleted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptCompletedData {
    /// When the attempt completed.
    pub completed_at: DateTime<Utc>,
}

/// Data for StageFailed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageFailedData {
    /// The stage that failed.
    pub stage: Stage,
    /// Error message describing the failure.
    pub cause: String,
}

// Convenience constructors
impl AttemptEvent {
    /// Creates an AttemptStarted event.
    pub fn attempt_started(attempt_id: AttemptId, external_id: ExternalId) -> Self {
        AttemptEvent::AttemptStarted(AttemptStartedData {
            attempt_id,
            external_id,
            started_at: Utc::now(),
        })
    }

    /// Creates a StageEntered event.
    pub fn stage_entered(stage: Stage) -> Self {
        AttemptEvent::StageEntered(StageData { stage })
    }

    /// Creates a FilesStaged event.
    pub fn files_staged(interior: StagedFile, cover: StagedFile) -> Self {
        AttemptEvent::FilesStaged(FilesStagedData { interior, cover })
    }

    /// Creates a FilesValidated event.
    pub fn files_validated(interior: ValidationResult, cover: ValidationResult) -> Self {
        AttemptEvent::FilesValidated(FilesValidatedData { interior, cover })
    }

    /// Creates a JobSubmitted event.
    pub fn job_submitted(job_id: impl Into<String>) -> Self {
        AttemptEvent::JobSubmitted(JobSubmittedData {
            job_id: job_id.into(),
            submitted_at: Utc::now(),
        })
    }

    /// Creates a StatusObserved event.
    pub fn status_observed(status: JobStatus) -> Self {
        AttemptEvent::StatusObserved(StatusObservedData { status })
    }

    /// Creates an AttemptCompleted event.
    pub fn attempt_completed() -> Self {
        AttemptEvent::AttemptCompleted(AttemptCompletedData {
            completed_at: Utc::now(),
        })
    }

    /// Creates a StageFailed event.
    pub fn stage_failed(stage: Stage, cause: impl Into<String>) -> Self {
        AttemptEvent::StageFailed(StageFailedData {
            stage,
            cause: cause.into(),
        })
    }

    /// Creates an AttemptCancelled event.
    pub fn attempt_cancelled(stage: Stage) -> Self {
        AttemptEvent::AttemptCancelled(StageData { stage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{FileRole, ValidationStatus};

    #[test]
    fn test_event_type() {
        let attempt_id = AttemptId::new();
        let external_id = ExternalId::new("order-1");

        assert_eq!(
            AttemptEvent::attempt_started(attempt_id, external_id).event_type(),
            "AttemptStarted"
        );
        assert_eq!(
            AttemptEvent::stage_entered(Stage::Staging).event_type(),
            "StageEntered"
        );
        assert_eq!(
            AttemptEvent::job_submitted("PJ-1").event_type(),
            "JobSubmitted"
        );
        assert_eq!(
            AttemptEvent::status_observed(JobStatus::Shipped).event_type(),
            "StatusObserved"
        );
        assert_eq!(
            AttemptEvent::attempt_completed().event_type(),
            "AttemptCompleted"
        );
        assert_eq!(
            AttemptEvent::stage_failed(Stage::Staging, "upload refused").event_type(),
            "StageFailed"
        );
        assert_eq!(
            AttemptEvent::attempt_cancelled(Stage::Validating).event_type(),
            "AttemptCancelled"
        );
    }

    #[test]
    fn test_serialization_roundtrip() {
        let events = vec![
            AttemptEvent::attempt_started(AttemptId::new(), ExternalId::new("order-1")),
            AttemptEvent::stage_entered(Stage::Staging),
            AttemptEvent::files_staged(
                StagedFile::new("mem://1", 42, FileRole::Interior),
                StagedFile::new("mem://2", 17, FileRole::Cover),
            ),
            AttemptEvent::files_validated(
                ValidationResult::clean(ValidationStatus::Normalized),
                ValidationResult::error("cover bleed missing"),
            ),
            AttemptEvent::job_submitted("PJ-1"),
            AttemptEvent::status_observed(JobStatus::InProduction),
            AttemptEvent::attempt_completed(),
            AttemptEvent::stage_failed(Stage::Validating, "interior rejected"),
            AttemptEvent::attempt_cancelled(Stage::Idle),
        ];

        for event in events {
            let json = serde_json::to_string(&event).unwrap();
            let deserialized: AttemptEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(event.event_type(), deserialized.event_type());
        }
    }

    #[test]
    fn test_stage_failed_data() {
        let event = AttemptEvent::stage_failed(Stage::Submitting, "provider timeout");

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: AttemptEvent = serde_json::from_str(&json).unwrap();

        if let AttemptEvent::StageFailed(data) = deserialized {
            assert_eq!(data.stage, Stage::Submitting);
            assert_eq!(data.cause, "provider timeout");
        } else {
            panic!("Expected StageFailed event");
        }
    }
}
