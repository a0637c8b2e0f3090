//! Order attempt record.

use chrono::{DateTime, Utc};
use common::AttemptId;
use domain::{ExternalId, JobStatus, StagedFile, ValidationResult};
use serde::{Deserialize, Serialize};

use crate::events::AttemptEvent;
use crate::state::Stage;

/// The record of a single order attempt.
///
/// Built by applying [`AttemptEvent`]s. The attempt holds one
/// enum-valued stage; which stages have completed is derived from the
/// artifacts the attempt has accumulated, not tracked in a mutable
/// step list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineAttempt {
    id: Option<AttemptId>,
    external_id: Option<ExternalId>,
    stage: Stage,
    started_at: Option<DateTime<Utc>>,
    interior: Option<StagedFile>,
    cover: Option<StagedFile>,
    interior_validation: Option<ValidationResult>,
    cover_validation: Option<ValidationResult>,
    /// Provider-assigned job id, once submitted.
    job_id: Option<String>,
    /// Most recent status observed while polling.
    last_status: Option<JobStatus>,
    /// Cause of failure, if any.
    failure_cause: Option<String>,
    /// The stage the attempt failed or was cancelled in.
    stopped_in: Option<Stage>,
}

impl PipelineAttempt {
    /// Applies an event, advancing the attempt.
    pub fn apply(&mut self, event: AttemptEvent) {
        match event {
            AttemptEvent::AttemptStarted(data) => {
                self.id = Some(data.attempt_id);
                self.external_id = Some(data.external_id);
                self.started_at = Some(data.started_at);
            }
            AttemptEvent::StageEntered(data) => {
                self.stage = data.stage;
            }
            AttemptEvent::FilesStaged(data) => {
                self.interior = Some(data.interior);
                self.cover = Some(data.cover);
            }
            AttemptEvent::FilesValidated(data) => {
                self.interior_validation = Some(data.interior);
                self.cover_validation = Some(data.cover);
            }
            AttemptEvent::JobSubmitted(data) => {
                self.job_id = Some(data.job_id);
                self.stage = Stage::Submitted;
            }
            AttemptEvent::StatusObserved(data) => {
                self.last_status = Some(data.status);
                self.stage = Stage::Polling;
            }
            AttemptEvent::AttemptCompleted(_) => {
                self.stage = Stage::Completed;
            }
            AttemptEvent::StageFailed(data) => {
                self.stopped_in = Some(data.stage);
                self.failure_cause = Some(data.cause);
                self.stage = Stage::Failed;
            }
            AttemptEvent::AttemptCancelled(data) => {
                self.stopped_in = Some(data.stage);
                self.stage = Stage::Cancelled;
            }
        }
    }
}

// Query methods
impl PipelineAttempt {
    /// Returns the attempt ID, once started.
    pub fn id(&self) -> Option<AttemptId> {
        self.id
    }

    /// Returns the idempotency key, once started.
    pub fn external_id(&self) -> Option<&ExternalId> {
        self.external_id.as_ref()
    }

    /// Returns the current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns the staged interior artifact, if uploaded.
    pub fn interior(&self) -> Option<&StagedFile> {
        self.interior.as_ref()
    }

    /// Returns the staged cover artifact, if uploaded.
    pub fn cover(&self) -> Option<&StagedFile> {
        self.cover.as_ref()
    }

    /// Returns the interior validation verdict, if validated.
    pub fn interior_validation(&self) -> Option<&ValidationResult> {
        self.interior_validation.as_ref()
    }

    /// Returns the cover validation verdict, if validated.
    pub fn cover_validation(&self) -> Option<&ValidationResult> {
        self.cover_validation.as_ref()
    }

    /// Returns the provider job id, if submitted.
    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    /// Returns the most recent polled status, if any.
    pub fn last_status(&self) -> Option<JobStatus> {
        self.last_status
    }

    /// Returns the cause of failure, if any.
    pub fn failure_cause(&self) -> Option<&str> {
        self.failure_cause.as_deref()
    }

    /// Returns the stage the attempt failed or was cancelled in.
    pub fn stopped_in(&self) -> Option<Stage> {
        self.stopped_in
    }

    /// Stages this attempt has completed, derived from the artifacts
    /// it has accumulated.
    pub fn completed_stages(&self) -> Vec<Stage> {
        let mut stages = Vec::new();
        if self.interior.is_some() && self.cover.is_some() {
            stages.push(Stage::Staging);
        }
        if self.interior_validation.is_some() && self.cover_validation.is_some() {
            stages.push(Stage::Validating);
        }
        if self.job_id.is_some() {
            stages.push(Stage::Submitting);
        }
        stages
    }
}
