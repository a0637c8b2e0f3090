//! Print provider trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    BookSpecification, ExternalId, FileRole, JobStatus, ShippingLevel, StagedFile,
    ValidationResult, ValidationStatus,
};

use crate::error::PipelineError;

/// Everything the provider needs to open a print job.
#[derive(Debug, Clone)]
pub struct JobSubmission {
    /// The caller's idempotency key.
    pub external_id: ExternalId,
    /// The book being printed.
    pub spec: BookSpecification,
    /// Number of copies.
    pub quantity: u32,
    /// Requested shipping level.
    pub shipping_level: ShippingLevel,
    /// Staged interior artifact.
    pub interior: StagedFile,
    /// Staged cover artifact.
    pub cover: StagedFile,
    /// Order contact email.
    pub contact_email: String,
}

/// Provider-side view of a print job.
#[derive(Debug, Clone)]
pub struct ProviderJob {
    /// Provider-assigned job id.
    pub id: String,
    /// Current provider-reported status.
    pub status: JobStatus,
    /// Carrier tracking URL, once shipped.
    pub tracking_url: Option<String>,
    /// Provider's delivery estimate.
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// Trait for the external print-on-demand provider.
#[async_trait]
pub trait PrintProvider: Send + Sync {
    /// Runs the provider's preflight validation on a staged artifact.
    async fn validate_file(&self, file: &StagedFile) -> Result<ValidationResult, PipelineError>;

    /// Opens a print job for the submission.
    async fn create_print_job(&self, submission: &JobSubmission)
    -> Result<ProviderJob, PipelineError>;

    /// Fetches the current state of a job by provider id.
    async fn get_print_job(&self, job_id: &str) -> Result<ProviderJob, PipelineError>;

    /// Looks a job up by the caller's external id, if the provider
    /// has one recorded.
    async fn find_job_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<ProviderJob>, PipelineError>;

    /// Requests provider-side cancellation of a job.
    async fn cancel_print_job(&self, job_id: &str) -> Result<ProviderJob, PipelineError>;
}

#[derive(Debug, Default)]
struct InMemoryProviderState {
    jobs: HashMap<String, (ExternalId, ProviderJob)>,
    next_id: u32,
    validation_calls: u32,
    /// Scripted verdicts by file role; unset roles validate clean.
    verdicts: HashMap<FileRole, ValidationResult>,
    fail_on_create: bool,
    /// Create the job anyway but report a transport loss to the caller.
    ambiguous_on_create: bool,
}

/// In-memory print provider for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPrintProvider {
    state: Arc<RwLock<InMemoryProviderState>>,
}

impl InMemoryPrintProvider {
    /// Creates a new in-memory print provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the validation verdict for files with the given role.
    pub fn set_verdict(&self, role: FileRole, verdict: ValidationResult) {
        self.state.write().unwrap().verdicts.insert(role, verdict);
    }

    /// Configures the provider to reject the next create call outright.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Configures the provider to create the job but report a
    /// transport loss, leaving the outcome ambiguous to the caller.
    pub fn set_ambiguous_on_create(&self, ambiguous: bool) {
        self.state.write().unwrap().ambiguous_on_create = ambiguous;
    }

    /// Moves a job to the given status, as if production advanced.
    pub fn set_job_status(&self, job_id: &str, status: JobStatus) {
        let mut state = self.state.write().unwrap();
        if let Some((_, job)) = state.jobs.get_mut(job_id) {
            job.status = status;
        }
    }

    /// Sets the tracking URL on a job.
    pub fn set_tracking_url(&self, job_id: &str, url: impl Into<String>) {
        let mut state = self.state.write().unwrap();
        if let Some((_, job)) = state.jobs.get_mut(job_id) {
            job.tracking_url = Some(url.into());
        }
    }

    /// Returns the number of jobs the provider holds.
    pub fn job_count(&self) -> usize {
        self.state.read().unwrap().jobs.len()
    }

    /// Returns how many validation calls were made.
    pub fn validation_calls(&self) -> u32 {
        self.state.read().unwrap().validation_calls
    }

    fn open_job(state: &mut InMemoryProviderState, external_id: &ExternalId) -> ProviderJob {
        state.next_id += 1;
        let job = ProviderJob {
            id: format!("PJ-{:04}", state.next_id),
            status: JobStatus::Created,
            tracking_url: None,
            estimated_delivery: Some(Utc::now() + chrono::Duration::days(7)),
        };
        state
            .jobs
            .insert(job.id.clone(), (external_id.clone(), job.clone()));
        job
    }
}

#[async_trait]
impl PrintProvider for InMemoryPrintProvider {
    async fn validate_file(&self, file: &StagedFile) -> Result<ValidationResult, PipelineError> {
        let mut state = self.state.write().unwrap();
        state.validation_calls += 1;

        Ok(state
            .verdicts
            .get(&file.role)
            .cloned()
            .unwrap_or_else(|| ValidationResult::clean(ValidationStatus::Normalized)))
    }

    async fn create_print_job(
        &self,
        submission: &JobSubmission,
    ) -> Result<ProviderJob, PipelineError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_create {
            return Err(PipelineError::SubmissionFailed {
                reason: "Provider rejected the submission".to_string(),
                ambiguous: false,
            });
        }

        if state.ambiguous_on_create {
            Self::open_job(&mut state, &submission.external_id);
            return Err(PipelineError::SubmissionFailed {
                reason: "Connection reset before the response arrived".to_string(),
                ambiguous: true,
            });
        }

        Ok(Self::open_job(&mut state, &submission.external_id))
    }

    async fn get_print_job(&self, job_id: &str) -> Result<ProviderJob, PipelineError> {
        let state = self.state.read().unwrap();
        state
            .jobs
            .get(job_id)
            .map(|(_, job)| job.clone())
            .ok_or_else(|| PipelineError::Provider(format!("Unknown job '{}'", job_id)))
    }

    async fn find_job_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<ProviderJob>, PipelineError> {
        let state = self.state.read().unwrap();
        Ok(state
            .jobs
            .values()
            .find(|(eid, _)| eid == external_id)
            .map(|(_, job)| job.clone()))
    }

    async fn cancel_print_job(&self, job_id: &str) -> Result<ProviderJob, PipelineError> {
        let mut state = self.state.write().unwrap();
        let (_, job) = state
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| PipelineError::Provider(format!("Unknown job '{}'", job_id)))?;

        // Only jobs still waiting for production can be cancelled.
        if job.status != JobStatus::Created {
            return Err(PipelineError::CancellationRejected { status: job.status });
        }

        job.status = JobStatus::Error;
        Ok(job.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{BindingType, PaperType, TrimSize};

    fn submission(external_id: &str) -> JobSubmission {
        JobSubmission {
            external_id: ExternalId::new(external_id),
            spec: BookSpecification::new(
                TrimSize::US_TRADE,
                BindingType::PerfectBound,
                PaperType::White,
                200,
            )
            .unwrap(),
            quantity: 10,
            shipping_level: ShippingLevel::Ground,
            interior: StagedFile::new("mem://1", 100, FileRole::Interior),
            cover: StagedFile::new("mem://2", 50, FileRole::Cover),
            contact_email: "reader@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let provider = InMemoryPrintProvider::new();

        let job = provider.create_print_job(&submission("order-1")).await.unwrap();
        assert_eq!(job.id, "PJ-0001");
        assert_eq!(job.status, JobStatus::Created);

        let fetched = provider.get_print_job(&job.id).await.unwrap();
        assert_eq!(fetched.id, job.id);
    }

    #[tokio::test]
    async fn test_find_by_external_id() {
        let provider = InMemoryPrintProvider::new();
        provider.create_print_job(&submission("order-1")).await.unwrap();

        let found = provider
            .find_job_by_external_id(&ExternalId::new("order-1"))
            .await
            .unwrap();
        assert!(found.is_some());

        let missing = provider
            .find_job_by_external_id(&ExternalId::new("order-2"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_scripted_verdicts() {
        let provider = InMemoryPrintProvider::new();
        provider.set_verdict(FileRole::Cover, ValidationResult::error("bleed missing"));

        let interior = StagedFile::new("mem://1", 100, FileRole::Interior);
        let cover = StagedFile::new("mem://2", 50, FileRole::Cover);

        let v1 = provider.validate_file(&interior).await.unwrap();
        let v2 = provider.validate_file(&cover).await.unwrap();

        assert!(!v1.blocks_submission());
        assert!(v2.blocks_submission());
        assert_eq!(provider.validation_calls(), 2);
    }

    #[tokio::test]
    async fn test_ambiguous_create_still_opens_job() {
        let provider = InMemoryPrintProvider::new();
        provider.set_ambiguous_on_create(true);

        let result = provider.create_print_job(&submission("order-1")).await;
        assert!(matches!(
            result,
            Err(PipelineError::SubmissionFailed { ambiguous: true, .. })
        ));
        assert_eq!(provider.job_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_only_while_created() {
        let provider = InMemoryPrintProvider::new();
        let job = provider.create_print_job(&submission("order-1")).await.unwrap();

        provider.set_job_status(&job.id, JobStatus::InProduction);
        let result = provider.cancel_print_job(&job.id).await;
        assert!(matches!(
            result,
            Err(PipelineError::CancellationRejected {
                status: JobStatus::InProduction
            })
        ));

        provider.set_job_status(&job.id, JobStatus::Created);
        let cancelled = provider.cancel_print_job(&job.id).await.unwrap();
        assert_eq!(cancelled.status, JobStatus::Error);
    }
}
