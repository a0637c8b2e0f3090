//! Provider-side file validation stage.

use domain::{StagedFile, ValidationResult, ValidationStatus};

use crate::services::PrintProvider;

/// Normalizes provider validation verdicts for the pipeline.
///
/// Transport failures fold into an `Error` verdict with a synthetic
/// diagnostic; they never surface as raw transport errors, so a flaky
/// validation service reads the same as a rejected file.
pub struct ValidationGateway<'a, P: PrintProvider> {
    provider: &'a P,
}

impl<'a, P: PrintProvider> ValidationGateway<'a, P> {
    /// Creates a gateway over the given provider.
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Validates a single staged artifact.
    ///
    /// A verdict that is still pending blocks submission downstream;
    /// it gets a diagnostic here so the failure names the file.
    pub async fn validate(&self, file: &StagedFile) -> ValidationResult {
        match self.provider.validate_file(file).await {
            Ok(mut result) => {
                if result.status == ValidationStatus::Pending && result.messages.is_empty() {
                    result
                        .messages
                        .push(format!("{} validation did not settle", file.role));
                }
                result
            }
            Err(e) => ValidationResult::error(format!("{} validation unavailable: {}", file.role, e)),
        }
    }

    /// Validates interior and cover concurrently.
    #[tracing::instrument(skip_all, fields(interior = %interior.url, cover = %cover.url))]
    pub async fn validate_pair(
        &self,
        interior: &StagedFile,
        cover: &StagedFile,
    ) -> (ValidationResult, ValidationResult) {
        tokio::join!(self.validate(interior), self.validate(cover))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::services::{InMemoryPrintProvider, JobSubmission, ProviderJob};
    use async_trait::async_trait;
    use domain::{ExternalId, FileRole, ValidationStatus};

    struct UnreachableProvider;

    #[async_trait]
    impl PrintProvider for UnreachableProvider {
        async fn validate_file(
            &self,
            _file: &StagedFile,
        ) -> Result<ValidationResult, PipelineError> {
            Err(PipelineError::Provider("connection refused".to_string()))
        }

        async fn create_print_job(
            &self,
            _submission: &JobSubmission,
        ) -> Result<ProviderJob, PipelineError> {
            Err(PipelineError::Provider("connection refused".to_string()))
        }

        async fn get_print_job(&self, _job_id: &str) -> Result<ProviderJob, PipelineError> {
            Err(PipelineError::Provider("connection refused".to_string()))
        }

        async fn find_job_by_external_id(
            &self,
            _external_id: &ExternalId,
        ) -> Result<Option<ProviderJob>, PipelineError> {
            Err(PipelineError::Provider("connection refused".to_string()))
        }

        async fn cancel_print_job(&self, _job_id: &str) -> Result<ProviderJob, PipelineError> {
            Err(PipelineError::Provider("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_clean_pair() {
        let provider = InMemoryPrintProvider::new();
        let gateway = ValidationGateway::new(&provider);

        let interior = StagedFile::new("mem://1", 100, FileRole::Interior);
        let cover = StagedFile::new("mem://2", 50, FileRole::Cover);

        let (vi, vc) = gateway.validate_pair(&interior, &cover).await;
        assert_eq!(vi.status, ValidationStatus::Normalized);
        assert_eq!(vc.status, ValidationStatus::Normalized);
        assert_eq!(provider.validation_calls(), 2);
    }

    #[tokio::test]
    async fn test_scripted_error_passes_through() {
        let provider = InMemoryPrintProvider::new();
        provider.set_verdict(FileRole::Cover, ValidationResult::error("trim mismatch"));
        let gateway = ValidationGateway::new(&provider);

        let cover = StagedFile::new("mem://2", 50, FileRole::Cover);
        let verdict = gateway.validate(&cover).await;

        assert!(verdict.blocks_submission());
        assert_eq!(verdict.messages, vec!["trim mismatch".to_string()]);
    }

    #[tokio::test]
    async fn test_pending_verdict_blocks_and_carries_a_diagnostic() {
        let provider = InMemoryPrintProvider::new();
        provider.set_verdict(
            FileRole::Interior,
            ValidationResult::clean(ValidationStatus::Pending),
        );
        let gateway = ValidationGateway::new(&provider);

        let interior = StagedFile::new("mem://1", 100, FileRole::Interior);
        let verdict = gateway.validate(&interior).await;

        assert!(verdict.blocks_submission());
        assert_eq!(
            verdict.messages,
            vec!["interior validation did not settle".to_string()]
        );
    }

    #[tokio::test]
    async fn test_transport_failure_folds_into_error_verdict() {
        let gateway = ValidationGateway::new(&UnreachableProvider);

        let interior = StagedFile::new("mem://1", 100, FileRole::Interior);
        let verdict = gateway.validate(&interior).await;

        assert_eq!(verdict.status, ValidationStatus::Error);
        assert!(verdict.messages[0].contains("validation unavailable"));
        assert!(verdict.messages[0].contains("connection refused"));
    }
}
