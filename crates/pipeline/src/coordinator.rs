//! Order pipeline coordinator.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use common::AttemptId;
use domain::{
    BookSpecification, CostCalculation, CostEngine, ExternalId, JobStatus, PrintJob, ShippingLevel,
};
use tokio::sync::watch;

use crate::attempt::PipelineAttempt;
use crate::error::PipelineError;
use crate::events::AttemptEvent;
use crate::gateway::ValidationGateway;
use crate::ledger::JobLedger;
use crate::services::licensing::{BULK_ORDER_THRESHOLD, FEATURE_BULK_ORDERS, FEATURE_EXPRESS_SHIPPING};
use crate::services::{JobSubmission, LicenseGate, ObjectStorage, PrintProvider};
use crate::stager::FileStager;
use crate::state::Stage;

/// Everything a caller supplies to open an order.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    /// The book being printed.
    pub spec: BookSpecification,
    /// Number of copies.
    pub quantity: u32,
    /// Requested shipping level.
    pub shipping_level: ShippingLevel,
    /// Interior artifact bytes.
    pub interior: Vec<u8>,
    /// Cover artifact bytes.
    pub cover: Vec<u8>,
    /// Order contact email.
    pub contact_email: String,
    /// Caller-chosen idempotency key.
    pub external_id: ExternalId,
}

/// Cancellation input and progress output for one attempt.
///
/// Progress is published at every stage transition; the cancel signal
/// is honored at each stage boundary until the job is submitted.
pub struct AttemptControls {
    cancel: watch::Receiver<bool>,
    progress: watch::Sender<Stage>,
}

impl AttemptControls {
    /// Controls with no external observer and no cancel path.
    pub fn detached() -> Self {
        let (_, cancel) = watch::channel(false);
        let (progress, _) = watch::channel(Stage::Idle);
        Self { cancel, progress }
    }

    /// Controls paired with a monitor handle for the caller.
    pub fn monitored() -> (Self, AttemptMonitor) {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (progress_tx, progress_rx) = watch::channel(Stage::Idle);
        (
            Self {
                cancel: cancel_rx,
                progress: progress_tx,
            },
            AttemptMonitor {
                cancel: cancel_tx,
                progress: progress_rx,
            },
        )
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    fn publish(&self, stage: Stage) {
        self.progress.send_replace(stage);
    }
}

impl Default for AttemptControls {
    fn default() -> Self {
        Self::detached()
    }
}

/// Caller-side handle for observing and cancelling an attempt.
pub struct AttemptMonitor {
    cancel: watch::Sender<bool>,
    progress: watch::Receiver<Stage>,
}

impl AttemptMonitor {
    /// Requests cancellation; honored at the next stage boundary
    /// before submission.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Returns the most recently published stage.
    pub fn stage(&self) -> Stage {
        *self.progress.borrow()
    }

    /// Waits for the next stage transition; `None` once the attempt
    /// is gone.
    pub async fn changed(&mut self) -> Option<Stage> {
        match self.progress.changed().await {
            Ok(()) => Some(*self.progress.borrow()),
            Err(_) => None,
        }
    }
}

/// Drives order attempts through staging, validation, and submission,
/// then serves status refreshes against the job ledger.
///
/// Attempts share nothing mutable except the ledger; within one
/// attempt the two uploads run concurrently, then the two
/// validations, then the single submission.
pub struct OrderPipeline<S, P, L>
where
    S: ObjectStorage,
    P: PrintProvider,
    L: LicenseGate,
{
    engine: CostEngine,
    stager: FileStager<S>,
    provider: P,
    license: L,
    ledger: JobLedger,
    attempts: Arc<RwLock<HashMap<ExternalId, PipelineAttempt>>>,
}

impl<S, P, L> OrderPipeline<S, P, L>
where
    S: ObjectStorage,
    P: PrintProvider,
    L: LicenseGate,
{
    /// Creates a pipeline with the default pricing configuration.
    pub fn new(storage: S, provider: P, license: L) -> Self {
        Self {
            engine: CostEngine::default(),
            stager: FileStager::new(storage),
            provider,
            license,
            ledger: JobLedger::new(),
            attempts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Replaces the cost engine.
    pub fn with_engine(mut self, engine: CostEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Returns the job ledger.
    pub fn ledger(&self) -> &JobLedger {
        &self.ledger
    }

    /// Returns the latest attempt record for an external id, covering
    /// the whole lifecycle from staging through polling.
    pub fn attempt(&self, external_id: &ExternalId) -> Option<PipelineAttempt> {
        match self.attempts.read() {
            Ok(guard) => guard.get(external_id).cloned(),
            Err(poisoned) => poisoned.into_inner().get(external_id).cloned(),
        }
    }

    fn remember(&self, attempt: &PipelineAttempt) {
        let Some(external_id) = attempt.external_id() else {
            return;
        };
        let mut guard = match self.attempts.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.insert(external_id.clone(), attempt.clone());
    }

    /// Prices an order without starting an attempt.
    pub fn quote(
        &self,
        spec: &BookSpecification,
        quantity: u32,
        shipping_level: ShippingLevel,
    ) -> Result<CostCalculation, PipelineError> {
        Ok(self.engine.calculate(spec, quantity, shipping_level)?)
    }

    /// Submits an order with detached controls.
    pub async fn submit_order(&self, request: OrderRequest) -> Result<PrintJob, PipelineError> {
        self.submit_order_with_controls(request, AttemptControls::detached())
            .await
    }

    /// Submits an order, honoring the cancel signal at stage
    /// boundaries and publishing progress at every transition.
    #[tracing::instrument(
        skip(self, request, controls),
        fields(external_id = %request.external_id, quantity = request.quantity)
    )]
    pub async fn submit_order_with_controls(
        &self,
        request: OrderRequest,
        controls: AttemptControls,
    ) -> Result<PrintJob, PipelineError> {
        metrics::counter!("pipeline_attempts_total").increment(1);
        let attempt_start = std::time::Instant::now();

        // One in-flight attempt per external id; a concurrent
        // duplicate waits here until the first attempt has recorded,
        // then takes the idempotent path below.
        let _submission = self.ledger.lock_submission(&request.external_id).await;

        // Idempotency: a recorded external id returns the existing
        // job, never a duplicate.
        if let Some(existing) = self.ledger.get(&request.external_id) {
            metrics::counter!("pipeline_idempotent_replays").increment(1);
            tracing::info!(job_id = %existing.id, "external id already recorded, returning existing job");
            return Ok(existing);
        }

        // Price (and thereby confirm) the order at entry.
        let cost = self
            .engine
            .calculate(&request.spec, request.quantity, request.shipping_level)?;

        // License gating fails fast, before any upload.
        self.check_license(&request).await?;

        let mut attempt = PipelineAttempt::default();
        attempt.apply(AttemptEvent::attempt_started(
            AttemptId::new(),
            request.external_id.clone(),
        ));
        controls.publish(attempt.stage());

        // Staging
        self.enter_stage(&mut attempt, &controls, Stage::Staging)?;
        let (interior, cover) = match self
            .stager
            .stage_pair(&request.interior, &request.cover)
            .await
        {
            Ok(pair) => pair,
            Err(e) => return Err(self.fail_stage(&mut attempt, &controls, Stage::Staging, e)),
        };
        attempt.apply(AttemptEvent::files_staged(interior.clone(), cover.clone()));

        // Validation
        self.enter_stage(&mut attempt, &controls, Stage::Validating)?;
        let gateway = ValidationGateway::new(&self.provider);
        let (interior_verdict, cover_verdict) = gateway.validate_pair(&interior, &cover).await;
        attempt.apply(AttemptEvent::files_validated(
            interior_verdict.clone(),
            cover_verdict.clone(),
        ));

        if interior_verdict.blocks_submission() || cover_verdict.blocks_submission() {
            let mut messages = interior_verdict.messages;
            messages.extend(cover_verdict.messages);
            let e = PipelineError::ValidationFailed { messages };
            return Err(self.fail_stage(&mut attempt, &controls, Stage::Validating, e));
        }

        // Submission
        self.enter_stage(&mut attempt, &controls, Stage::Submitting)?;
        let submission = JobSubmission {
            external_id: request.external_id.clone(),
            spec: request.spec.clone(),
            quantity: request.quantity,
            shipping_level: request.shipping_level,
            interior,
            cover,
            contact_email: request.contact_email.clone(),
        };

        let provider_job = match self.provider.create_print_job(&submission).await {
            Ok(job) => job,
            Err(PipelineError::SubmissionFailed {
                reason,
                ambiguous: true,
            }) => {
                // The provider may have opened the job before the
                // transport loss; reconcile by external id before
                // reporting anything retriable.
                match self
                    .provider
                    .find_job_by_external_id(&request.external_id)
                    .await
                {
                    Ok(Some(job)) => {
                        tracing::info!(job_id = %job.id, "ambiguous submission reconciled to existing job");
                        job
                    }
                    Ok(None) => {
                        let e = PipelineError::SubmissionFailed {
                            reason,
                            ambiguous: false,
                        };
                        return Err(self.fail_stage(&mut attempt, &controls, Stage::Submitting, e));
                    }
                    Err(_) => {
                        let e = PipelineError::SubmissionFailed {
                            reason,
                            ambiguous: true,
                        };
                        return Err(self.fail_stage(&mut attempt, &controls, Stage::Submitting, e));
                    }
                }
            }
            Err(e) => return Err(self.fail_stage(&mut attempt, &controls, Stage::Submitting, e)),
        };

        attempt.apply(AttemptEvent::job_submitted(provider_job.id.clone()));
        controls.publish(attempt.stage());

        // Durability point: the job is now recorded under its
        // external id.
        let job = PrintJob {
            id: provider_job.id,
            external_id: request.external_id,
            status: provider_job.status,
            tracking_url: provider_job.tracking_url,
            estimated_delivery: provider_job.estimated_delivery,
            created_at: Utc::now(),
            cost,
            contact_email: request.contact_email,
        };
        self.ledger.record(job.clone());
        self.remember(&attempt);

        let duration = attempt_start.elapsed().as_secs_f64();
        metrics::histogram!("pipeline_attempt_duration_seconds").record(duration);
        metrics::counter!("print_jobs_submitted").increment(1);
        tracing::info!(job_id = %job.id, duration, "order submitted");

        Ok(job)
    }

    /// Refreshes a job's status from the provider, merging
    /// monotonically; the stored status never moves backward.
    #[tracing::instrument(skip(self), fields(external_id = %external_id))]
    pub async fn poll_status(&self, external_id: &ExternalId) -> Result<PrintJob, PipelineError> {
        let mut job = self
            .ledger
            .get(external_id)
            .ok_or_else(|| PipelineError::JobNotFound(external_id.clone()))?;

        if job.is_terminal() {
            return Ok(job);
        }

        let observed = self.provider.get_print_job(&job.id).await?;
        // The merge happens inside the ledger's write lock so a slow
        // poll racing a fresh one cannot reinstate a stale status.
        job = self
            .ledger
            .apply_observation(
                external_id,
                observed.status,
                observed.tracking_url,
                observed.estimated_delivery,
            )
            .ok_or_else(|| PipelineError::JobNotFound(external_id.clone()))?;

        if let Some(mut attempt) = self.attempt(external_id) {
            attempt.apply(AttemptEvent::status_observed(job.status));
            if job.status == JobStatus::Delivered {
                attempt.apply(AttemptEvent::attempt_completed());
            }
            self.remember(&attempt);
        }

        metrics::counter!("job_status_polls").increment(1);
        tracing::debug!(job_id = %job.id, status = %job.status, "job status refreshed");
        Ok(job)
    }

    /// Requests provider-side cancellation of a submitted job.
    ///
    /// Once a job id exists there is no local cancellation; the
    /// provider decides, and its answer (including a refusal for jobs
    /// already in production) is surfaced as-is.
    #[tracing::instrument(skip(self), fields(external_id = %external_id))]
    pub async fn cancel_job(&self, external_id: &ExternalId) -> Result<PrintJob, PipelineError> {
        let mut job = self
            .ledger
            .get(external_id)
            .ok_or_else(|| PipelineError::JobNotFound(external_id.clone()))?;

        if job.is_terminal() {
            return Err(PipelineError::CancellationRejected { status: job.status });
        }

        let observed = self.provider.cancel_print_job(&job.id).await?;
        job = self
            .ledger
            .apply_observation(external_id, observed.status, None, None)
            .ok_or_else(|| PipelineError::JobNotFound(external_id.clone()))?;

        metrics::counter!("print_jobs_cancelled").increment(1);
        tracing::info!(job_id = %job.id, "job cancelled at the provider");
        Ok(job)
    }

    async fn check_license(&self, request: &OrderRequest) -> Result<(), PipelineError> {
        if request.shipping_level == ShippingLevel::Express
            && !self.license.has_feature(FEATURE_EXPRESS_SHIPPING).await?
        {
            return Err(PipelineError::FeatureNotLicensed {
                feature: FEATURE_EXPRESS_SHIPPING.to_string(),
            });
        }

        if request.quantity >= BULK_ORDER_THRESHOLD
            && !self.license.has_feature(FEATURE_BULK_ORDERS).await?
        {
            return Err(PipelineError::FeatureNotLicensed {
                feature: FEATURE_BULK_ORDERS.to_string(),
            });
        }

        Ok(())
    }

    fn enter_stage(
        &self,
        attempt: &mut PipelineAttempt,
        controls: &AttemptControls,
        stage: Stage,
    ) -> Result<(), PipelineError> {
        if controls.is_cancelled() {
            let at = attempt.stage();
            attempt.apply(AttemptEvent::attempt_cancelled(at));
            controls.publish(attempt.stage());
            self.remember(attempt);
            metrics::counter!("pipeline_attempts_cancelled").increment(1);
            tracing::info!(stage = %at, "attempt cancelled");
            return Err(PipelineError::Cancelled { stage: at });
        }

        tracing::info!(stage = %stage, "stage entered");
        attempt.apply(AttemptEvent::stage_entered(stage));
        controls.publish(stage);
        Ok(())
    }

    fn fail_stage(
        &self,
        attempt: &mut PipelineAttempt,
        controls: &AttemptControls,
        stage: Stage,
        error: PipelineError,
    ) -> PipelineError {
        attempt.apply(AttemptEvent::stage_failed(stage, error.to_string()));
        controls.publish(attempt.stage());
        self.remember(attempt);
        metrics::counter!("pipeline_attempts_failed").increment(1);
        tracing::warn!(stage = %stage, error = %error, "attempt failed");
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{InMemoryLicenseGate, InMemoryObjectStorage, InMemoryPrintProvider};
    use domain::{
        BindingType, FileRole, PaperType, TrimSize, ValidationResult, ValidationStatus,
    };

    fn setup() -> (
        OrderPipeline<InMemoryObjectStorage, InMemoryPrintProvider, InMemoryLicenseGate>,
        InMemoryObjectStorage,
        InMemoryPrintProvider,
        InMemoryLicenseGate,
    ) {
        let storage = InMemoryObjectStorage::new();
        let provider = InMemoryPrintProvider::new();
        let license = InMemoryLicenseGate::allowing_all();

        let pipeline = OrderPipeline::new(storage.clone(), provider.clone(), license.clone());
        (pipeline, storage, provider, license)
    }

    fn request(external_id: &str) -> OrderRequest {
        let spec = BookSpecification::new(
            TrimSize::US_TRADE,
            BindingType::PerfectBound,
            PaperType::White,
            200,
        )
        .unwrap();

        OrderRequest {
            spec,
            quantity: 100,
            shipping_level: ShippingLevel::Ground,
            interior: b"interior pdf bytes".to_vec(),
            cover: b"cover pdf bytes".to_vec(),
            contact_email: "reader@example.com".to_string(),
            external_id: ExternalId::new(external_id),
        }
    }

    #[tokio::test]
    async fn test_happy_path() {
        let (pipeline, storage, provider, _) = setup();

        let job = pipeline.submit_order(request("order-1")).await.unwrap();

        assert_eq!(job.status, JobStatus::Created);
        assert_eq!(job.external_id, ExternalId::new("order-1"));
        assert!(job.cost.is_consistent());

        assert_eq!(storage.object_count(), 2);
        assert_eq!(provider.validation_calls(), 2);
        assert_eq!(provider.job_count(), 1);
        assert_eq!(pipeline.ledger().len(), 1);
    }

    #[tokio::test]
    async fn test_staging_failure_prevents_validation_and_submission() {
        let (pipeline, storage, provider, _) = setup();
        storage.set_fail_on_upload(true);

        let result = pipeline.submit_order(request("order-1")).await;

        assert!(matches!(result, Err(PipelineError::UploadFailed { .. })));
        assert_eq!(storage.object_count(), 0);
        assert_eq!(provider.validation_calls(), 0);
        assert_eq!(provider.job_count(), 0);
        assert!(pipeline.ledger().is_empty());
    }

    #[tokio::test]
    async fn test_cover_validation_error_blocks_submission() {
        let (pipeline, _, provider, _) = setup();
        provider.set_verdict(FileRole::Cover, ValidationResult::error("cover bleed missing"));

        let result = pipeline.submit_order(request("order-1")).await;

        match result {
            Err(PipelineError::ValidationFailed { messages }) => {
                assert_eq!(messages, vec!["cover bleed missing".to_string()]);
            }
            other => panic!("Expected ValidationFailed, got {:?}", other.map(|_| ())),
        }
        assert_eq!(provider.job_count(), 0);
        assert!(pipeline.ledger().is_empty());
    }

    #[tokio::test]
    async fn test_pending_verdicts_block_submission() {
        let (pipeline, _, provider, _) = setup();
        provider.set_verdict(
            FileRole::Interior,
            ValidationResult::clean(ValidationStatus::Pending),
        );
        provider.set_verdict(
            FileRole::Cover,
            ValidationResult::clean(ValidationStatus::Pending),
        );

        let result = pipeline.submit_order(request("order-1")).await;

        match result {
            Err(PipelineError::ValidationFailed { messages }) => {
                assert_eq!(messages.len(), 2);
                assert!(messages.iter().all(|m| m.contains("did not settle")));
            }
            other => panic!("Expected ValidationFailed, got {:?}", other.map(|_| ())),
        }
        assert_eq!(provider.job_count(), 0);
        assert!(pipeline.ledger().is_empty());
    }

    #[tokio::test]
    async fn test_same_external_id_returns_existing_job() {
        let (pipeline, _, provider, _) = setup();

        let first = pipeline.submit_order(request("order-1")).await.unwrap();
        let second = pipeline.submit_order(request("order-1")).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(provider.job_count(), 1);
        assert_eq!(pipeline.ledger().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_same_external_id_creates_one_job() {
        let (pipeline, storage, provider, _) = setup();
        // Hold each attempt in staging long enough for the two
        // submissions to overlap.
        storage.set_upload_delay(std::time::Duration::from_millis(50));
        let pipeline = Arc::new(pipeline);

        let first = tokio::spawn({
            let pipeline = Arc::clone(&pipeline);
            async move { pipeline.submit_order(request("order-dup")).await }
        });
        let second = tokio::spawn({
            let pipeline = Arc::clone(&pipeline);
            async move { pipeline.submit_order(request("order-dup")).await }
        });

        let a = first.await.unwrap().unwrap();
        let b = second.await.unwrap().unwrap();

        assert_eq!(a.id, b.id);
        assert_eq!(provider.job_count(), 1);
        assert_eq!(pipeline.ledger().len(), 1);
    }

    #[tokio::test]
    async fn test_ambiguous_submission_reconciles_to_provider_job() {
        let (pipeline, _, provider, _) = setup();
        provider.set_ambiguous_on_create(true);

        let job = pipeline.submit_order(request("order-1")).await.unwrap();

        // The job the provider quietly opened is the one recorded.
        let provider_side = provider
            .find_job_by_external_id(&ExternalId::new("order-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(job.id, provider_side.id);
        assert_eq!(provider.job_count(), 1);
        assert_eq!(pipeline.ledger().len(), 1);
    }

    #[tokio::test]
    async fn test_plain_submission_failure_is_retriable() {
        let (pipeline, _, provider, _) = setup();
        provider.set_fail_on_create(true);

        let result = pipeline.submit_order(request("order-1")).await;

        match result {
            Err(e @ PipelineError::SubmissionFailed { .. }) => {
                assert!(e.retry_with_same_external_id());
            }
            other => panic!("Expected SubmissionFailed, got {:?}", other.map(|_| ())),
        }
        assert!(pipeline.ledger().is_empty());
    }

    #[tokio::test]
    async fn test_express_shipping_requires_license() {
        let storage = InMemoryObjectStorage::new();
        let provider = InMemoryPrintProvider::new();
        let license = InMemoryLicenseGate::new();
        let pipeline = OrderPipeline::new(storage.clone(), provider, license);

        let mut req = request("order-1");
        req.shipping_level = ShippingLevel::Express;

        let result = pipeline.submit_order(req).await;

        match result {
            Err(PipelineError::FeatureNotLicensed { feature }) => {
                assert_eq!(feature, FEATURE_EXPRESS_SHIPPING);
            }
            other => panic!("Expected FeatureNotLicensed, got {:?}", other.map(|_| ())),
        }
        // Gating happens before any upload.
        assert_eq!(storage.object_count(), 0);
    }

    #[tokio::test]
    async fn test_bulk_quantity_requires_license() {
        let storage = InMemoryObjectStorage::new();
        let provider = InMemoryPrintProvider::new();
        let license = InMemoryLicenseGate::with_features([FEATURE_EXPRESS_SHIPPING]);
        let pipeline = OrderPipeline::new(storage, provider, license);

        let mut req = request("order-1");
        req.quantity = BULK_ORDER_THRESHOLD;

        let result = pipeline.submit_order(req).await;
        match result {
            Err(PipelineError::FeatureNotLicensed { feature }) => {
                assert_eq!(feature, FEATURE_BULK_ORDERS);
            }
            other => panic!("Expected FeatureNotLicensed, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_invalid_quantity_rejected_at_entry() {
        let (pipeline, storage, _, _) = setup();

        let mut req = request("order-1");
        req.quantity = 0;

        let result = pipeline.submit_order(req).await;
        assert!(matches!(
            result,
            Err(PipelineError::InvalidSpecification(_))
        ));
        assert_eq!(storage.object_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_signal_honored_before_any_work() {
        let (pipeline, storage, provider, _) = setup();

        let (controls, monitor) = AttemptControls::monitored();
        monitor.cancel();

        let result = pipeline
            .submit_order_with_controls(request("order-1"), controls)
            .await;

        assert!(matches!(
            result,
            Err(PipelineError::Cancelled { stage: Stage::Idle })
        ));
        assert_eq!(storage.object_count(), 0);
        assert_eq!(provider.job_count(), 0);
        assert!(pipeline.ledger().is_empty());
    }

    #[tokio::test]
    async fn test_progress_published_through_submitted() {
        let (pipeline, _, _, _) = setup();

        let (controls, monitor) = AttemptControls::monitored();
        pipeline
            .submit_order_with_controls(request("order-1"), controls)
            .await
            .unwrap();

        assert_eq!(monitor.stage(), Stage::Submitted);
    }

    #[tokio::test]
    async fn test_poll_status_never_regresses() {
        let (pipeline, _, provider, _) = setup();

        let job = pipeline.submit_order(request("order-1")).await.unwrap();
        let external_id = ExternalId::new("order-1");

        provider.set_job_status(&job.id, JobStatus::InProduction);
        let polled = pipeline.poll_status(&external_id).await.unwrap();
        assert_eq!(polled.status, JobStatus::InProduction);

        // Provider reports an earlier status; the stored one stays.
        provider.set_job_status(&job.id, JobStatus::Created);
        let polled = pipeline.poll_status(&external_id).await.unwrap();
        assert_eq!(polled.status, JobStatus::InProduction);
    }

    #[tokio::test]
    async fn test_poll_picks_up_tracking_url() {
        let (pipeline, _, provider, _) = setup();

        let job = pipeline.submit_order(request("order-1")).await.unwrap();
        provider.set_job_status(&job.id, JobStatus::Shipped);
        provider.set_tracking_url(&job.id, "https://track.example.com/123");

        let polled = pipeline.poll_status(&ExternalId::new("order-1")).await.unwrap();
        assert_eq!(polled.status, JobStatus::Shipped);
        assert_eq!(
            polled.tracking_url.as_deref(),
            Some("https://track.example.com/123")
        );
    }

    #[tokio::test]
    async fn test_attempt_record_follows_polling_to_completion() {
        let (pipeline, _, provider, _) = setup();
        let external_id = ExternalId::new("order-1");

        let job = pipeline.submit_order(request("order-1")).await.unwrap();
        let attempt = pipeline.attempt(&external_id).unwrap();
        assert_eq!(attempt.stage(), Stage::Submitted);
        assert_eq!(attempt.job_id(), Some(job.id.as_str()));

        provider.set_job_status(&job.id, JobStatus::InProduction);
        pipeline.poll_status(&external_id).await.unwrap();
        let attempt = pipeline.attempt(&external_id).unwrap();
        assert_eq!(attempt.stage(), Stage::Polling);
        assert_eq!(attempt.last_status(), Some(JobStatus::InProduction));

        provider.set_job_status(&job.id, JobStatus::Delivered);
        pipeline.poll_status(&external_id).await.unwrap();
        let attempt = pipeline.attempt(&external_id).unwrap();
        assert_eq!(attempt.stage(), Stage::Completed);
        assert_eq!(attempt.last_status(), Some(JobStatus::Delivered));
    }

    #[tokio::test]
    async fn test_failed_attempt_is_queryable() {
        let (pipeline, _, provider, _) = setup();
        provider.set_verdict(FileRole::Cover, ValidationResult::error("cover bleed missing"));

        pipeline.submit_order(request("order-1")).await.unwrap_err();

        let attempt = pipeline.attempt(&ExternalId::new("order-1")).unwrap();
        assert_eq!(attempt.stage(), Stage::Failed);
        assert_eq!(attempt.stopped_in(), Some(Stage::Validating));
        assert!(attempt.failure_cause().unwrap().contains("cover bleed missing"));
    }

    #[tokio::test]
    async fn test_poll_unknown_external_id() {
        let (pipeline, _, _, _) = setup();

        let result = pipeline.poll_status(&ExternalId::new("missing")).await;
        assert!(matches!(result, Err(PipelineError::JobNotFound(_))));
    }

    #[tokio::test]
    async fn test_terminal_job_polls_without_provider_call() {
        let (pipeline, _, provider, _) = setup();

        let job = pipeline.submit_order(request("order-1")).await.unwrap();
        provider.set_job_status(&job.id, JobStatus::Delivered);
        pipeline.poll_status(&ExternalId::new("order-1")).await.unwrap();

        // Later provider movement is irrelevant once terminal.
        provider.set_job_status(&job.id, JobStatus::Error);
        let polled = pipeline.poll_status(&ExternalId::new("order-1")).await.unwrap();
        assert_eq!(polled.status, JobStatus::Delivered);
    }

    #[tokio::test]
    async fn test_cancel_job_while_created() {
        let (pipeline, _, _, _) = setup();

        pipeline.submit_order(request("order-1")).await.unwrap();
        let cancelled = pipeline.cancel_job(&ExternalId::new("order-1")).await.unwrap();

        assert_eq!(cancelled.status, JobStatus::Error);
        assert!(cancelled.is_terminal());
    }

    #[tokio::test]
    async fn test_cancel_job_in_production_is_rejected() {
        let (pipeline, _, provider, _) = setup();

        let job = pipeline.submit_order(request("order-1")).await.unwrap();
        provider.set_job_status(&job.id, JobStatus::InProduction);
        pipeline.poll_status(&ExternalId::new("order-1")).await.unwrap();

        let result = pipeline.cancel_job(&ExternalId::new("order-1")).await;
        assert!(matches!(
            result,
            Err(PipelineError::CancellationRejected {
                status: JobStatus::InProduction
            })
        ));
    }

    #[tokio::test]
    async fn test_quote_matches_engine() {
        let (pipeline, _, _, _) = setup();
        let req = request("order-1");

        let quote = pipeline
            .quote(&req.spec, req.quantity, req.shipping_level)
            .unwrap();
        let direct = CostEngine::default()
            .calculate(&req.spec, req.quantity, req.shipping_level)
            .unwrap();

        assert_eq!(quote.total, direct.total);
        assert!(quote.is_consistent());
    }
}
