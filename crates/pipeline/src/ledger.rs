//! Job ledger keyed by external id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use domain::{ExternalId, JobStatus, PrintJob};

/// Shared record of submitted jobs, keyed by the caller's external id.
///
/// Recording a job here is the pipeline's durability point; a repeat
/// submission with a recorded external id returns the existing job
/// instead of opening a second one. Submissions for the same external
/// id serialize through [`JobLedger::lock_submission`] so two
/// concurrent attempts cannot both reach the provider before either
/// has recorded.
#[derive(Debug, Clone, Default)]
pub struct JobLedger {
    jobs: Arc<RwLock<HashMap<ExternalId, PrintJob>>>,
    submissions: Arc<Mutex<HashMap<ExternalId, Arc<tokio::sync::Mutex<()>>>>>,
}

impl JobLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the job recorded under the external id, if any.
    pub fn get(&self, external_id: &ExternalId) -> Option<PrintJob> {
        self.read().get(external_id).cloned()
    }

    /// Records (or replaces) the job under its external id.
    pub fn record(&self, job: PrintJob) {
        self.write().insert(job.external_id.clone(), job);
    }

    /// Takes the per-external-id submission lock. Held across the
    /// whole submission attempt, it makes a concurrent duplicate wait
    /// until the first attempt has recorded its job, after which the
    /// duplicate takes the idempotent path.
    pub async fn lock_submission(&self, external_id: &ExternalId) -> tokio::sync::OwnedMutexGuard<()> {
        let slot = {
            let mut slots = match self.submissions.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            slots.entry(external_id.clone()).or_default().clone()
        };
        slot.lock_owned().await
    }

    /// Merges a polled observation into the recorded job under the
    /// write lock, keeping status progression monotonic even when
    /// polls land out of order. Returns the job as now recorded, or
    /// `None` when the external id is unknown.
    pub fn apply_observation(
        &self,
        external_id: &ExternalId,
        observed: JobStatus,
        tracking_url: Option<String>,
        estimated_delivery: Option<DateTime<Utc>>,
    ) -> Option<PrintJob> {
        let mut jobs = self.write();
        let job = jobs.get_mut(external_id)?;
        job.observe_status(observed);
        if let Some(url) = tracking_url {
            job.tracking_url = Some(url);
        }
        if let Some(eta) = estimated_delivery {
            job.estimated_delivery = Some(eta);
        }
        Some(job.clone())
    }

    /// Returns the number of recorded jobs.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if no jobs are recorded.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Returns all recorded jobs.
    pub fn all(&self) -> Vec<PrintJob> {
        self.read().values().cloned().collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<ExternalId, PrintJob>> {
        match self.jobs.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<ExternalId, PrintJob>> {
        match self.jobs.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
