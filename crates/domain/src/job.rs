//! Print job record and its status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cost::CostCalculation;

/// Caller-chosen idempotency key for a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(String);

impl ExternalId {
    /// Creates a new external ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the external ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ExternalId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ExternalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ExternalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The provider-reported lifecycle status of a print job.
///
/// Forward transitions:
/// ```text
/// Created ──► InProduction ──► Shipped ──► Delivered
///    │              │             │
///    └──────────────┴─────────────┴──► Error
/// ```
///
/// Locally the status only ever advances: if the provider reports an
/// earlier status than one already observed, the stored status keeps
/// the most-advanced value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted by the provider, not yet printing.
    #[default]
    Created,

    /// Printing in progress.
    InProduction,

    /// Handed to the carrier.
    Shipped,

    /// Delivered (terminal state).
    Delivered,

    /// Provider-side failure (terminal state).
    Error,
}

impl JobStatus {
    /// Position in the forward progression; used for the monotonic
    /// merge.
    fn rank(&self) -> u8 {
        match self {
            JobStatus::Created => 0,
            JobStatus::InProduction => 1,
            JobStatus::Shipped => 2,
            JobStatus::Delivered => 3,
            JobStatus::Error => 4,
        }
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Delivered | JobStatus::Error)
    }

    /// Merges a newly observed status, never moving backward.
    ///
    /// `Error` absorbs any non-terminal status; a terminal status is
    /// never left.
    pub fn advance(self, observed: JobStatus) -> JobStatus {
        if self.is_terminal() {
            return self;
        }
        if observed == JobStatus::Error {
            return JobStatus::Error;
        }
        if observed.rank() > self.rank() {
            observed
        } else {
            self
        }
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Created => "created",
            JobStatus::InProduction => "in_production",
            JobStatus::Shipped => "shipped",
            JobStatus::Delivered => "delivered",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The durable record of a successfully submitted order.
///
/// Created exactly once, when the provider accepts the submission and
/// returns an id. Status is refreshed by polling; the cost snapshot
/// never changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintJob {
    /// Provider-assigned job id.
    pub id: String,
    /// The caller's idempotency key.
    pub external_id: ExternalId,
    /// Most-advanced status observed so far.
    pub status: JobStatus,
    /// Carrier tracking URL, once shipped.
    pub tracking_url: Option<String>,
    /// Provider's delivery estimate.
    pub estimated_delivery: Option<DateTime<Utc>>,
    /// When the provider created the job.
    pub created_at: DateTime<Utc>,
    /// Cost snapshot attached at submission time.
    pub cost: CostCalculation,
    /// Order contact email.
    pub contact_email: String,
}

impl PrintJob {
    /// Applies a polled status observation, keeping progression
    /// monotonic. Returns the status now stored.
    pub fn observe_status(&mut self, observed: JobStatus) -> JobStatus {
        self.status = self.status.advance(observed);
        self.status
    }

    /// True once no further status changes are possible.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
