//! Attempt state machine.

use serde::{Deserialize, Serialize};

/// The stage an order attempt is in.
///
/// Stage transitions:
/// ```text
/// Idle ──► Staging ──► Validating ──► Submitting ──► Submitted ──► Polling ──► Completed
///   │          │            │             │              │            │
///   └──────────┴────────────┴─────────────┴──────────────┴────────────┴──► Failed / Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Stage {
    /// Attempt created but no work started yet.
    #[default]
    Idle,

    /// Interior and cover artifacts are being uploaded.
    Staging,

    /// Staged artifacts are being validated by the provider.
    Validating,

    /// The print job is being submitted to the provider.
    Submitting,

    /// The provider accepted the job (durability point).
    Submitted,

    /// The job status is being refreshed from the provider.
    Polling,

    /// The job reached a terminal provider status (terminal stage).
    Completed,

    /// A stage failed and the attempt stopped (terminal stage).
    Failed,

    /// The attempt was cancelled before submission (terminal stage).
    Cancelled,
}

impl Stage {
    /// Returns true if this is a terminal stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Completed | Stage::Failed | Stage::Cancelled)
    }

    /// Returns true if a provider-side job exists at this stage.
    pub fn has_job(&self) -> bool {
        matches!(self, Stage::Submitted | Stage::Polling | Stage::Completed)
    }

    /// Returns the stage name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "Idle",
            Stage::Staging => "Staging",
            Stage::Validating => "Validating",
            Stage::Submitting => "Submitting",
            Stage::Submitted => "Submitted",
            Stage::Polling => "Polling",
            Stage::Completed => "Completed",
            Stage::Failed => "Failed",
            Stage::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stage_is_idle() {
        assert_eq!(Stage::default(), Stage::Idle);
    }

    #[test]
    fn test_terminal_stages() {
        assert!(!Stage::Idle.is_terminal());
        assert!(!Stage::Staging.is_terminal());
        assert!(!Stage::Validating.is_terminal());
        assert!(!Stage::Submitting.is_terminal());
        assert!(!Stage::Submitted.is_terminal());
        assert!(!Stage::Polling.is_terminal());
        assert!(Stage::Completed.is_terminal());
        assert!(Stage::Failed.is_terminal());
        assert!(Stage::Cancelled.is_terminal());
    }

    #[test]
    fn test_has_job() {
        assert!(!Stage::Idle.has_job());
        assert!(!Stage::Staging.has_job());
        assert!(!Stage::Validating.has_job());
        assert!(!Stage::Submitting.has_job());
        assert!(Stage::Submitted.has_job());
        assert!(Stage::Polling.has_job());
        assert!(Stage::Completed.has_job());
        assert!(!Stage::Failed.has_job());
    }

    #[test]
    fn test_display() {
        assert_eq!(Stage::Idle.to_string(), "Idle");
        assert_eq!(Stage::Staging.to_string(), "Staging");
        assert_eq!(Stage::Validating.to_string(), "Validating");
        assert_eq!(Stage::Submitting.to_string(), "Submitting");
        assert_eq!(Stage::Submitted.to_string(), "Submitted");
        assert_eq!(Stage::Polling.to_string(), "Polling");
        assert_eq!(Stage::Completed.to_string(), "Completed");
        assert_eq!(Stage::Failed.to_string(), "Failed");
        assert_eq!(Stage::Cancelled.to_string(), "Cancelled");
    }

    #[test]
    fn test_serialization() {
        let stage = Stage::Validating;
        let json = serde_json::to_string(&stage).unwrap();
        let deserialized: Stage = serde_json::from_str(&json).unwrap();
        assert_eq!(stage, deserialized);
    }
}
