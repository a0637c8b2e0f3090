use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one order submission attempt.
///
/// Wraps a UUID to provide type safety and prevent mixing up
/// attempt IDs with other UUID-based identifiers. A new attempt ID is
/// minted for every run through the pipeline; the caller-supplied
/// external ID is what carries idempotency across attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptId(Uuid);

impl AttemptId {
    /// Creates a new random attempt ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an attempt ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for AttemptId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<AttemptId> for Uuid {
    fn from(id: AttemptId) -> Self {
        id.0
    }
}
