//! Collaborator traits and in-memory implementations for pipeline stages.

pub mod licensing;
pub mod provider;
pub mod storage;

pub use licensing::{InMemoryLicenseGate, LicenseGate};
pub use provider::{InMemoryPrintProvider, JobSubmission, PrintProvider, ProviderJob};
pub use storage::{InMemoryObjectStorage, ObjectStorage};
