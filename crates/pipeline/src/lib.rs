//! Print-order pipeline.
//!
//! Drives an order attempt through its stages:
//! 1. Stage interior and cover artifacts (concurrent uploads)
//! 2. Validate both with the provider (concurrent, Error blocks)
//! 3. Submit the print job (the durability point)
//!
//! After submission, jobs live in a ledger keyed by the caller's
//! external id; status is refreshed by polling and only ever advances.

pub mod attempt;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod gateway;
pub mod ledger;
pub mod services;
pub mod stager;
pub mod state;

pub use attempt::PipelineAttempt;
pub use coordinator::{AttemptControls, AttemptMonitor, OrderPipeline, OrderRequest};
pub use error::PipelineError;
pub use events::AttemptEvent;
pub use gateway::ValidationGateway;
pub use ledger::JobLedger;
pub use services::licensing::{
    BULK_ORDER_THRESHOLD, FEATURE_ALL, FEATURE_BULK_ORDERS, FEATURE_EXPRESS_SHIPPING,
};
pub use services::{
    InMemoryLicenseGate, InMemoryObjectStorage, InMemoryPrintProvider, JobSubmission, LicenseGate,
    ObjectStorage, PrintProvider, ProviderJob,
};
pub use stager::FileStager;
pub use state::Stage;
