//! Domain layer for the print-order pipeline.
//!
//! This crate provides the pure core of the system:
//! - `Money` and the fixed-point pricing arithmetic
//! - `BookSpecification` with trim, binding, and paper value objects
//! - The built-in book template catalog
//! - `CostEngine`, a deterministic cost calculator with volume
//!   discounts and tiered shipping
//! - `StagedFile` / `ValidationResult` artifact types
//! - `PrintJob` with its monotonic `JobStatus` state machine
//!
//! Nothing in this crate performs I/O.

pub mod artifact;
pub mod book;
pub mod cost;
pub mod error;
pub mod job;
pub mod money;
pub mod pricing;
pub mod templates;

pub use artifact::{FileRole, StagedFile, ValidationResult, ValidationStatus};
pub use book::{BindingType, BookSpecification, PaperType, TrimSize};
pub use cost::CostCalculation;
pub use error::SpecificationError;
pub use job::{ExternalId, JobStatus, PrintJob};
pub use money::Money;
pub use pricing::{BindingRate, CostEngine, PricingConfig, ShippingLevel, ShippingTable};
pub use templates::{BookTemplate, TEMPLATES, template_by_id};
