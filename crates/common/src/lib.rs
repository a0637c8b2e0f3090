//! Shared identifier types for the print-order pipeline.

mod types;

pub use types::AttemptId;
