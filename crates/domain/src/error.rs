//! Domain error types.

use thiserror::Error;

use crate::book::BindingType;

/// Errors produced by specification validation and cost calculation.
///
/// These are input errors; they are never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecificationError {
    /// Quantity must be at least one.
    #[error("Invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: u32 },

    /// Quantity exceeds the largest order the pipeline accepts.
    #[error("Quantity {quantity} exceeds the maximum of {max}")]
    QuantityTooLarge { quantity: u32, max: u32 },

    /// Page count must be at least one.
    #[error("Invalid page count: {page_count} (must be at least 1)")]
    InvalidPageCount { page_count: u32 },

    /// Trim dimensions must be positive.
    #[error("Invalid trim size: {width_mils} x {height_mils} mils")]
    InvalidTrim { width_mils: u32, height_mils: u32 },

    /// No rate is configured for the binding type, and the perfect
    /// bound fallback rate is missing too.
    #[error("No pricing rate configured for binding type {binding}")]
    UnsupportedBinding { binding: BindingType },

    /// No shipping table is configured for the level, and the ground
    /// fallback table is missing too.
    #[error("No shipping table configured for level {level}")]
    UnsupportedShipping { level: String },

    /// Unknown book template identifier.
    #[error("Unknown book template: {id}")]
    UnknownTemplate { id: String },
}
