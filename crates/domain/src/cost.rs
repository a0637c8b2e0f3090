//! Priced cost breakdown for an order.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::pricing::ShippingLevel;

/// A derived cost snapshot for one specification, quantity, and
/// shipping level.
///
/// Recomputed whenever any input changes; never persisted on its own.
/// At submission time the calculation is attached to the print job as
/// an immutable snapshot.
///
/// Invariants (exact, in cents):
/// - `total == subtotal + taxes + fulfillment_fee + shipping_cost`
/// - `subtotal == unit_price * quantity - discount`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostCalculation {
    /// Price per unit before volume discount.
    pub unit_price: Money,
    /// Total volume discount across the order.
    pub discount: Money,
    /// Name of the discount tier applied.
    pub discount_tier: String,
    /// Discount rate in basis points.
    pub discount_bps: u32,
    /// Taxes on the discounted subtotal.
    pub taxes: Money,
    /// Flat per-order fulfillment fee.
    pub fulfillment_fee: Money,
    /// Shipping charge for the chosen level and quantity.
    pub shipping_cost: Money,
    /// Discounted printing cost (`unit_price * quantity - discount`).
    pub subtotal: Money,
    /// Grand total.
    pub total: Money,
    /// Number of copies priced.
    pub quantity: u32,
    /// Shipping level priced.
    pub shipping_level: ShippingLevel,
}

impl CostCalculation {
    /// All-in cost per copy (total divided by quantity, rounded
    /// half-up to the cent).
    pub fn cost_per_unit(&self) -> Money {
        let q = self.quantity as i128;
        let cents = (self.total.cents() as i128 * 2 + q) / (2 * q);
        Money::from_cents(cents as i64)
    }

    /// Suggested retail price: 5.5x the discounted unit cost, rounded
    /// up to the next whole dollar.
    pub fn suggested_retail_price(&self) -> Money {
        // Ceiling division; subtotal and quantity are non-negative.
        let num = self.subtotal.cents() as i128 * 55;
        let den = self.quantity as i128 * 1_000;
        let dollars = (num + den - 1) / den;
        Money::from_dollars(dollars as i64)
    }

    /// Verifies the arithmetic invariants hold.
    pub fn is_consistent(&self) -> bool {
        self.total == self.subtotal + self.taxes + self.fulfillment_fee + self.shipping_cost
            && self.subtotal == self.unit_price.multiply(self.quantity) - self.discount
    }
}
