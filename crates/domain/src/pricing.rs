//! Deterministic cost calculation with volume discounts and tiered
//! shipping.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::book::{BindingType, BookSpecification};
use crate::cost::CostCalculation;
use crate::error::SpecificationError;
use crate::money::Money;

/// The largest quantity a single order accepts.
pub const MAX_QUANTITY: u32 = 10_000;

/// How the order ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingLevel {
    /// Standard mail, 5-7 business days.
    Mail,

    /// Ground shipping, 3-5 business days.
    #[default]
    Ground,

    /// Express, 1-2 business days. Requires a premium license feature.
    Express,
}

impl ShippingLevel {
    /// Returns the wire name used by the print provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingLevel::Mail => "MAIL",
            ShippingLevel::Ground => "GROUND",
            ShippingLevel::Express => "EXPRESS",
        }
    }
}

impl std::fmt::Display for ShippingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-binding printing rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingRate {
    /// Flat setup portion of the unit cost, in cents.
    pub base_cents: i64,
    /// Per-page portion, in micro-dollars (12_000 = $0.012/page).
    pub per_page_micros: i64,
}

impl BindingRate {
    /// Base unit cost for a page count, in micro-dollars.
    fn unit_micros(&self, page_count: u32) -> i128 {
        self.base_cents as i128 * 10_000 + page_count as i128 * self.per_page_micros as i128
    }
}

/// Quantity-stepped shipping charges for one shipping level.
///
/// Below each threshold a flat charge applies; above the last
/// threshold the charge grows per unit but never drops below the top
/// flat rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingTable {
    /// `(max_quantity, flat_cents)` steps, ascending by quantity.
    pub steps: Vec<(u32, i64)>,
    /// Per-unit charge beyond the last step, in cents.
    pub per_unit_cents: i64,
}

impl ShippingTable {
    /// Shipping charge for a quantity.
    pub fn cost_for(&self, quantity: u32) -> Money {
        for &(max_quantity, flat_cents) in &self.steps {
            if quantity <= max_quantity {
                return Money::from_cents(flat_cents);
            }
        }
        let top_flat = self.steps.last().map(|&(_, cents)| cents).unwrap_or(0);
        let per_unit = quantity as i64 * self.per_unit_cents;
        Money::from_cents(per_unit.max(top_flat))
    }
}

/// Volume discount step function.
///
/// Thresholds are inclusive: exactly 100 units earns the 10% tier.
const DISCOUNT_TIERS: &[(u32, u32, &str)] = &[
    (1_000, 2_500, "Enterprise"),
    (500, 2_000, "Bulk"),
    (250, 1_500, "Volume"),
    (100, 1_000, "Wholesale"),
    (50, 500, "Small Batch"),
];

/// Returns `(rate_bps, tier_name)` for a quantity.
pub fn discount_tier(quantity: u32) -> (u32, &'static str) {
    for &(threshold, bps, name) in DISCOUNT_TIERS {
        if quantity >= threshold {
            return (bps, name);
        }
    }
    (0, "Individual")
}

/// Rate tables and per-order charges for the cost engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Tax rate in basis points (800 = 8%).
    pub tax_rate_bps: u32,
    /// Flat per-order fulfillment fee.
    pub fulfillment_fee: Money,
    /// Printing rates keyed by binding type. Bindings without an entry
    /// fall back to the perfect bound rate.
    pub rates: HashMap<BindingType, BindingRate>,
    /// Shipping tables keyed by level.
    pub shipping: HashMap<ShippingLevel, ShippingTable>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        let rates = HashMap::from([
            (
                BindingType::PerfectBound,
                BindingRate {
                    base_cents: 250,
                    per_page_micros: 12_000,
                },
            ),
            (
                BindingType::SaddleStitch,
                BindingRate {
                    base_cents: 350,
                    per_page_micros: 18_000,
                },
            ),
            (
                BindingType::Hardcover,
                BindingRate {
                    base_cents: 450,
                    per_page_micros: 15_000,
                },
            ),
        ]);

        let shipping = HashMap::from([
            (
                ShippingLevel::Mail,
                ShippingTable {
                    steps: vec![(5, 399), (25, 999), (100, 1_999)],
                    per_unit_cents: 20,
                },
            ),
            (
                ShippingLevel::Ground,
                ShippingTable {
                    steps: vec![(5, 599), (25, 1_299), (100, 2_499)],
                    per_unit_cents: 25,
                },
            ),
            (
                ShippingLevel::Express,
                ShippingTable {
                    steps: vec![(5, 1_299), (25, 2_499), (100, 4_999)],
                    per_unit_cents: 60,
                },
            ),
        ]);

        Self {
            tax_rate_bps: 800,
            fulfillment_fee: Money::from_cents(150),
            rates,
            shipping,
        }
    }
}

impl PricingConfig {
    /// Printing rate for a binding, falling back to perfect bound.
    fn rate_for(&self, binding: BindingType) -> Result<BindingRate, SpecificationError> {
        self.rates
            .get(&binding)
            .or_else(|| self.rates.get(&BindingType::PerfectBound))
            .copied()
            .ok_or(SpecificationError::UnsupportedBinding { binding })
    }

    /// Shipping table for a level, falling back to ground.
    fn shipping_for(&self, level: ShippingLevel) -> Result<&ShippingTable, SpecificationError> {
        self.shipping
            .get(&level)
            .or_else(|| self.shipping.get(&ShippingLevel::Ground))
            .ok_or_else(|| SpecificationError::UnsupportedShipping {
                level: level.to_string(),
            })
    }
}

/// Pure cost calculator.
///
/// Safe to share across concurrent order attempts; it holds only the
/// rate configuration.
#[derive(Debug, Clone, Default)]
pub struct CostEngine {
    config: PricingConfig,
}

impl CostEngine {
    /// Creates an engine with the given configuration.
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Computes the full cost breakdown for a specification, quantity,
    /// and shipping level.
    ///
    /// Unit price is rounded half-up to the cent once, at the output
    /// boundary; discount, subtotal, and total are then derived from
    /// cent-exact values so the breakdown invariants hold exactly.
    pub fn calculate(
        &self,
        spec: &BookSpecification,
        quantity: u32,
        shipping_level: ShippingLevel,
    ) -> Result<CostCalculation, SpecificationError> {
        if quantity == 0 {
            return Err(SpecificationError::InvalidQuantity { quantity });
        }
        if quantity > MAX_QUANTITY {
            return Err(SpecificationError::QuantityTooLarge {
                quantity,
                max: MAX_QUANTITY,
            });
        }

        let rate = self.config.rate_for(spec.binding())?;
        let unit_price = Money::from_micros_half_up(rate.unit_micros(spec.page_count()));

        let (discount_bps, discount_tier) = discount_tier(quantity);
        let gross = unit_price.multiply(quantity);
        let discount = gross.apply_bps(discount_bps);
        let subtotal = gross - discount;

        let taxes = subtotal.apply_bps(self.config.tax_rate_bps);
        let fulfillment_fee = self.config.fulfillment_fee;
        let shipping_cost = self.config.shipping_for(shipping_level)?.cost_for(quantity);
        let total = subtotal + taxes + fulfillment_fee + shipping_cost;

        Ok(CostCalculation {
            unit_price,
            discount,
            discount_tier: discount_tier.to_string(),
            discount_bps,
            taxes,
            fulfillment_fee,
            shipping_cost,
            subtotal,
            total,
            quantity,
            shipping_level,
        })
    }
}
