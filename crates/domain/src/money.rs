//! Fixed-point money arithmetic.

use serde::{Deserialize, Serialize};

/// Money amount represented in cents to avoid floating point issues.
///
/// All pricing arithmetic in the pipeline stays in integer minor units;
/// sub-cent intermediate values use [`Money::from_micros_half_up`] to
/// round half-up exactly once, at the output boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates a new Money amount from a dollar value.
    pub fn from_dollars(dollars: i64) -> Self {
        Self {
            cents: dollars * 100,
        }
    }

    /// Creates a Money amount from micro-dollars (millionths of a
    /// dollar), rounding half-up to the nearest cent.
    ///
    /// This is the single rounding point for pricing computations that
    /// carry sub-cent precision (per-page rates, percentage rates).
    pub fn from_micros_half_up(micros: i128) -> Self {
        let cents = if micros >= 0 {
            (micros + 5_000) / 10_000
        } else {
            (micros - 5_000) / 10_000
        };
        Self {
            cents: cents as i64,
        }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the amount in micro-dollars.
    pub fn as_micros(&self) -> i128 {
        self.cents as i128 * 10_000
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            cents: self.cents * quantity as i64,
        }
    }

    /// Applies a rate expressed in basis points (1/100th of a percent),
    /// rounding half-up to the nearest cent.
    ///
    /// `Money::from_cents(49_000).apply_bps(1_000)` is 10% of $490.00.
    pub fn apply_bps(&self, bps: u32) -> Money {
        Money::from_micros_half_up(self.cents as i128 * bps as i128)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents - rhs.cents,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents += rhs.cents;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.cents -= rhs.cents;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_cents() {
        let money = Money::from_cents(1234);
        assert_eq!(money.cents(), 1234);
        assert_eq!(money.dollars(), 12);
        assert_eq!(money.cents_part(), 34);
    }

    #[test]
    fn test_money_from_dollars() {
        let money = Money::from_dollars(50);
        assert_eq!(money.cents(), 5000);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "$12.34");
        assert_eq!(Money::from_cents(100).to_string(), "$1.00");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-$12.34");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!(a.multiply(3).cents(), 3000);
    }

    #[test]
    fn test_from_micros_rounds_half_up() {
        // $4.90 exactly
        assert_eq!(Money::from_micros_half_up(4_900_000).cents(), 490);
        // half a cent rounds up
        assert_eq!(Money::from_micros_half_up(5_000).cents(), 1);
        // just under half a cent rounds down
        assert_eq!(Money::from_micros_half_up(4_999).cents(), 0);
        // negative amounts round away from zero
        assert_eq!(Money::from_micros_half_up(-5_000).cents(), -1);
    }

    #[test]
    fn test_apply_bps() {
        // 10% of $490.00 is $49.00
        assert_eq!(Money::from_cents(49_000).apply_bps(1_000).cents(), 4_900);
        // 8% of $441.00 is $35.28
        assert_eq!(Money::from_cents(44_100).apply_bps(800).cents(), 3_528);
        // 5% of 9 cents is 0.45 cents, rounds to 0
        assert_eq!(Money::from_cents(9).apply_bps(500).cents(), 0);
        // 5% of 10 cents is 0.5 cents, rounds to 1
        assert_eq!(Money::from_cents(10).apply_bps(500).cents(), 1);
    }

    #[test]
    fn test_money_add_assign() {
        let mut money = Money::from_cents(100);
        money += Money::from_cents(50);
        assert_eq!(money.cents(), 150);
    }

    #[test]
    fn test_money_sub_assign() {
        let mut money = Money::from_cents(100);
        money -= Money::from_cents(30);
        assert_eq!(money.cents(), 70);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let money = Money::from_cents(999);
        let json = serde_json::to_string(&money).unwrap();
        let deserialized: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(money, deserialized);
    }
}
