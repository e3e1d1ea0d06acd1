//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely, and the
//! line-amount arithmetic frozen into every ledger entry.
//!
//! ## Why Integer Money?
//! ```text
//! In floating point:  0.1 + 0.2 = 0.30000000000000004  ❌
//!
//! OUR SOLUTION: Integer Cents
//!   1000 cents / 3 = 333 cents (×3 = 999 cents)
//!   We KNOW we lost 1 cent, and handle it explicitly
//! ```
//!
//! Every MRP, purchase rate and bill amount in the system is an i64 number
//! of cents. Discounts and GST are expressed in basis points ([`Percent`])
//! so the arithmetic stays in integers end to end.
//!
//! ## Usage
//! ```rust
//! use pharmarx_core::money::Money;
//! use pharmarx_core::types::Percent;
//!
//! let mrp = Money::from_cents(1250); // 12.50 per unit
//! let total = mrp.multiply_quantity(4);
//! assert_eq!(total.cents(), 5000);
//!
//! let discount = total.percentage(Percent::from_bps(1000)); // 10%
//! assert_eq!(discount.cents(), 500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::types::Percent;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: allows negative values for adjustments and refunds
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for JSON serialization
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Calculates a percentage of this amount, rounded half-up.
    ///
    /// ## Implementation
    /// Integer math in i128 to prevent overflow on large amounts:
    /// `(amount_cents * bps + 5000) / 10000`
    ///
    /// ## Example
    /// ```rust
    /// use pharmarx_core::money::Money;
    /// use pharmarx_core::types::Percent;
    ///
    /// let total = Money::from_cents(1000);
    /// let gst = total.percentage(Percent::from_bps(1250)); // 12.5%
    /// assert_eq!(gst.cents(), 125);
    /// ```
    pub fn percentage(&self, rate: Percent) -> Money {
        let part = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(part as i64)
    }
}

/// Display implementation shows money in a human-readable format.
/// For debugging and log output; callers format for display themselves.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

// =============================================================================
// Line Amounts
// =============================================================================

/// Derived amounts for one bill line, computed once at bill-creation time
/// and frozen into the ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAmounts {
    /// quantity × rate (gross line amount).
    pub total: Money,
    /// Percentage discount on the gross amount.
    pub discount: Money,
    /// GST on the discounted amount.
    pub gst: Money,
    /// total − discount. GST is carried separately on the bill.
    pub net: Money,
}

impl LineAmounts {
    /// Computes the frozen amounts for a line.
    ///
    /// ## Rules
    /// - `total = quantity × rate`
    /// - `discount = total × discount%`
    /// - `gst = (total − discount) × gst%`
    /// - `net = total − discount`
    pub fn compute(quantity: i64, rate: Money, discount: Percent, gst: Percent) -> Self {
        let total = rate.multiply_quantity(quantity);
        let discount_amount = total.percentage(discount);
        let taxable = total - discount_amount;
        let gst_amount = taxable.percentage(gst);

        LineAmounts {
            total,
            discount: discount_amount,
            gst: gst_amount,
            net: taxable,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!(a.multiply_quantity(3).cents(), 3000);
    }

    #[test]
    fn test_percentage_with_rounding() {
        // 10.00 at 8.25% = 0.825 → rounds to 0.83
        let amount = Money::from_cents(1000);
        let part = amount.percentage(Percent::from_bps(825));
        assert_eq!(part.cents(), 83);
    }

    #[test]
    fn test_line_amounts() {
        // 4 units at 12.50, 10% discount, 12% GST
        let amounts = LineAmounts::compute(
            4,
            Money::from_cents(1250),
            Percent::from_bps(1000),
            Percent::from_bps(1200),
        );

        assert_eq!(amounts.total.cents(), 5000);
        assert_eq!(amounts.discount.cents(), 500);
        // GST applies to the discounted amount: 45.00 × 12% = 5.40
        assert_eq!(amounts.gst.cents(), 540);
        // net = total − discount
        assert_eq!(amounts.net.cents(), 4500);
    }

    #[test]
    fn test_line_amounts_zero_rates() {
        let amounts = LineAmounts::compute(
            5,
            Money::from_cents(200),
            Percent::zero(),
            Percent::zero(),
        );
        assert_eq!(amounts.total.cents(), 1000);
        assert_eq!(amounts.discount.cents(), 0);
        assert_eq!(amounts.gst.cents(), 0);
        assert_eq!(amounts.net.cents(), 1000);
    }
}
