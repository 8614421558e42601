//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A cart of 3 × Pão Francês at R$ 0,10 must total exactly R$ 0,30,       │
//! │  and the 10% manager discount on R$ 20,00 must be exactly R$ 2,00.      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Centavos                                         │
//! │    10 + 10 + 10 = 30 centavos, always                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use sonho_core::money::Money;
//!
//! let price = Money::from_cents(50);          // R$ 0,50
//! let line = price.multiply_quantity(10);     // R$ 5,00
//! assert_eq!(line.to_string(), "R$ 5,00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in centavos (1/100 of a Real).
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.price_cents ──► CartItem.line_total ──► Cart.subtotal          │
/// │                                                       │                 │
/// │                             manager discount (frozen) ┤                 │
/// │                                                       ▼                 │
/// │                                                  Cart.total ──► Sale    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ## Example
    /// ```rust
    /// use sonho_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // R$ 10,99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole reais portion.
    #[inline]
    pub const fn reais(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavos portion (always 0-99).
    #[inline]
    pub const fn centavos_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Multiplies money by a quantity, saturating at the `i64` bounds.
    ///
    /// ## Example
    /// ```rust
    /// use sonho_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(50); // Pão Francês, R$ 0,50
    /// assert_eq!(unit_price.multiply_quantity(10).cents(), 500);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Returns `bps` basis points of this amount, rounded half up.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, computed in i128 so
    /// large carts cannot overflow.
    ///
    /// ## Example
    /// ```rust
    /// use sonho_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(2000); // R$ 20,00
    /// assert_eq!(subtotal.percentage(1000).cents(), 200); // 10% = R$ 2,00
    ///
    /// // R$ 0,55 × 10% = 5.5 centavos → 6
    /// assert_eq!(Money::from_cents(55).percentage(1000).cents(), 6);
    /// ```
    pub fn percentage(&self, bps: u32) -> Money {
        let cents = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// Floors the value at zero.
    #[inline]
    pub fn clamp_non_negative(self) -> Money {
        if self.0 < 0 {
            Money::zero()
        } else {
            self
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Brazilian Real formatting: `R$ 1.234,56`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let reais = self.reais().abs().to_string();

        // Group thousands with '.'
        let mut grouped = String::with_capacity(reais.len() + reais.len() / 3);
        for (i, digit) in reais.chars().enumerate() {
            if i > 0 && (reais.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(digit);
        }

        write!(f, "{}R$ {},{:02}", sign, grouped, self.centavos_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
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
        assert_eq!(money.reais(), 10);
        assert_eq!(money.centavos_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(500).to_string(), "R$ 5,00");
        assert_eq!(Money::from_cents(50).to_string(), "R$ 0,50");
        assert_eq!(Money::from_cents(123456).to_string(), "R$ 1.234,56");
        assert_eq!(Money::from_cents(9_999_999).to_string(), "R$ 99.999,99");
        assert_eq!(Money::from_cents(-550).to_string(), "-R$ 5,50");
        assert_eq!(Money::zero().to_string(), "R$ 0,00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!(a.multiply_quantity(3).cents(), 3000);

        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(Money::from_cents(2000).percentage(1000).cents(), 200);
        assert_eq!(Money::from_cents(55).percentage(1000).cents(), 6);
        assert_eq!(Money::from_cents(54).percentage(1000).cents(), 5);
        assert_eq!(Money::zero().percentage(1000).cents(), 0);
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(Money::from_cents(-1).clamp_non_negative(), Money::zero());
        assert_eq!(Money::from_cents(7).clamp_non_negative().cents(), 7);
    }

    #[test]
    fn test_huge_quantities_saturate() {
        let price = Money::from_cents(450);
        assert_eq!(price.multiply_quantity(i64::MAX).cents(), i64::MAX);
        assert_eq!(price.multiply_quantity(i64::MIN).cents(), i64::MIN);

        let line = Money::from_cents(i64::MAX);
        assert_eq!((line + price).cents(), i64::MAX);
        assert_eq!((Money::from_cents(i64::MIN) - price).cents(), i64::MIN);

        let subtotal: Money = [line, price, price].into_iter().sum();
        assert_eq!(subtotal.cents(), i64::MAX);
    }
}
