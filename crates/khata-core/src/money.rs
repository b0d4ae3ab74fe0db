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
//! │  OUR SOLUTION: Integer minor units (paise / cents)                      │
//! │    ₹265.50 is stored as 26550                                           │
//! │    Every percentage is applied with integer math and one rounding step │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use khata_core::money::Money;
//!
//! let rate = Money::from_minor(10_000); // 100.00
//! let line = rate * 2;                  // 200.00
//! assert_eq!(line.to_string(), "200.00");
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Rate;

/// Minor units per whole currency unit.
pub const MINOR_PER_UNIT: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (paise for INR, cents for USD).
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  CatalogItem.selling_price ──► DocumentLine.unit_price ──► line total  │
/// │                                                                         │
/// │  Cart.subtotal ──► discount ──► taxable ──► tax ──► total ──► round-off │
/// │                                                                         │
/// │  EVERY monetary value in the system flows through this type            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ```rust
    /// use khata_core::money::Money;
    ///
    /// let price = Money::from_minor(1099);
    /// assert_eq!(price.minor(), 1099);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from whole units (rupees, dollars).
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units.saturating_mul(MINOR_PER_UNIT))
    }

    /// Creates a Money value from major and minor parts.
    ///
    /// For negative amounts only the major part carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * MINOR_PER_UNIT - minor)
        } else {
            Money(major * MINOR_PER_UNIT + minor)
        }
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / MINOR_PER_UNIT
    }

    /// Returns the minor-unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % MINOR_PER_UNIT).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns true when the value has no fractional part.
    #[inline]
    pub const fn is_whole(&self) -> bool {
        self.0 % MINOR_PER_UNIT == 0
    }

    /// Clamps negative values to zero.
    ///
    /// ```rust
    /// use khata_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(-500).non_negative(), Money::zero());
    /// assert_eq!(Money::from_minor(500).non_negative().minor(), 500);
    /// ```
    #[inline]
    pub const fn non_negative(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Applies a percentage rate and rounds half-up to the minor unit.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`.
    /// i128 keeps large amounts from overflowing.
    ///
    /// ```rust
    /// use khata_core::money::Money;
    /// use khata_core::types::Rate;
    ///
    /// let taxable = Money::from_minor(22_500); // 225.00
    /// let tax = taxable.percent_of(Rate::from_bps(1800)); // 18%
    /// assert_eq!(tax.minor(), 4_050); // 40.50
    /// ```
    pub fn percent_of(&self, rate: Rate) -> Money {
        let scaled = self.0 as i128 * rate.bps() as i128;
        Money::from_minor(saturate(round_half_up_div(scaled, 10_000)))
    }

    /// Multiplies money by a quantity, saturating at the `i64` bounds.
    ///
    /// ```rust
    /// use khata_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(299);
    /// assert_eq!(unit_price.multiply_quantity(3).minor(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Rounds to the nearest whole currency unit, half-up.
    ///
    /// ```rust
    /// use khata_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(26_550).round_to_unit().minor(), 26_600);
    /// assert_eq!(Money::from_minor(26_549).round_to_unit().minor(), 26_500);
    /// ```
    pub fn round_to_unit(&self) -> Money {
        let rounded = round_half_up_div(self.0 as i128, MINOR_PER_UNIT as i128);
        Money::from_minor(saturate(rounded * MINOR_PER_UNIT as i128))
    }

    /// Parses a decimal string such as `"265.5"` or `"40"` into Money.
    ///
    /// Digits beyond the second decimal place are rounded half away from
    /// zero. Returns `None` for anything that is not a plain decimal number
    /// (exponents and digit grouping included) or that does not fit `i64`.
    pub fn parse_decimal(input: &str) -> Option<Money> {
        let input = input.trim();
        let plain = input
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'));
        if !plain || !input.chars().any(|c| c.is_ascii_digit()) {
            return None;
        }

        // ".5" and "-.5" carry no whole part
        let (sign, body) = match input.find(|c: char| c != '-' && c != '+') {
            Some(at) => input.split_at(at),
            None => return None,
        };
        let normalized = if body.starts_with('.') {
            format!("{sign}0{body}")
        } else {
            input.to_string()
        };

        let value = Decimal::from_str(&normalized).ok()?;
        value
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(Decimal::from(MINOR_PER_UNIT))?
            .to_i64()
            .map(Money)
    }
}

/// Integer division rounding half-up (towards positive infinity on ties).
fn round_half_up_div(numerator: i128, denominator: i128) -> i128 {
    (2 * numerator + denominator).div_euclid(2 * denominator)
}

fn saturate(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain two-decimal display (`265.50`). Currency symbols are a rendering concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.units().abs(), self.minor_part())
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

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(1099);
        assert_eq!(money.minor(), 1099);
        assert_eq!(money.units(), 10);
        assert_eq!(money.minor_part(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).minor(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).minor(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(1099).to_string(), "10.99");
        assert_eq!(Money::from_minor(500).to_string(), "5.00");
        assert_eq!(Money::from_minor(-550).to_string(), "-5.50");
        assert_eq!(Money::from_minor(0).to_string(), "0.00");
        assert_eq!(Money::from_minor(5).to_string(), "0.05");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((a * 3).minor(), 3000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.minor(), 2000);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let max = Money::from_minor(i64::MAX);
        assert_eq!((max + Money::from_minor(1)).minor(), i64::MAX);
        assert_eq!((Money::from_minor(i64::MIN) - Money::from_minor(1)).minor(), i64::MIN);
        assert_eq!(max.multiply_quantity(2).minor(), i64::MAX);
        assert_eq!(max.round_to_unit().minor(), 9_223_372_036_854_775_800);
        assert_eq!(max.percent_of(Rate::from_bps(20_000)).minor(), i64::MAX);
    }

    #[test]
    fn test_percent_of_exact() {
        // 250.00 at 10% = 25.00
        let discount = Money::from_minor(25_000).percent_of(Rate::from_bps(1000));
        assert_eq!(discount.minor(), 2_500);
    }

    #[test]
    fn test_percent_of_rounds_half_up() {
        // 10.00 at 8.25% = 0.825 → 0.83
        let tax = Money::from_minor(1000).percent_of(Rate::from_bps(825));
        assert_eq!(tax.minor(), 83);

        // 0.10 at 5% = 0.005 → 0.01
        let tax = Money::from_minor(10).percent_of(Rate::from_bps(500));
        assert_eq!(tax.minor(), 1);

        // 0.10 at 4% = 0.004 → 0.00
        let tax = Money::from_minor(10).percent_of(Rate::from_bps(400));
        assert_eq!(tax.minor(), 0);
    }

    #[test]
    fn test_round_to_unit() {
        assert_eq!(Money::from_minor(26_550).round_to_unit().minor(), 26_600);
        assert_eq!(Money::from_minor(26_549).round_to_unit().minor(), 26_500);
        assert_eq!(Money::from_minor(26_500).round_to_unit().minor(), 26_500);
        assert_eq!(Money::from_minor(49).round_to_unit().minor(), 0);
        assert_eq!(Money::from_minor(50).round_to_unit().minor(), 100);
    }

    #[test]
    fn test_non_negative() {
        assert!(Money::from_minor(-1).non_negative().is_zero());
        assert_eq!(Money::from_minor(7).non_negative().minor(), 7);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("265.5"), Some(Money::from_minor(26_550)));
        assert_eq!(Money::parse_decimal("40"), Some(Money::from_minor(4_000)));
        assert_eq!(Money::parse_decimal(" 0.05 "), Some(Money::from_minor(5)));
        assert_eq!(Money::parse_decimal(".5"), Some(Money::from_minor(50)));
        assert_eq!(Money::parse_decimal("1.005"), Some(Money::from_minor(101)));
        assert_eq!(Money::parse_decimal("-5.50"), Some(Money::from_minor(-550)));

        assert_eq!(Money::parse_decimal(""), None);
        assert_eq!(Money::parse_decimal("abc"), None);
        assert_eq!(Money::parse_decimal("1,000"), None);
        assert_eq!(Money::parse_decimal("."), None);
        assert_eq!(Money::parse_decimal("-"), None);
        assert_eq!(Money::parse_decimal("1e3"), None);
        assert_eq!(Money::parse_decimal("1.2.3"), None);
    }

    #[test]
    fn test_parse_decimal_rounding_and_range() {
        assert_eq!(Money::parse_decimal("-1.005"), Some(Money::from_minor(-101)));
        assert_eq!(Money::parse_decimal("1.0049"), Some(Money::from_minor(100)));
        assert_eq!(Money::parse_decimal("-.5"), Some(Money::from_minor(-50)));
        assert_eq!(Money::parse_decimal("+7"), Some(Money::from_minor(700)));
        assert_eq!(
            Money::parse_decimal("92233720368547758.07"),
            Some(Money::from_minor(i64::MAX))
        );
        assert_eq!(Money::parse_decimal("92233720368547758.08"), None);
        assert_eq!(Money::parse_decimal("99999999999999999999999999999999"), None);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());
        assert!(zero.is_whole());

        assert!(Money::from_minor(100).is_whole());
        assert!(!Money::from_minor(150).is_whole());
    }
}
