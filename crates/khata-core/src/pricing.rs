//! # Pricing Engine
//!
//! Turns a cart subtotal plus document-level adjustments into totals.
//!
//! ## Pipeline (fixed order)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. subtotal   = Σ line totals                                          │
//! │  2. discount   = percent ≠ 0 ? subtotal × percent : discount_amount     │
//! │  3. taxable    = max(0, subtotal − discount)                            │
//! │  4. tax        = taxable × tax_rate                                     │
//! │  5. total      = taxable + tax + additional_charge                      │
//! │  6. round_off  ? total rounded to whole unit (half-up) : total          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example: Scenario from the shop floor
//! ```text
//! Cart: 2 × 100.00 + 1 × 50.00      subtotal   250.00
//! Discount 10%                      discount    25.00
//!                                   taxable    225.00
//! GST 18%                           tax         40.50
//!                                   total      265.50   (266.00 rounded)
//! ```
//!
//! Percent results are rounded half-up to the minor unit. The function is
//! pure: identical inputs always give identical totals.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::LineItemCart;
use crate::money::Money;
use crate::types::Rate;

/// Document-level pricing inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Adjustments {
    /// Percent discount. Takes priority over `discount_amount` when non-zero.
    #[serde(default)]
    pub discount_percent: Rate,

    /// Absolute discount, used only when `discount_percent` is zero.
    #[serde(default)]
    pub discount_amount: Money,

    #[serde(default)]
    pub tax_rate: Rate,

    /// Freight, packing and similar charges added after tax.
    #[serde(default)]
    pub additional_charge: Money,

    /// Round the final total to the nearest whole currency unit.
    #[serde(default)]
    pub round_off: bool,
}

impl Adjustments {
    /// Tax only, no discount or charges.
    pub fn with_tax(tax_rate: Rate) -> Self {
        Adjustments {
            tax_rate,
            ..Adjustments::default()
        }
    }
}

/// Outputs of the pricing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingBreakdown {
    pub subtotal: Money,
    pub discount: Money,
    pub taxable_amount: Money,
    /// Rate the tax amount was computed at.
    pub tax_rate: Rate,
    pub tax_amount: Money,
    pub additional_charge: Money,
    pub total: Money,
    pub round_off: bool,
}

/// Runs the pricing pipeline on a subtotal.
///
/// Negative amounts in `adjustments` are treated as zero.
pub fn price(subtotal: Money, adjustments: &Adjustments) -> PricingBreakdown {
    let subtotal = subtotal.non_negative();

    let discount = if adjustments.discount_percent.is_zero() {
        adjustments.discount_amount.non_negative()
    } else {
        subtotal.percent_of(adjustments.discount_percent)
    };

    let taxable_amount = (subtotal - discount).non_negative();
    let tax_amount = taxable_amount.percent_of(adjustments.tax_rate);
    let additional_charge = adjustments.additional_charge.non_negative();

    let exact_total = taxable_amount + tax_amount + additional_charge;
    let total = if adjustments.round_off {
        exact_total.round_to_unit()
    } else {
        exact_total
    };

    PricingBreakdown {
        subtotal,
        discount,
        taxable_amount,
        tax_rate: adjustments.tax_rate,
        tax_amount,
        additional_charge,
        total,
        round_off: adjustments.round_off,
    }
}

/// Prices a cart.
pub fn price_cart(cart: &LineItemCart, adjustments: &Adjustments) -> PricingBreakdown {
    price(cart.subtotal(), adjustments)
}

// =============================================================================
// Unit Tests
// =============================================================================
