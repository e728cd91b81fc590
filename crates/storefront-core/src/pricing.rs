//! # Pricing Policy
//!
//! Derivation of order and invoice amounts from line subtotals.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ORDER                                                                  │
//! │    subtotal = Σ line.subtotal                                           │
//! │    shipping = max(subtotal × shipping_rate, shipping_floor)            │
//! │               (0 when the order has no lines)                           │
//! │    total    = subtotal + shipping                                       │
//! │                                                                         │
//! │  INVOICE                                                                │
//! │    subtotal = order.subtotal        (shipping is not taxed)             │
//! │    tax      = subtotal × tax_rate                                       │
//! │    total    = subtotal + tax                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The policy is a plain value so it can be injected through configuration
//! and swapped in tests.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Rate};

/// IVA, 21%.
pub const DEFAULT_TAX_RATE: Rate = Rate::from_bps(2100);

/// Shipping share of the subtotal, 10%.
pub const DEFAULT_SHIPPING_RATE: Rate = Rate::from_bps(1000);

/// Minimum shipping charge, 500.00.
pub const DEFAULT_SHIPPING_FLOOR: Money = Money::from_major(500);

/// Rates and floors used to derive order and invoice amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingPolicy {
    pub tax_rate: Rate,
    pub shipping_rate: Rate,
    pub shipping_floor: Money,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        PricingPolicy {
            tax_rate: DEFAULT_TAX_RATE,
            shipping_rate: DEFAULT_SHIPPING_RATE,
            shipping_floor: DEFAULT_SHIPPING_FLOOR,
        }
    }
}

/// Derived order amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
}

impl OrderTotals {
    /// Totals of an order without lines.
    pub const fn empty() -> Self {
        OrderTotals {
            subtotal: Money::zero(),
            shipping: Money::zero(),
            total: Money::zero(),
        }
    }
}

/// Derived invoice amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceAmounts {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

impl PricingPolicy {
    /// Shipping for a non-empty order with the given subtotal.
    pub fn shipping_for(&self, subtotal: Money) -> Money {
        subtotal.apply_rate(self.shipping_rate).max(self.shipping_floor)
    }

    /// Derives order totals from line subtotals.
    ///
    /// ## Arguments
    /// * `line_subtotals` - One entry per order line
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    /// use storefront_core::pricing::PricingPolicy;
    ///
    /// let totals = PricingPolicy::default().order_totals([Money::from_major(200)]);
    /// assert_eq!(totals.shipping, Money::from_major(500)); // floor wins
    /// assert_eq!(totals.total, Money::from_major(700));
    /// ```
    pub fn order_totals<I>(&self, line_subtotals: I) -> OrderTotals
    where
        I: IntoIterator<Item = Money>,
    {
        let mut lines = 0usize;
        let mut subtotal = Money::zero();
        for line in line_subtotals {
            lines += 1;
            subtotal += line;
        }

        if lines == 0 {
            return OrderTotals::empty();
        }

        let shipping = self.shipping_for(subtotal);
        OrderTotals {
            subtotal,
            shipping,
            total: subtotal + shipping,
        }
    }

    /// Derives invoice amounts from an order subtotal.
    pub fn invoice_amounts(&self, subtotal: Money) -> InvoiceAmounts {
        let tax = subtotal.apply_rate(self.tax_rate);
        InvoiceAmounts {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
