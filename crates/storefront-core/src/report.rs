//! # Report Records
//!
//! Rows returned by the business reports. Amounts are cents.
//!
//! Every report ignores cancelled invoices and pending carts.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Invoiced sales for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DailySales {
    /// `YYYY-MM-DD` (UTC).
    pub day: String,
    pub invoice_count: i64,
    pub revenue_cents: i64,
    pub average_cents: i64,
}

/// Units and revenue for a product across sold orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductSales {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub units_sold: i64,
    pub revenue_cents: i64,
}

/// Invoiced amounts for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MonthlyRevenue {
    /// `YYYY-MM` (UTC).
    pub month: String,
    pub invoice_count: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

/// A customer ranked by spend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CustomerSpend {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub order_count: i64,
    pub total_spent_cents: i64,
}

/// A product at or below the critical stock level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CriticalStock {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub stock: i64,
    pub price_cents: i64,
}

/// Sales grouped by product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CategorySales {
    pub category: String,
    /// Number of order lines.
    pub line_count: i64,
    pub units_sold: i64,
    pub revenue_cents: i64,
}

/// Store-wide headline numbers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GeneralMetrics {
    pub customers: i64,
    /// Orders that left the cart.
    pub orders: i64,
    /// Non-cancelled invoices.
    pub invoices: i64,
    pub paid_invoices: i64,
    pub revenue_cents: i64,
    pub average_sale_cents: i64,
    pub critical_stock_products: i64,
}
