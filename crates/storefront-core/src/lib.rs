//! # storefront-core: Pure Business Logic for the Storefront
//!
//! This crate holds the rules of the order and invoicing workflow as pure
//! functions and plain types with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Storefront Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           Presentation layer (HTTP, auth, request parsing)      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               storefront-db (Database Layer)                    │   │
//! │  │   cart engine, order engine, invoicing engine, catalog, reports │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ storefront-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │ validation│  │   │
//! │  │   │  Order    │  │   Money   │  │ shipping  │  │  lengths  │  │   │
//! │  │   │  Invoice  │  │   Rate    │  │   tax     │  │ quantities│  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records and status vocabularies
//! - [`money`] - Money and Rate with integer arithmetic
//! - [`pricing`] - Shipping and tax derivation
//! - [`report`] - Report rows
//! - [`error`] - Domain error types and their classification
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::money::Money;
//! use storefront_core::pricing::PricingPolicy;
//!
//! let policy = PricingPolicy::default();
//!
//! let order = policy.order_totals([Money::from_major(200)]);
//! assert_eq!(order.total, Money::from_major(700));
//!
//! let invoice = policy.invoice_amounts(order.subtotal);
//! assert_eq!(invoice.tax, Money::from_major(42));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use storefront_core::Money` instead of
// `use storefront_core::money::Money`

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::{Money, Rate};
pub use pricing::{InvoiceAmounts, OrderTotals, PricingPolicy};
pub use report::*;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and keeps orders a reasonable size.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Category value meaning "no category filter" in catalog searches.
pub const ALL_CATEGORIES: &str = "todos";

/// Default stock level at or below which a product is critical.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;
