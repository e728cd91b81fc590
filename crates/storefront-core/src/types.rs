//! # Domain Types
//!
//! Core domain types used throughout the storefront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │    Invoice      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │◄──│  user_id        │◄──│  order_id (1:1) │       │
//! │  │  price_cents    │   │  status         │   │  sequence       │       │
//! │  │  stock ≥ 0      │   │  subtotal/ship  │   │  number FAC-... │       │
//! │  └─────────────────┘   │  total          │   │  tax / total    │       │
//! │          ▲             └────────┬────────┘   └─────────────────┘       │
//! │          │                      │ 1:N                                   │
//! │          │             ┌────────▼────────┐   ┌─────────────────┐       │
//! │          └─────────────│   OrderLine     │   │   Customer      │       │
//! │                        │  quantity ≥ 1   │   │  national_id    │       │
//! │                        │  unit_price     │   │  address, city  │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Order Lifecycle
//! ```text
//!   pending ──confirm──► confirmado ──► preparando ──► enviado ──► entregado
//!   (cart)                   │  ▲
//!                  invoice   │  │ delete invoice
//!                            ▼  │
//!                         facturado          any non-cart ──► cancelado
//! ```
//!
//! Status strings are Spanish at every boundary (database, JSON) because
//! that is the vocabulary the storefront client and the stored data use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    pub description: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    pub category: String,

    pub image_url: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if `quantity` units can be taken from stock.
    #[inline]
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: i64,
    pub category: String,
    pub image_url: Option<String>,
}

/// Partial update for a product. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i64>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

// =============================================================================
// Customer
// =============================================================================

/// The identity record the engine needs from a user.
///
/// Credentials and roles belong to the authentication layer and are not
/// modelled here.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// DNI, printed on invoices.
    pub national_id: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// "First Last", as shown on invoices.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Input for registering a customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// `Pending` is the cart state: at most one per user, stock not reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum OrderStatus {
    #[serde(rename = "pending")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "pending"))]
    Pending,
    #[serde(rename = "confirmado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "confirmado"))]
    Confirmed,
    #[serde(rename = "preparando")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "preparando"))]
    Preparing,
    #[serde(rename = "enviado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "enviado"))]
    Shipped,
    #[serde(rename = "entregado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "entregado"))]
    Delivered,
    #[serde(rename = "cancelado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cancelado"))]
    Cancelled,
    /// Has exactly one invoice.
    #[serde(rename = "facturado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "facturado"))]
    Invoiced,
}

impl OrderStatus {
    /// The boundary string stored in the database.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmado",
            OrderStatus::Preparing => "preparando",
            OrderStatus::Shipped => "enviado",
            OrderStatus::Delivered => "entregado",
            OrderStatus::Cancelled => "cancelado",
            OrderStatus::Invoiced => "facturado",
        }
    }

    /// True once the order left the cart, i.e. its stock was taken.
    #[inline]
    pub const fn has_reserved_stock(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    /// Statuses reachable through a manual status update.
    ///
    /// `pending` is only ever created by the cart and `facturado` only by
    /// invoice generation, so neither is a valid manual target.
    pub const fn is_manual_target(&self) -> bool {
        matches!(
            self,
            OrderStatus::Confirmed
                | OrderStatus::Preparing
                | OrderStatus::Shipped
                | OrderStatus::Delivered
                | OrderStatus::Cancelled
        )
    }

    /// Checks a manual status change from `self` to `target`.
    ///
    /// A cart cannot change status manually; it must be confirmed. An
    /// invoiced order only returns to `confirmado` when its invoice is
    /// deleted.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        *self != OrderStatus::Pending
            && target.is_manual_target()
            && !(*self == OrderStatus::Invoiced && target == OrderStatus::Confirmed)
    }

    /// Statuses counted as sales by the reports.
    pub const fn counts_as_sale(&self) -> bool {
        !matches!(self, OrderStatus::Pending | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(OrderStatus::Pending),
            "confirmado" => Ok(OrderStatus::Confirmed),
            "preparando" => Ok(OrderStatus::Preparing),
            "enviado" => Ok(OrderStatus::Shipped),
            "entregado" => Ok(OrderStatus::Delivered),
            "cancelado" => Ok(OrderStatus::Cancelled),
            "facturado" => Ok(OrderStatus::Invoiced),
            other => Err(CoreError::InvalidOrderStatus(other.to_string())),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum PaymentMethod {
    #[serde(rename = "tarjeta")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "tarjeta"))]
    Card,
    #[serde(rename = "transferencia")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "transferencia"))]
    Transfer,
    #[serde(rename = "efectivo")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "efectivo"))]
    Cash,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "tarjeta",
            PaymentMethod::Transfer => "transferencia",
            PaymentMethod::Cash => "efectivo",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order header. In `pending` status it is the user's cart.
///
/// Delivery fields are empty strings and `payment_method` is `None` while
/// the order is a cart; confirmation fills them in.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub delivery_method: String,
    pub payment_method: Option<PaymentMethod>,
    pub delivery_address: String,
    pub delivery_city: String,
    pub delivery_postal_code: String,
    pub contact_phone: String,
    pub full_name: String,
    /// Σ line subtotals.
    pub subtotal_cents: i64,
    pub shipping_cents: i64,
    /// subtotal + shipping.
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn shipping(&self) -> Money {
        Money::from_cents(self.shipping_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line of an order.
///
/// `unit_price_cents` is captured when the line is created and does not
/// follow later catalog price changes.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Current catalog name (joined on read).
    pub product_name: String,
    pub product_image_url: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// quantity × unit price.
    pub subtotal_cents: i64,
}

impl OrderLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// An order with its lines, as handed to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderWithLines {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// Delivery and payment details supplied at confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeliveryInfo {
    pub delivery_method: String,
    pub payment_method: PaymentMethod,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub phone: String,
    pub full_name: String,
}

/// One requested item of a direct order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// A direct order that skips the cart.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewOrder {
    pub user_id: String,
    pub items: Vec<OrderItemRequest>,
    pub delivery: DeliveryInfo,
}

// =============================================================================
// Invoice Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum InvoiceStatus {
    #[serde(rename = "pendiente")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "pendiente"))]
    Pending,
    #[serde(rename = "pagada")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "pagada"))]
    Paid,
    #[serde(rename = "cancelada")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cancelada"))]
    Cancelled,
}

impl InvoiceStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pendiente",
            InvoiceStatus::Paid => "pagada",
            InvoiceStatus::Cancelled => "cancelada",
        }
    }

    /// Cancelled invoices are excluded from revenue and statistics.
    #[inline]
    pub const fn counts_as_revenue(&self) -> bool {
        !matches!(self, InvoiceStatus::Cancelled)
    }
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Pending
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pendiente" => Ok(InvoiceStatus::Pending),
            "pagada" => Ok(InvoiceStatus::Paid),
            "cancelada" => Ok(InvoiceStatus::Cancelled),
            other => Err(CoreError::InvalidInvoiceStatus(other.to_string())),
        }
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// Formats an invoice number: `FAC-<year>-<sequence padded to 6>`.
///
/// ## Example
/// ```rust
/// use storefront_core::types::invoice_number;
///
/// assert_eq!(invoice_number(2024, 42), "FAC-2024-000042");
/// ```
pub fn invoice_number(year: i32, sequence: i64) -> String {
    format!("FAC-{}-{:06}", year, sequence)
}

/// An invoice for exactly one order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    pub order_id: String,
    /// Store-wide, strictly increasing.
    pub sequence: i64,
    /// `FAC-<year>-<sequence>`.
    pub number: String,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
    pub status: InvoiceStatus,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Order and customer data printed on an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoiceOrderSummary {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    pub address: String,
    /// Order total including shipping.
    pub order_total_cents: i64,
}

/// A printed invoice line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoiceLine {
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

/// Invoice with its order summary and lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub order: InvoiceOrderSummary,
    pub lines: Vec<InvoiceLine>,
}

/// Aggregates over non-cancelled invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceStatistics {
    pub invoice_count: i64,
    pub revenue_cents: i64,
    pub average_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
