//! # Error Types
//!
//! Domain-specific error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core errors (this file)                                    │
//! │  ├── CoreError        - Business rule violations                       │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ErrorKind        - Stable classification for callers              │
//! │                                                                         │
//! │  storefront-db errors (separate crate)                                 │
//! │  └── DbError          - Storage failures + Domain(CoreError)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ErrorKind → HTTP status │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product, order, invoice IDs)
//! 3. Errors are enum variants, never String
//! 4. Every variant maps to exactly one `ErrorKind`

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Error Kind
// =============================================================================

/// Stable classification of every error the engine can surface.
///
/// The presentation layer switches on this instead of matching individual
/// variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ErrorKind {
    NotFound,
    ValidationFailed,
    InsufficientStock,
    InvalidStateTransition,
    DuplicateInvoice,
    /// Lock contention or a uniqueness race; the caller may retry.
    Conflict,
    /// Anything the client cannot fix.
    Storage,
}

impl ErrorKind {
    /// Suggested HTTP status for this kind.
    pub const fn http_status(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::ValidationFailed => 400,
            ErrorKind::InsufficientStock => 422,
            ErrorKind::InvalidStateTransition => 409,
            ErrorKind::DuplicateInvoice => 409,
            ErrorKind::Conflict => 409,
            ErrorKind::Storage => 500,
        }
    }

    /// True for errors the caller caused (4xx).
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, ErrorKind::Storage)
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations in the cart, order and
/// invoice workflows.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Insufficient stock to add, confirm or create.
    ///
    /// ## User Workflow
    /// ```text
    /// Confirm cart (line qty: 5)
    ///      │
    ///      ▼
    /// UPDATE products SET stock = stock - 5 WHERE id = ? AND stock >= 5
    ///      │ 0 rows
    ///      ▼
    /// InsufficientStock { product_name: "Mate", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Transaction rolled back, no stock touched
    /// ```
    #[error("Insufficient stock for {product_name} ({product_id}): available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        product_name: String,
        available: i64,
        requested: i64,
    },

    /// Customer (user) cannot be found.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// The user has no pending cart.
    #[error("No cart for user {0}")]
    CartNotFound(String),

    /// The cart has no line for the product.
    #[error("Product {product_id} is not in order {order_id}")]
    LineNotFound { order_id: String, product_id: String },

    /// Invoice cannot be found.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Invoicing requires a confirmed order.
    #[error("Order {order_id} is {status}, only confirmed orders can be invoiced")]
    OrderNotConfirmed { order_id: String, status: String },

    /// The order already has an invoice.
    #[error("Order {0} already has an invoice")]
    DuplicateInvoice(String),

    /// An invoiced order cannot be deleted until its invoice is.
    #[error("Order {0} has an invoice and cannot be deleted")]
    OrderInvoiced(String),

    /// The requested status change is not allowed.
    #[error("Cannot move order {order_id} from {from} to {to}")]
    InvalidStateTransition {
        order_id: String,
        from: String,
        to: String,
    },

    /// A status string that is not part of the order vocabulary.
    #[error("Invalid order status: {0}")]
    InvalidOrderStatus(String),

    /// A status string that is not part of the invoice vocabulary.
    #[error("Invalid invoice status: {0}")]
    InvalidInvoiceStatus(String),

    /// Confirming or creating an order without lines.
    #[error("Order {0} has no items")]
    EmptyOrder(String),

    /// The product is referenced by order lines and cannot be deleted.
    #[error("Product {0} is referenced by orders")]
    ProductInUse(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ProductNotFound(_)
            | CoreError::UserNotFound(_)
            | CoreError::OrderNotFound(_)
            | CoreError::CartNotFound(_)
            | CoreError::LineNotFound { .. }
            | CoreError::InvoiceNotFound(_) => ErrorKind::NotFound,
            CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            CoreError::OrderNotConfirmed { .. }
            | CoreError::OrderInvoiced(_)
            | CoreError::InvalidStateTransition { .. }
            | CoreError::InvalidOrderStatus(_)
            | CoreError::InvalidInvoiceStatus(_) => ErrorKind::InvalidStateTransition,
            CoreError::DuplicateInvoice(_) => ErrorKind::DuplicateInvoice,
            CoreError::ProductInUse(_) => ErrorKind::Conflict,
            CoreError::EmptyOrder(_)
            | CoreError::CartTooLarge { .. }
            | CoreError::QuantityTooLarge { .. }
            | CoreError::Validation(_) => ErrorKind::ValidationFailed,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any transaction opens.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, bad image extension).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            product_name: "Mate".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Mate (p-1): available 3, requested 5"
        );

        let err = CoreError::OrderNotConfirmed {
            order_id: "o-1".to_string(),
            status: "pending".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Order o-1 is pending, only confirmed orders can be invoiced"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "city".to_string(),
        };
        assert_eq!(err.to_string(), "city is required");

        let err = ValidationError::TooShort {
            field: "address".to_string(),
            min: 5,
        };
        assert_eq!(err.to_string(), "address must be at least 5 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "phone".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::ValidationFailed);
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(CoreError::OrderNotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(CoreError::DuplicateInvoice("x".into()).kind(), ErrorKind::DuplicateInvoice);
        assert_eq!(
            CoreError::InvalidInvoiceStatus("archivada".into()).kind(),
            ErrorKind::InvalidStateTransition
        );
        assert_eq!(CoreError::ProductInUse("p".into()).kind(), ErrorKind::Conflict);
        assert_eq!(CoreError::EmptyOrder("o".into()).kind(), ErrorKind::ValidationFailed);
        assert_eq!(
            CoreError::QuantityTooLarge { requested: 1000, max: 999 }.kind(),
            ErrorKind::ValidationFailed
        );
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorKind::NotFound.http_status(), 404);
        assert_eq!(ErrorKind::ValidationFailed.http_status(), 400);
        assert_eq!(ErrorKind::InsufficientStock.http_status(), 422);
        assert_eq!(ErrorKind::DuplicateInvoice.http_status(), 409);
        assert_eq!(ErrorKind::Storage.http_status(), 500);
        assert!(!ErrorKind::Storage.is_client_error());
        assert!(ErrorKind::Conflict.is_client_error());
    }
}
