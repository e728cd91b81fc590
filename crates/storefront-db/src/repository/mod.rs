//! # Repository Module
//!
//! Storage-backed engines for the storefront.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Database ──► products()   ProductRepository   catalog + stock          │
//! │          ──► customers()  CustomerRepository  identity lookup          │
//! │          ──► carts()      CartRepository      pending order per user   │
//! │          ──► orders()     OrderRepository     confirmed orders         │
//! │          ──► invoices()   InvoiceRepository   one invoice per order    │
//! │          ──► reports()    ReportRepository    read-only aggregates     │
//! │                                                                         │
//! │  Each write method opens one transaction on one pooled connection.     │
//! │  The `pub(crate)` helpers in product.rs and order.rs take a            │
//! │  `&mut SqliteConnection` so engines can compose them inside that       │
//! │  transaction.                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cart;
pub mod customer;
pub mod invoice;
pub mod order;
pub mod product;
pub mod report;
