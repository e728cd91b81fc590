//! # Invoice Repository
//!
//! Invoices are issued for confirmed orders, one per order.
//!
//! ## Numbering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  invoice_sequence (single row, id = 1)                                  │
//! │                                                                         │
//! │  generate():                                                            │
//! │    BEGIN                                                                │
//! │    UPDATE invoice_sequence SET value = value + 1 RETURNING value        │
//! │      ▲ first statement: takes the write lock, so a concurrent           │
//! │      │ generate waits here and then reads committed state               │
//! │    checks on the order ... INSERT invoice (sequence, number)            │
//! │    COMMIT                                                               │
//! │                                                                         │
//! │  UNIQUE(sequence), UNIQUE(number), UNIQUE(order_id) back the counter.  │
//! │  A rolled back generate also rolls back its increment.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Datelike, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::order::{fetch_order, set_status};
use storefront_core::types::invoice_number;
use storefront_core::{
    CoreError, Invoice, InvoiceDetail, InvoiceLine, InvoiceOrderSummary, InvoiceStatistics,
    InvoiceStatus, Money, OrderStatus, PricingPolicy,
};

const INVOICE_COLUMNS: &str = "i.id, i.order_id, i.sequence, i.number, i.issued_at, i.status, \
     i.subtotal_cents, i.tax_cents, i.total_cents, i.created_at, i.updated_at";

/// Repository for invoices.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
    pricing: PricingPolicy,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool, pricing: PricingPolicy) -> Self {
        InvoiceRepository { pool, pricing }
    }

    /// Issues the invoice for a confirmed order.
    ///
    /// ## Amounts
    /// Tax applies to the order subtotal; shipping is not taxed.
    ///
    /// ## Errors
    /// * `OrderNotFound`
    /// * `DuplicateInvoice` - the order already has an invoice
    /// * `OrderNotConfirmed` - the order is not `confirmado`
    pub async fn generate(&self, order_id: &str) -> DbResult<Invoice> {
        let mut tx = self.pool.begin().await?;

        let sequence: i64 = sqlx::query_scalar(
            "UPDATE invoice_sequence SET value = value + 1 WHERE id = 1 RETURNING value",
        )
        .fetch_one(&mut *tx)
        .await?;

        let order = fetch_order(&mut tx, order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        if fetch_by_order(&mut tx, order_id).await?.is_some() {
            return Err(CoreError::DuplicateInvoice(order_id.to_string()).into());
        }

        if order.status != OrderStatus::Confirmed {
            return Err(CoreError::OrderNotConfirmed {
                order_id: order_id.to_string(),
                status: order.status.to_string(),
            }
            .into());
        }

        let amounts = self.pricing.invoice_amounts(order.subtotal());
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let number = invoice_number(now.year(), sequence);

        sqlx::query(
            "INSERT INTO invoices (
                id, order_id, sequence, number, issued_at, status,
                subtotal_cents, tax_cents, total_cents, created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(order_id)
        .bind(sequence)
        .bind(&number)
        .bind(now)
        .bind(InvoiceStatus::Pending)
        .bind(amounts.subtotal.cents())
        .bind(amounts.tax.cents())
        .bind(amounts.total.cents())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } if field.contains("order_id") => {
                DbError::Domain(CoreError::DuplicateInvoice(order_id.to_string()))
            }
            other => other,
        })?;

        set_status(&mut tx, order_id, OrderStatus::Invoiced).await?;

        let invoice = fetch_invoice(&mut tx, &id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", &id))?;

        tx.commit().await?;

        info!(
            invoice_id = %id,
            order_id = %order_id,
            number = %number,
            total = %amounts.total,
            "Invoice generated"
        );
        Ok(invoice)
    }

    /// Sets the status of an invoice.
    ///
    /// Boundary strings are parsed with `str::parse::<InvoiceStatus>()`,
    /// which rejects unknown values with `InvalidInvoiceStatus`.
    pub async fn update_status(&self, invoice_id: &str, status: InvoiceStatus) -> DbResult<Invoice> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE invoices SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(invoice_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::InvoiceNotFound(invoice_id.to_string()).into());
        }

        let invoice = fetch_invoice(&mut tx, invoice_id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", invoice_id))?;

        tx.commit().await?;

        info!(invoice_id = %invoice_id, status = %status, "Invoice status updated");
        Ok(invoice)
    }

    /// Deletes an invoice and returns its order to `confirmado`.
    ///
    /// The sequence counter is not rewound; a later invoice for the same
    /// order gets a fresh number.
    pub async fn delete(&self, invoice_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let invoice = fetch_invoice(&mut tx, invoice_id)
            .await?
            .ok_or_else(|| CoreError::InvoiceNotFound(invoice_id.to_string()))?;

        sqlx::query("DELETE FROM invoices WHERE id = ?")
            .bind(invoice_id)
            .execute(&mut *tx)
            .await?;

        set_status(&mut tx, &invoice.order_id, OrderStatus::Confirmed).await?;

        tx.commit().await?;

        info!(
            invoice_id = %invoice_id,
            order_id = %invoice.order_id,
            number = %invoice.number,
            "Invoice deleted"
        );
        Ok(())
    }

    /// Count, revenue and average sale over non-cancelled invoices.
    pub async fn statistics(&self) -> DbResult<InvoiceStatistics> {
        let (invoice_count, revenue_cents): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(total_cents), 0) FROM invoices WHERE status != ?",
        )
        .bind(InvoiceStatus::Cancelled)
        .fetch_one(&self.pool)
        .await?;

        let average = Money::from_cents(revenue_cents).average_over(invoice_count);

        Ok(InvoiceStatistics {
            invoice_count,
            revenue_cents,
            average_cents: average.cents(),
        })
    }

    /// Gets an invoice with its customer summary and lines.
    pub async fn get_by_id(&self, invoice_id: &str) -> DbResult<Option<InvoiceDetail>> {
        let mut conn = self.pool.acquire().await?;

        let Some(invoice) = fetch_invoice(&mut conn, invoice_id).await? else {
            return Ok(None);
        };

        let order = sqlx::query_as::<_, InvoiceOrderSummary>(
            "SELECT o.user_id, c.first_name, c.last_name, c.national_id, c.address,
                    o.total_cents AS order_total_cents
             FROM orders o
             JOIN customers c ON c.id = o.user_id
             WHERE o.id = ?",
        )
        .bind(&invoice.order_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Order", &invoice.order_id))?;

        let lines = sqlx::query_as::<_, InvoiceLine>(
            "SELECT p.name AS product_name, l.quantity, l.unit_price_cents, l.subtotal_cents
             FROM order_lines l
             JOIN products p ON p.id = l.product_id
             WHERE l.order_id = ?
             ORDER BY l.created_at, l.rowid",
        )
        .bind(&invoice.order_id)
        .fetch_all(&mut *conn)
        .await?;

        debug!(invoice_id = %invoice_id, lines = lines.len(), "Loaded invoice detail");
        Ok(Some(InvoiceDetail {
            invoice,
            order,
            lines,
        }))
    }

    /// Gets the invoice issued for an order, if any.
    pub async fn get_by_order(&self, order_id: &str) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_order(&mut conn, order_id).await
    }

    /// Invoices of one user's orders, newest first.
    pub async fn list_by_user(&self, user_id: &str) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS}
             FROM invoices i
             JOIN orders o ON o.id = i.order_id
             WHERE o.user_id = ?
             ORDER BY i.sequence DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    /// Every invoice, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices i ORDER BY i.sequence DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    pub async fn list_by_status(&self, status: InvoiceStatus) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices i WHERE i.status = ? ORDER BY i.sequence DESC"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }
}

async fn fetch_invoice(conn: &mut SqliteConnection, invoice_id: &str) -> DbResult<Option<Invoice>> {
    let invoice = sqlx::query_as::<_, Invoice>(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices i WHERE i.id = ?"
    ))
    .bind(invoice_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(invoice)
}

async fn fetch_by_order(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Option<Invoice>> {
    let invoice = sqlx::query_as::<_, Invoice>(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices i WHERE i.order_id = ?"
    ))
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(invoice)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Database;
    use crate::test_support::{customer, delivery, file_db, product, test_db};
    use storefront_core::{ErrorKind, NewOrder, OrderItemRequest, OrderWithLines};

    /// Confirmed order of `quantity` units at `price_major` each.
    async fn confirmed_order(db: &Database, price_major: i64, quantity: i64) -> OrderWithLines {
        let user = customer(db).await;
        let item = product(db, "Termo acero 1L", price_major, 100).await;
        db.orders()
            .create(NewOrder {
                user_id: user.id,
                items: vec![OrderItemRequest {
                    product_id: item.id,
                    quantity,
                }],
                delivery: delivery(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_generate_invoice_amounts() {
        let db = test_db().await;
        let order = confirmed_order(&db, 500, 2).await;
        assert_eq!(order.order.subtotal_cents, 100_000);

        let invoice = db.invoices().generate(&order.order.id).await.unwrap();

        assert_eq!(invoice.subtotal_cents, 100_000);
        assert_eq!(invoice.tax_cents, 21_000);
        assert_eq!(invoice.total_cents, 121_000);
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.sequence, 1);
        assert_eq!(invoice.number, invoice_number(invoice.issued_at.year(), 1));

        let order = db.orders().get_by_id(&order.order.id).await.unwrap().unwrap();
        assert_eq!(order.order.status, OrderStatus::Invoiced);
    }

    #[tokio::test]
    async fn test_numbers_increase() {
        let db = test_db().await;
        let first = confirmed_order(&db, 10, 1).await;
        let second = confirmed_order(&db, 20, 1).await;

        let a = db.invoices().generate(&first.order.id).await.unwrap();
        let b = db.invoices().generate(&second.order.id).await.unwrap();

        assert!(b.sequence > a.sequence);
        assert_ne!(a.number, b.number);
    }

    #[tokio::test]
    async fn test_generate_rejections() {
        let db = test_db().await;
        let order = confirmed_order(&db, 10, 1).await;
        let invoices = db.invoices();

        let err = invoices.generate("missing").await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::OrderNotFound(_))));

        invoices.generate(&order.order.id).await.unwrap();
        let err = invoices.generate(&order.order.id).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::DuplicateInvoice(_))));
        assert_eq!(err.kind(), ErrorKind::DuplicateInvoice);

        let shipped = confirmed_order(&db, 10, 1).await;
        db.orders()
            .update_status(&shipped.order.id, OrderStatus::Shipped)
            .await
            .unwrap();
        let err = invoices.generate(&shipped.order.id).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::OrderNotConfirmed { .. })));

        // failed attempts do not burn sequence numbers
        let next = confirmed_order(&db, 10, 1).await;
        assert_eq!(invoices.generate(&next.order.id).await.unwrap().sequence, 2);
    }

    #[tokio::test]
    async fn test_cart_cannot_be_invoiced() {
        let db = test_db().await;
        let user = customer(&db).await;
        let mate = product(&db, "Mate imperial", 100, 10).await;
        let cart = db.carts().add_item(&user.id, &mate.id, 1).await.unwrap();

        let err = db.invoices().generate(&cart.order.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
    }

    #[tokio::test]
    async fn test_delete_reverts_order_and_allows_reissue() {
        let db = test_db().await;
        let order = confirmed_order(&db, 10, 1).await;

        let first = db.invoices().generate(&order.order.id).await.unwrap();
        db.invoices().delete(&first.id).await.unwrap();

        let reverted = db.orders().get_by_id(&order.order.id).await.unwrap().unwrap();
        assert_eq!(reverted.order.status, OrderStatus::Confirmed);
        assert!(db.invoices().get_by_id(&first.id).await.unwrap().is_none());

        let second = db.invoices().generate(&order.order.id).await.unwrap();
        assert!(second.sequence > first.sequence);
        assert_ne!(second.number, first.number);

        let err = db.invoices().delete(&first.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_invoiced_order_cannot_be_deleted() {
        let db = test_db().await;
        let order = confirmed_order(&db, 10, 1).await;
        db.invoices().generate(&order.order.id).await.unwrap();

        let err = db.orders().delete(&order.order.id).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::OrderInvoiced(_))));
    }

    #[tokio::test]
    async fn test_update_status() {
        let db = test_db().await;
        let order = confirmed_order(&db, 10, 1).await;
        let invoice = db.invoices().generate(&order.order.id).await.unwrap();

        let paid = db
            .invoices()
            .update_status(&invoice.id, InvoiceStatus::Paid)
            .await
            .unwrap();
        assert_eq!(paid.status, InvoiceStatus::Paid);
        assert_eq!(db.invoices().list_by_status(InvoiceStatus::Paid).await.unwrap().len(), 1);

        let err = db
            .invoices()
            .update_status("missing", InvoiceStatus::Paid)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let parsed = "pagadx".parse::<InvoiceStatus>().unwrap_err();
        assert_eq!(parsed.kind(), ErrorKind::InvalidStateTransition);
    }

    #[tokio::test]
    async fn test_statistics_exclude_cancelled() {
        let db = test_db().await;
        let a = confirmed_order(&db, 100, 1).await;
        let b = confirmed_order(&db, 200, 1).await;
        let c = confirmed_order(&db, 300, 1).await;

        db.invoices().generate(&a.order.id).await.unwrap();
        db.invoices().generate(&b.order.id).await.unwrap();
        let cancelled = db.invoices().generate(&c.order.id).await.unwrap();
        db.invoices()
            .update_status(&cancelled.id, InvoiceStatus::Cancelled)
            .await
            .unwrap();

        let stats = db.invoices().statistics().await.unwrap();
        assert_eq!(stats.invoice_count, 2);
        assert_eq!(stats.revenue_cents, 12_100 + 24_200);
        assert_eq!(stats.average_cents, 18_150);
    }

    #[tokio::test]
    async fn test_statistics_empty() {
        let db = test_db().await;
        assert_eq!(db.invoices().statistics().await.unwrap(), InvoiceStatistics::default());
    }

    #[tokio::test]
    async fn test_invoice_detail() {
        let db = test_db().await;
        let order = confirmed_order(&db, 500, 2).await;
        let invoice = db.invoices().generate(&order.order.id).await.unwrap();

        let detail = db.invoices().get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(detail.order.first_name, "Ana");
        assert_eq!(detail.order.last_name, "Pérez");
        assert_eq!(detail.order.order_total_cents, order.order.total_cents);
        assert_eq!(detail.lines.len(), 1);
        assert_eq!(detail.lines[0].product_name, "Termo acero 1L");
        assert_eq!(detail.lines[0].quantity, 2);

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["number"], invoice.number);
        assert_eq!(json["status"], "pendiente");
        assert!(json["order"]["national_id"].is_string());

        let by_order = db.invoices().get_by_order(&order.order.id).await.unwrap().unwrap();
        assert_eq!(by_order.id, invoice.id);
        assert_eq!(
            db.invoices().list_by_user(&order.order.user_id).await.unwrap().len(),
            1
        );
        assert!(db.invoices().list_by_user("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_generation_assigns_distinct_numbers() {
        let file = file_db().await;
        let db = &file.db;
        let first = confirmed_order(db, 10, 1).await;
        let second = confirmed_order(db, 20, 1).await;

        let invoices = db.invoices();
        let (a, b) = tokio::join!(
            invoices.generate(&first.order.id),
            invoices.generate(&second.order.id)
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.sequence, b.sequence);
        assert_ne!(a.number, b.number);
        assert_eq!(db.invoices().list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_generation_for_one_order() {
        let file = file_db().await;
        let db = &file.db;
        let order = confirmed_order(db, 10, 1).await;

        let invoices = db.invoices();
        let (a, b) = tokio::join!(
            invoices.generate(&order.order.id),
            invoices.generate(&order.order.id)
        );

        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        let err = a.err().or(b.err()).unwrap();
        assert_eq!(err.kind(), ErrorKind::DuplicateInvoice);
    }
}
