//! # Report Repository
//!
//! Read-only aggregates over invoices, orders and the catalog.
//!
//! ## What Counts
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Invoice reports   status != 'cancelada'                               │
//! │  Order reports     status NOT IN ('pending', 'cancelado')              │
//! │                    (carts and cancelled orders are not sales)          │
//! │  Stock reports     stock <= threshold                                  │
//! │                                                                         │
//! │  Sums are COALESCE'd to 0; averages are rounded in Money, not SQL.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use storefront_core::{
    CategorySales, CriticalStock, CustomerSpend, DailySales, GeneralMetrics, InvoiceStatus,
    Money, MonthlyRevenue, OrderStatus, ProductSales,
};

/// Order statuses that are not sales.
const NOT_SOLD: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::Cancelled];

/// Repository for reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
    low_stock_threshold: i64,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    ///
    /// ## Arguments
    /// * `low_stock_threshold` - Stock level counted as critical by
    ///   `general_metrics`
    pub fn new(pool: SqlitePool, low_stock_threshold: i64) -> Self {
        ReportRepository {
            pool,
            low_stock_threshold,
        }
    }

    /// Invoice count, revenue and average sale per issue day.
    ///
    /// ## Arguments
    /// * `from` / `to` - Inclusive UTC day bounds
    pub async fn sales_by_period(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<DailySales>> {
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            "SELECT substr(issued_at, 1, 10) AS day,
                    COUNT(*),
                    COALESCE(SUM(total_cents), 0)
             FROM invoices
             WHERE status != ?
               AND substr(issued_at, 1, 10) BETWEEN ? AND ?
             GROUP BY day
             ORDER BY day",
        )
        .bind(InvoiceStatus::Cancelled)
        .bind(from.format("%Y-%m-%d").to_string())
        .bind(to.format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await?;

        debug!(%from, %to, days = rows.len(), "Sales by period");

        Ok(rows
            .into_iter()
            .map(|(day, invoice_count, revenue_cents)| DailySales {
                day,
                invoice_count,
                revenue_cents,
                average_cents: Money::from_cents(revenue_cents)
                    .average_over(invoice_count)
                    .cents(),
            })
            .collect())
    }

    /// Best-selling products by units.
    pub async fn top_products(&self, limit: i64) -> DbResult<Vec<ProductSales>> {
        let rows = sqlx::query_as::<_, ProductSales>(
            "SELECT p.id AS product_id, p.name, p.category,
                    COALESCE(SUM(l.quantity), 0) AS units_sold,
                    COALESCE(SUM(l.subtotal_cents), 0) AS revenue_cents
             FROM order_lines l
             JOIN products p ON p.id = l.product_id
             JOIN orders o ON o.id = l.order_id
             WHERE o.status NOT IN (?, ?)
             GROUP BY p.id, p.name, p.category
             ORDER BY units_sold DESC, revenue_cents DESC, p.name
             LIMIT ?",
        )
        .bind(NOT_SOLD[0])
        .bind(NOT_SOLD[1])
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Invoiced amounts per `YYYY-MM`, most recent month first.
    pub async fn monthly_revenue(&self) -> DbResult<Vec<MonthlyRevenue>> {
        let rows = sqlx::query_as::<_, MonthlyRevenue>(
            "SELECT substr(issued_at, 1, 7) AS month,
                    COUNT(*) AS invoice_count,
                    COALESCE(SUM(subtotal_cents), 0) AS subtotal_cents,
                    COALESCE(SUM(tax_cents), 0) AS tax_cents,
                    COALESCE(SUM(total_cents), 0) AS total_cents
             FROM invoices
             WHERE status != ?
             GROUP BY month
             ORDER BY month DESC",
        )
        .bind(InvoiceStatus::Cancelled)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Customers ranked by total spent on sold orders.
    pub async fn top_customers(&self, limit: i64) -> DbResult<Vec<CustomerSpend>> {
        let rows = sqlx::query_as::<_, CustomerSpend>(
            "SELECT c.id AS user_id, c.first_name, c.last_name, c.email,
                    COUNT(o.id) AS order_count,
                    COALESCE(SUM(o.total_cents), 0) AS total_spent_cents
             FROM orders o
             JOIN customers c ON c.id = o.user_id
             WHERE o.status NOT IN (?, ?)
             GROUP BY c.id, c.first_name, c.last_name, c.email
             ORDER BY total_spent_cents DESC, c.last_name
             LIMIT ?",
        )
        .bind(NOT_SOLD[0])
        .bind(NOT_SOLD[1])
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Products at or below `threshold` units, lowest first.
    pub async fn critical_stock(&self, threshold: i64) -> DbResult<Vec<CriticalStock>> {
        let rows = sqlx::query_as::<_, CriticalStock>(
            "SELECT id AS product_id, name, category, stock, price_cents
             FROM products
             WHERE stock <= ?
             ORDER BY stock, name",
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn sales_by_category(&self) -> DbResult<Vec<CategorySales>> {
        let rows = sqlx::query_as::<_, CategorySales>(
            "SELECT p.category,
                    COUNT(l.id) AS line_count,
                    COALESCE(SUM(l.quantity), 0) AS units_sold,
                    COALESCE(SUM(l.subtotal_cents), 0) AS revenue_cents
             FROM order_lines l
             JOIN products p ON p.id = l.product_id
             JOIN orders o ON o.id = l.order_id
             WHERE o.status NOT IN (?, ?)
             GROUP BY p.category
             ORDER BY revenue_cents DESC, p.category",
        )
        .bind(NOT_SOLD[0])
        .bind(NOT_SOLD[1])
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Store-wide counters for the dashboard.
    ///
    /// `orders` counts every order that left the cart, cancelled included.
    pub async fn general_metrics(&self) -> DbResult<GeneralMetrics> {
        let (customers, orders, invoices, paid_invoices, revenue_cents, critical_stock_products): (
            i64,
            i64,
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            "SELECT
                (SELECT COUNT(*) FROM customers),
                (SELECT COUNT(*) FROM orders WHERE status != ?),
                (SELECT COUNT(*) FROM invoices WHERE status != ?),
                (SELECT COUNT(*) FROM invoices WHERE status = ?),
                (SELECT COALESCE(SUM(total_cents), 0) FROM invoices WHERE status != ?),
                (SELECT COUNT(*) FROM products WHERE stock <= ?)",
        )
        .bind(OrderStatus::Pending)
        .bind(InvoiceStatus::Cancelled)
        .bind(InvoiceStatus::Paid)
        .bind(InvoiceStatus::Cancelled)
        .bind(self.low_stock_threshold)
        .fetch_one(&self.pool)
        .await?;

        Ok(GeneralMetrics {
            customers,
            orders,
            invoices,
            paid_invoices,
            revenue_cents,
            average_sale_cents: Money::from_cents(revenue_cents).average_over(invoices).cents(),
            critical_stock_products,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Database;
    use crate::test_support::{customer, delivery, product, test_db};
    use chrono::Utc;
    use storefront_core::{Customer, NewOrder, OrderItemRequest, OrderWithLines, Product};

    async fn order(db: &Database, user: &Customer, items: &[(&Product, i64)]) -> OrderWithLines {
        db.orders()
            .create(NewOrder {
                user_id: user.id.clone(),
                items: items
                    .iter()
                    .map(|(p, quantity)| OrderItemRequest {
                        product_id: p.id.clone(),
                        quantity: *quantity,
                    })
                    .collect(),
                delivery: delivery(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_sales_reports_skip_carts_and_cancelled() {
        let db = test_db().await;
        let ana = customer(&db).await;
        let bruno = customer(&db).await;
        let mate = product(&db, "Mate imperial", 100, 50).await;
        let yerba = product(&db, "Yerba 1kg", 30, 50).await;

        order(&db, &ana, &[(&mate, 2), (&yerba, 1)]).await;
        order(&db, &bruno, &[(&yerba, 4)]).await;
        let cancelled = order(&db, &bruno, &[(&mate, 10)]).await;
        db.orders()
            .update_status(&cancelled.order.id, OrderStatus::Cancelled)
            .await
            .unwrap();
        db.carts().add_item(&ana.id, &mate.id, 7).await.unwrap();

        let top = db.reports().top_products(10).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Yerba 1kg");
        assert_eq!(top[0].units_sold, 5);
        assert_eq!(top[1].units_sold, 2);
        assert_eq!(db.reports().top_products(1).await.unwrap().len(), 1);

        let categories = db.reports().sales_by_category().await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].category, "bazar");
        assert_eq!(categories[0].line_count, 3);
        assert_eq!(categories[0].units_sold, 7);
        assert_eq!(categories[0].revenue_cents, 20_000 + 3_000 + 12_000);

        let customers = db.reports().top_customers(10).await.unwrap();
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[0].user_id, ana.id);
        assert_eq!(customers[0].order_count, 1);
        assert_eq!(customers[1].order_count, 1);
    }

    #[tokio::test]
    async fn test_invoice_reports() {
        let db = test_db().await;
        let ana = customer(&db).await;
        let mate = product(&db, "Mate imperial", 100, 50).await;

        let a = order(&db, &ana, &[(&mate, 1)]).await;
        let b = order(&db, &ana, &[(&mate, 2)]).await;
        let c = order(&db, &ana, &[(&mate, 3)]).await;
        let paid = db.invoices().generate(&a.order.id).await.unwrap();
        db.invoices().generate(&b.order.id).await.unwrap();
        let cancelled = db.invoices().generate(&c.order.id).await.unwrap();
        db.invoices()
            .update_status(&paid.id, InvoiceStatus::Paid)
            .await
            .unwrap();
        db.invoices()
            .update_status(&cancelled.id, InvoiceStatus::Cancelled)
            .await
            .unwrap();

        let today = Utc::now().date_naive();
        let daily = db.reports().sales_by_period(today, today).await.unwrap();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].invoice_count, 2);
        assert_eq!(daily[0].revenue_cents, 12_100 + 24_200);
        assert_eq!(daily[0].average_cents, 18_150);

        let yesterday = today.pred_opt().unwrap();
        assert!(db
            .reports()
            .sales_by_period(yesterday, yesterday)
            .await
            .unwrap()
            .is_empty());

        let monthly = db.reports().monthly_revenue().await.unwrap();
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].month, today.format("%Y-%m").to_string());
        assert_eq!(monthly[0].subtotal_cents, 30_000);
        assert_eq!(monthly[0].tax_cents, 6_300);
        assert_eq!(monthly[0].total_cents, 36_300);

        let metrics = db.reports().general_metrics().await.unwrap();
        assert_eq!(metrics.customers, 1);
        assert_eq!(metrics.orders, 3);
        assert_eq!(metrics.invoices, 2);
        assert_eq!(metrics.paid_invoices, 1);
        assert_eq!(metrics.revenue_cents, 36_300);
        assert_eq!(metrics.average_sale_cents, 18_150);
    }

    #[tokio::test]
    async fn test_critical_stock() {
        let db = test_db().await;
        product(&db, "Mate imperial", 100, 2).await;
        product(&db, "Yerba 1kg", 30, 0).await;
        product(&db, "Termo acero 1L", 500, 40).await;

        let critical = db.reports().critical_stock(5).await.unwrap();
        assert_eq!(critical.len(), 2);
        assert_eq!(critical[0].name, "Yerba 1kg");
        assert_eq!(critical[0].stock, 0);

        assert_eq!(db.reports().general_metrics().await.unwrap().critical_stock_products, 2);
    }

    #[tokio::test]
    async fn test_empty_store() {
        let db = test_db().await;

        assert_eq!(db.reports().general_metrics().await.unwrap(), GeneralMetrics::default());
        assert!(db.reports().monthly_revenue().await.unwrap().is_empty());
        assert!(db.reports().top_products(5).await.unwrap().is_empty());
    }
}
