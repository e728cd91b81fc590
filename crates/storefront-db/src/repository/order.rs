//! # Order Repository
//!
//! The order engine: direct orders, status changes, deletion with stock
//! restoration, and order reads.
//!
//! ## Stock Reconciliation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operation              Stock effect              Status afterwards    │
//! │  ─────────────────────  ────────────────────────  ──────────────────   │
//! │  cart add/remove/update none                      pending              │
//! │  cart confirm           - quantity (conditional)  confirmado           │
//! │  create (direct)        - quantity (conditional)  confirmado           │
//! │  update_status          none                      target               │
//! │  delete                 + quantity unless pending (row removed)        │
//! │                                                                         │
//! │  Every row above is one transaction: lines, header and stock move      │
//! │  together or not at all.                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::customer::fetch_customer;
use crate::repository::product::{fetch_product, return_stock, take_stock};
use storefront_core::validation::{validate_delivery_info, validate_quantity};
use storefront_core::{
    CoreError, DeliveryInfo, Money, NewOrder, Order, OrderItemRequest, OrderLine, OrderStatus,
    OrderTotals, OrderWithLines, PricingPolicy, MAX_CART_ITEMS, MAX_ITEM_QUANTITY,
};

pub(crate) const ORDER_COLUMNS: &str = "id, user_id, status, delivery_method, payment_method, \
     delivery_address, delivery_city, delivery_postal_code, contact_phone, full_name, \
     subtotal_cents, shipping_cents, total_cents, created_at, updated_at";

/// Repository for orders that have left the cart.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
    pricing: PricingPolicy,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool, pricing: PricingPolicy) -> Self {
        OrderRepository { pool, pricing }
    }

    /// Creates a confirmed order directly, without a cart.
    ///
    /// ## Flow
    /// ```text
    /// validate items (≥ 1, merged by product) + delivery info
    ///      │
    ///      ▼  BEGIN
    /// user exists? ── no ──► UserNotFound
    ///      │
    ///      ▼  for each item
    /// product exists? ── no ──► ProductNotFound
    /// take stock (conditional) ── short ──► InsufficientStock
    ///      │
    ///      ▼
    /// insert order (confirmado) + lines at current prices
    ///      │
    ///      ▼  COMMIT
    /// ```
    pub async fn create(&self, new_order: NewOrder) -> DbResult<OrderWithLines> {
        let items = merge_items(&new_order.items)?;
        validate_delivery_info(&new_order.delivery)?;

        let mut tx = self.pool.begin().await?;

        if fetch_customer(&mut tx, &new_order.user_id).await?.is_none() {
            return Err(CoreError::UserNotFound(new_order.user_id.clone()).into());
        }

        // (product_id, quantity, unit price)
        let mut priced = Vec::with_capacity(items.len());
        for item in &items {
            let product = fetch_product(&mut tx, &item.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;
            take_stock(&mut tx, &product.id, item.quantity).await?;
            let unit_price = product.price();
            priced.push((product.id, item.quantity, unit_price));
        }

        let totals = self
            .pricing
            .order_totals(priced.iter().map(|(_, qty, price)| price.multiply_quantity(*qty)));

        let order_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let delivery = &new_order.delivery;

        sqlx::query(
            "INSERT INTO orders (
                id, user_id, status, delivery_method, payment_method, delivery_address,
                delivery_city, delivery_postal_code, contact_phone, full_name,
                subtotal_cents, shipping_cents, total_cents, created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&order_id)
        .bind(&new_order.user_id)
        .bind(OrderStatus::Confirmed)
        .bind(delivery.delivery_method.trim())
        .bind(delivery.payment_method)
        .bind(delivery.address.trim())
        .bind(delivery.city.trim())
        .bind(delivery.postal_code.trim())
        .bind(delivery.phone.trim())
        .bind(delivery.full_name.trim())
        .bind(totals.subtotal.cents())
        .bind(totals.shipping.cents())
        .bind(totals.total.cents())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for (product_id, quantity, unit_price) in &priced {
            insert_line(&mut tx, &order_id, product_id, *quantity, *unit_price).await?;
        }

        let order = fetch_with_lines(&mut tx, &order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", &order_id))?;

        tx.commit().await?;

        info!(
            order_id = %order_id,
            user_id = %new_order.user_id,
            lines = priced.len(),
            total = %totals.total,
            "Order created"
        );
        Ok(order)
    }

    /// Changes the status of a non-cart order.
    ///
    /// ## Errors
    /// * `OrderNotFound`
    /// * `InvalidStateTransition` - the order is a cart, the target is
    ///   `pending` / `facturado`, or the order is invoiced and the target is
    ///   `confirmado`
    /// * `OrderInvoiced` - the target is `confirmado` while an invoice exists
    pub async fn update_status(&self, order_id: &str, target: OrderStatus) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;

        let order = fetch_order(&mut tx, order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        if !order.status.can_transition_to(target) {
            return Err(CoreError::InvalidStateTransition {
                order_id: order_id.to_string(),
                from: order.status.to_string(),
                to: target.to_string(),
            }
            .into());
        }

        // Only deleting the invoice brings an invoiced order back to confirmado.
        if target == OrderStatus::Confirmed && has_invoice(&mut tx, order_id).await? {
            return Err(CoreError::OrderInvoiced(order_id.to_string()).into());
        }

        set_status(&mut tx, order_id, target).await?;

        let order = fetch_order(&mut tx, order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;

        tx.commit().await?;

        info!(order_id = %order_id, status = %target, "Order status updated");
        Ok(order)
    }

    /// Deletes an order and its lines.
    ///
    /// Stock taken at confirmation is given back. Carts never took stock, so
    /// deleting one only removes rows. An invoiced order must have its
    /// invoice deleted first.
    pub async fn delete(&self, order_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let order = fetch_order(&mut tx, order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        if has_invoice(&mut tx, order_id).await? {
            return Err(CoreError::OrderInvoiced(order_id.to_string()).into());
        }

        let lines = fetch_lines(&mut tx, order_id).await?;
        if order.status.has_reserved_stock() {
            for line in &lines {
                return_stock(&mut tx, &line.product_id, line.quantity).await?;
            }
        }

        // order_lines cascade
        sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            order_id = %order_id,
            status = %order.status,
            restocked = order.status.has_reserved_stock(),
            "Order deleted"
        );
        Ok(())
    }

    /// Gets an order with its lines.
    pub async fn get_by_id(&self, order_id: &str) -> DbResult<Option<OrderWithLines>> {
        let mut conn = self.pool.acquire().await?;
        fetch_with_lines(&mut conn, order_id).await
    }

    /// Orders of one user, newest first. Carts are excluded.
    pub async fn list_by_user(&self, user_id: &str) -> DbResult<Vec<OrderWithLines>> {
        let mut conn = self.pool.acquire().await?;

        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE user_id = ? AND status != ?
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .bind(OrderStatus::Pending)
        .fetch_all(&mut *conn)
        .await?;

        debug!(user_id = %user_id, count = orders.len(), "Listed user orders");
        attach_lines(&mut conn, orders).await
    }

    /// Every order, newest first. Carts are excluded.
    pub async fn list_all(&self) -> DbResult<Vec<OrderWithLines>> {
        let mut conn = self.pool.acquire().await?;

        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE status != ? ORDER BY created_at DESC"
        ))
        .bind(OrderStatus::Pending)
        .fetch_all(&mut *conn)
        .await?;

        attach_lines(&mut conn, orders).await
    }
}

/// Validates requested items and merges repeats of the same product.
fn merge_items(items: &[OrderItemRequest]) -> DbResult<Vec<OrderItemRequest>> {
    if items.is_empty() {
        return Err(CoreError::EmptyOrder("new order".to_string()).into());
    }

    let mut merged: Vec<OrderItemRequest> = Vec::with_capacity(items.len());
    for item in items {
        validate_quantity(item.quantity)?;
        match merged.iter_mut().find(|m| m.product_id == item.product_id) {
            Some(existing) => existing.quantity += item.quantity,
            None => merged.push(item.clone()),
        }
    }

    if merged.len() > MAX_CART_ITEMS {
        return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS }.into());
    }
    if let Some(item) = merged.iter().find(|m| m.quantity > MAX_ITEM_QUANTITY) {
        return Err(CoreError::QuantityTooLarge {
            requested: item.quantity,
            max: MAX_ITEM_QUANTITY,
        }
        .into());
    }

    Ok(merged)
}

// =============================================================================
// Transaction helpers (shared with the cart and invoicing engines)
// =============================================================================

pub(crate) async fn fetch_order(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
    ))
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(order)
}

/// Lines in insertion order, with current product name and image.
pub(crate) async fn fetch_lines(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<OrderLine>> {
    let lines = sqlx::query_as::<_, OrderLine>(
        "SELECT l.id, l.order_id, l.product_id,
                p.name AS product_name, p.image_url AS product_image_url,
                l.quantity, l.unit_price_cents, l.subtotal_cents
         FROM order_lines l
         JOIN products p ON p.id = l.product_id
         WHERE l.order_id = ?
         ORDER BY l.created_at, l.rowid",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}

pub(crate) async fn fetch_with_lines(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Option<OrderWithLines>> {
    let Some(order) = fetch_order(conn, order_id).await? else {
        return Ok(None);
    };
    let lines = fetch_lines(conn, order_id).await?;
    Ok(Some(OrderWithLines { order, lines }))
}

async fn attach_lines(
    conn: &mut SqliteConnection,
    orders: Vec<Order>,
) -> DbResult<Vec<OrderWithLines>> {
    let mut out = Vec::with_capacity(orders.len());
    for order in orders {
        let lines = fetch_lines(conn, &order.id).await?;
        out.push(OrderWithLines { order, lines });
    }
    Ok(out)
}

pub(crate) async fn insert_line(
    conn: &mut SqliteConnection,
    order_id: &str,
    product_id: &str,
    quantity: i64,
    unit_price: Money,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO order_lines
            (id, order_id, product_id, quantity, unit_price_cents, subtotal_cents, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(unit_price.cents())
    .bind(unit_price.multiply_quantity(quantity).cents())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Re-derives subtotal, shipping and total from the stored lines and
/// writes them to the order header.
pub(crate) async fn recompute_totals(
    conn: &mut SqliteConnection,
    order_id: &str,
    pricing: &PricingPolicy,
) -> DbResult<OrderTotals> {
    let subtotals: Vec<i64> =
        sqlx::query_scalar("SELECT subtotal_cents FROM order_lines WHERE order_id = ?")
            .bind(order_id)
            .fetch_all(&mut *conn)
            .await?;

    let totals = pricing.order_totals(subtotals.into_iter().map(Money::from_cents));

    sqlx::query(
        "UPDATE orders SET subtotal_cents = ?, shipping_cents = ?, total_cents = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(totals.subtotal.cents())
    .bind(totals.shipping.cents())
    .bind(totals.total.cents())
    .bind(Utc::now())
    .bind(order_id)
    .execute(&mut *conn)
    .await?;

    Ok(totals)
}

pub(crate) async fn set_status(
    conn: &mut SqliteConnection,
    order_id: &str,
    status: OrderStatus,
) -> DbResult<()> {
    let result = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(Utc::now())
        .bind(order_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::OrderNotFound(order_id.to_string()).into());
    }
    Ok(())
}

async fn has_invoice(conn: &mut SqliteConnection, order_id: &str) -> DbResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE order_id = ?")
        .bind(order_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count > 0)
}

/// Stamps delivery and payment details on an order.
pub(crate) async fn set_delivery(
    conn: &mut SqliteConnection,
    order_id: &str,
    delivery: &DeliveryInfo,
) -> DbResult<()> {
    sqlx::query(
        "UPDATE orders SET
            delivery_method = ?, payment_method = ?, delivery_address = ?, delivery_city = ?,
            delivery_postal_code = ?, contact_phone = ?, full_name = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(delivery.delivery_method.trim())
    .bind(delivery.payment_method)
    .bind(delivery.address.trim())
    .bind(delivery.city.trim())
    .bind(delivery.postal_code.trim())
    .bind(delivery.phone.trim())
    .bind(delivery.full_name.trim())
    .bind(Utc::now())
    .bind(order_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{customer, delivery, product, test_db};
    use storefront_core::ErrorKind;

    fn item(product_id: &str, quantity: i64) -> OrderItemRequest {
        OrderItemRequest {
            product_id: product_id.to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_create_order_takes_stock_and_prices_lines() {
        let db = test_db().await;
        let user = customer(&db).await;
        let mate = product(&db, "Mate imperial", 100, 10).await;

        let order = db
            .orders()
            .create(NewOrder {
                user_id: user.id.clone(),
                items: vec![item(&mate.id, 2)],
                delivery: delivery(),
            })
            .await
            .unwrap();

        assert_eq!(order.order.status, OrderStatus::Confirmed);
        assert_eq!(order.order.subtotal_cents, 20_000);
        assert_eq!(order.order.shipping_cents, 50_000);
        assert_eq!(order.order.total_cents, 70_000);
        assert_eq!(order.order.delivery_city, "Rosario");
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].product_name, "Mate imperial");

        let stock = db.products().get_by_id(&mate.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 8);
    }

    #[tokio::test]
    async fn test_create_order_merges_repeated_products() {
        let db = test_db().await;
        let user = customer(&db).await;
        let mate = product(&db, "Mate imperial", 100, 10).await;

        let order = db
            .orders()
            .create(NewOrder {
                user_id: user.id.clone(),
                items: vec![item(&mate.id, 2), item(&mate.id, 3)],
                delivery: delivery(),
            })
            .await
            .unwrap();

        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].quantity, 5);
        assert_eq!(db.products().get_by_id(&mate.id).await.unwrap().unwrap().stock, 5);
    }

    #[tokio::test]
    async fn test_create_order_is_all_or_nothing() {
        let db = test_db().await;
        let user = customer(&db).await;
        let mate = product(&db, "Mate imperial", 100, 10).await;
        let yerba = product(&db, "Yerba 1kg", 30, 1).await;

        let err = db
            .orders()
            .create(NewOrder {
                user_id: user.id.clone(),
                items: vec![item(&mate.id, 4), item(&yerba.id, 2)],
                delivery: delivery(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_domain(),
            Some(CoreError::InsufficientStock { product_name, .. }) if product_name == "Yerba 1kg"
        ));
        // first line's stock was put back by the rollback
        assert_eq!(db.products().get_by_id(&mate.id).await.unwrap().unwrap().stock, 10);
        assert!(db.orders().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_order_rejections() {
        let db = test_db().await;
        let user = customer(&db).await;
        let mate = product(&db, "Mate imperial", 100, 10).await;
        let orders = db.orders();

        let empty = NewOrder {
            user_id: user.id.clone(),
            items: vec![],
            delivery: delivery(),
        };
        assert_eq!(orders.create(empty).await.unwrap_err().kind(), ErrorKind::ValidationFailed);

        let unknown_user = NewOrder {
            user_id: "nobody".to_string(),
            items: vec![item(&mate.id, 1)],
            delivery: delivery(),
        };
        assert_eq!(orders.create(unknown_user).await.unwrap_err().kind(), ErrorKind::NotFound);

        let unknown_product = NewOrder {
            user_id: user.id.clone(),
            items: vec![item("missing", 1)],
            delivery: delivery(),
        };
        assert!(matches!(
            orders.create(unknown_product).await.unwrap_err().as_domain(),
            Some(CoreError::ProductNotFound(_))
        ));

        let mut bad_delivery = delivery();
        bad_delivery.phone = "123".to_string();
        let bad = NewOrder {
            user_id: user.id.clone(),
            items: vec![item(&mate.id, 1)],
            delivery: bad_delivery,
        };
        assert_eq!(orders.create(bad).await.unwrap_err().kind(), ErrorKind::ValidationFailed);
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let db = test_db().await;
        let user = customer(&db).await;
        let mate = product(&db, "Mate imperial", 100, 10).await;
        let order = db
            .orders()
            .create(NewOrder {
                user_id: user.id.clone(),
                items: vec![item(&mate.id, 1)],
                delivery: delivery(),
            })
            .await
            .unwrap();
        let id = order.order.id.clone();

        let updated = db.orders().update_status(&id, OrderStatus::Shipped).await.unwrap();
        assert_eq!(updated.status, OrderStatus::Shipped);

        let err = db.orders().update_status(&id, OrderStatus::Invoiced).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
        let err = db.orders().update_status(&id, OrderStatus::Pending).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);

        let err = db.orders().update_status("missing", OrderStatus::Shipped).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // status changes never touch stock
        db.orders().update_status(&id, OrderStatus::Cancelled).await.unwrap();
        assert_eq!(db.products().get_by_id(&mate.id).await.unwrap().unwrap().stock, 9);
    }

    #[tokio::test]
    async fn test_invoiced_order_keeps_its_status_until_invoice_deleted() {
        let db = test_db().await;
        let user = customer(&db).await;
        let mate = product(&db, "Mate imperial", 100, 10).await;
        let order = db
            .orders()
            .create(NewOrder {
                user_id: user.id.clone(),
                items: vec![item(&mate.id, 1)],
                delivery: delivery(),
            })
            .await
            .unwrap();
        let id = order.order.id.clone();
        db.invoices().generate(&id).await.unwrap();

        let err = db.orders().update_status(&id, OrderStatus::Confirmed).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
        let current = db.orders().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(current.order.status, OrderStatus::Invoiced);

        // moving forward first does not open a way back either
        db.orders().update_status(&id, OrderStatus::Shipped).await.unwrap();
        let err = db.orders().update_status(&id, OrderStatus::Confirmed).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::OrderInvoiced(_))));
        let current = db.orders().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(current.order.status, OrderStatus::Shipped);
        let invoice = db.invoices().get_by_order(&id).await.unwrap().unwrap();

        db.invoices().delete(&invoice.id).await.unwrap();
        let current = db.orders().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(current.order.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_delete_restores_stock() {
        let db = test_db().await;
        let user = customer(&db).await;
        let mate = product(&db, "Mate imperial", 100, 10).await;
        let yerba = product(&db, "Yerba 1kg", 30, 5).await;
        let order = db
            .orders()
            .create(NewOrder {
                user_id: user.id.clone(),
                items: vec![item(&mate.id, 3), item(&yerba.id, 5)],
                delivery: delivery(),
            })
            .await
            .unwrap();

        db.orders().delete(&order.order.id).await.unwrap();

        assert_eq!(db.products().get_by_id(&mate.id).await.unwrap().unwrap().stock, 10);
        assert_eq!(db.products().get_by_id(&yerba.id).await.unwrap().unwrap().stock, 5);
        assert!(db.orders().get_by_id(&order.order.id).await.unwrap().is_none());

        let lines: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_lines")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(lines, 0);

        let err = db.orders().delete(&order.order.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_cart_does_not_restock() {
        let db = test_db().await;
        let user = customer(&db).await;
        let mate = product(&db, "Mate imperial", 100, 10).await;

        let cart = db.carts().add_item(&user.id, &mate.id, 4).await.unwrap();
        db.orders().delete(&cart.order.id).await.unwrap();

        assert_eq!(db.products().get_by_id(&mate.id).await.unwrap().unwrap().stock, 10);
        assert!(db.carts().get(&user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lists_exclude_carts() {
        let db = test_db().await;
        let user = customer(&db).await;
        let mate = product(&db, "Mate imperial", 100, 10).await;

        db.carts().add_item(&user.id, &mate.id, 1).await.unwrap();
        db.orders()
            .create(NewOrder {
                user_id: user.id.clone(),
                items: vec![item(&mate.id, 1)],
                delivery: delivery(),
            })
            .await
            .unwrap();

        assert_eq!(db.orders().list_all().await.unwrap().len(), 1);
        let mine = db.orders().list_by_user(&user.id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].lines.len(), 1);
    }
}
