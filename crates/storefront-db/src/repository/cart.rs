//! # Cart Repository
//!
//! A cart is an order in `pending` status. Each user has at most one,
//! enforced by a partial unique index on `orders(user_id)`.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   get_or_create ──► [pending, no lines]                                 │
//! │                          │                                              │
//! │          add_item / update_quantity / remove_item                       │
//! │          (totals recomputed, stock untouched)                           │
//! │                          │                                              │
//! │           ┌──────────────┼──────────────────┐                           │
//! │           ▼              ▼                  ▼                           │
//! │   last line removed   clear()           confirm(delivery)               │
//! │   → cart deleted      → cart deleted    → stock taken per line          │
//! │                                          → status confirmado            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines keep the unit price captured when they were first added; later
//! catalog price changes do not reprice an open cart.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::order::{
    fetch_lines, fetch_with_lines, insert_line, recompute_totals, set_delivery, set_status,
};
use crate::repository::product::{fetch_product, take_stock};
use storefront_core::validation::{validate_delivery_info, validate_quantity};
use storefront_core::{
    CoreError, DeliveryInfo, OrderStatus, OrderWithLines, PricingPolicy, MAX_CART_ITEMS,
    MAX_ITEM_QUANTITY,
};

/// Repository for the per-user cart.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
    pricing: PricingPolicy,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool, pricing: PricingPolicy) -> Self {
        CartRepository { pool, pricing }
    }

    /// Returns the user's cart, creating an empty one if needed.
    ///
    /// Calling this twice, even concurrently, yields the same cart.
    pub async fn get_or_create(&self, user_id: &str) -> DbResult<OrderWithLines> {
        let mut tx = self.pool.begin().await?;

        let cart_id = ensure_cart(&mut tx, user_id).await?;
        let cart = fetch_with_lines(&mut tx, &cart_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", &cart_id))?;

        tx.commit().await?;
        Ok(cart)
    }

    /// Returns the user's cart, if any.
    pub async fn get(&self, user_id: &str) -> DbResult<Option<OrderWithLines>> {
        let mut conn = self.pool.acquire().await?;

        let Some(cart_id) = fetch_cart_id(&mut conn, user_id).await? else {
            return Ok(None);
        };
        fetch_with_lines(&mut conn, &cart_id).await
    }

    /// Adds a product to the user's cart.
    ///
    /// ## Arguments
    /// * `user_id` - Cart owner; the cart is created if missing
    /// * `product_id` - Product to add
    /// * `quantity` - Units to add (1 to 999)
    ///
    /// ## Behavior
    /// - Existing line: quantity grows, subtotal uses the captured price
    /// - New line: captured at the current catalog price
    /// - Stock must cover the resulting line quantity but is not taken
    ///
    /// ## Returns
    /// The cart with recomputed totals.
    pub async fn add_item(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<OrderWithLines> {
        validate_quantity(quantity)?;

        let mut tx = self.pool.begin().await?;

        let cart_id = ensure_cart(&mut tx, user_id).await?;

        let product = fetch_product(&mut tx, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT quantity FROM order_lines WHERE order_id = ? AND product_id = ?",
        )
        .bind(&cart_id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;

        let line_quantity = existing.unwrap_or(0) + quantity;
        if line_quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: line_quantity,
                max: MAX_ITEM_QUANTITY,
            }
            .into());
        }
        if !product.has_stock_for(line_quantity) {
            return Err(CoreError::InsufficientStock {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                available: product.stock,
                requested: line_quantity,
            }
            .into());
        }

        if existing.is_some() {
            sqlx::query(
                "UPDATE order_lines
                 SET quantity = ?, subtotal_cents = unit_price_cents * ?
                 WHERE order_id = ? AND product_id = ?",
            )
            .bind(line_quantity)
            .bind(line_quantity)
            .bind(&cart_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        } else {
            let line_count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM order_lines WHERE order_id = ?")
                    .bind(&cart_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if line_count as usize >= MAX_CART_ITEMS {
                return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS }.into());
            }
            insert_line(&mut tx, &cart_id, product_id, line_quantity, product.price()).await?;
        }

        let totals = recompute_totals(&mut tx, &cart_id, &self.pricing).await?;
        let cart = fetch_with_lines(&mut tx, &cart_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", &cart_id))?;

        tx.commit().await?;

        debug!(
            user_id = %user_id,
            product_id = %product_id,
            quantity = line_quantity,
            total = %totals.total,
            "Cart item added"
        );
        Ok(cart)
    }

    /// Removes a product line from the user's cart.
    ///
    /// ## Returns
    /// * `Some(cart)` - The cart with recomputed totals
    /// * `None` - That was the last line; the cart was deleted
    pub async fn remove_item(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> DbResult<Option<OrderWithLines>> {
        let mut tx = self.pool.begin().await?;

        let cart_id = require_cart(&mut tx, user_id).await?;

        let result = sqlx::query("DELETE FROM order_lines WHERE order_id = ? AND product_id = ?")
            .bind(&cart_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::LineNotFound {
                order_id: cart_id,
                product_id: product_id.to_string(),
            }
            .into());
        }

        let cart = finish_line_change(&mut tx, &cart_id, &self.pricing).await?;
        tx.commit().await?;

        debug!(user_id = %user_id, product_id = %product_id, emptied = cart.is_none(), "Cart item removed");
        Ok(cart)
    }

    /// Overwrites the quantity of a cart line.
    ///
    /// Stock is not re-checked here; confirmation checks it. A quantity of
    /// zero removes the line.
    pub async fn update_quantity(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<Option<OrderWithLines>> {
        if quantity == 0 {
            return self.remove_item(user_id, product_id).await;
        }
        validate_quantity(quantity)?;

        let mut tx = self.pool.begin().await?;

        let cart_id = require_cart(&mut tx, user_id).await?;

        let result = sqlx::query(
            "UPDATE order_lines
             SET quantity = ?, subtotal_cents = unit_price_cents * ?
             WHERE order_id = ? AND product_id = ?",
        )
        .bind(quantity)
        .bind(quantity)
        .bind(&cart_id)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::LineNotFound {
                order_id: cart_id,
                product_id: product_id.to_string(),
            }
            .into());
        }

        let cart = finish_line_change(&mut tx, &cart_id, &self.pricing).await?;
        tx.commit().await?;

        debug!(user_id = %user_id, product_id = %product_id, quantity, "Cart quantity updated");
        Ok(cart)
    }

    /// Deletes the user's cart and its lines. No-op without a cart.
    pub async fn clear(&self, user_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let Some(cart_id) = fetch_cart_id(&mut tx, user_id).await? else {
            return Ok(());
        };

        sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(&cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(user_id = %user_id, order_id = %cart_id, "Cart cleared");
        Ok(())
    }

    /// Confirms the user's cart into an order.
    ///
    /// ## Flow
    /// ```text
    /// validate delivery info
    ///      │
    ///      ▼  BEGIN
    /// cart exists? ── no ──► CartNotFound
    /// has lines?   ── no ──► EmptyOrder
    ///      │
    ///      ▼  for each line
    /// UPDATE products SET stock = stock - qty WHERE id = ? AND stock >= qty
    ///      │ 0 rows ──► InsufficientStock (whole transaction rolls back)
    ///      ▼
    /// stamp delivery + payment, status = confirmado
    ///      │
    ///      ▼  COMMIT
    /// ```
    pub async fn confirm(&self, user_id: &str, delivery: DeliveryInfo) -> DbResult<OrderWithLines> {
        validate_delivery_info(&delivery)?;

        let mut tx = self.pool.begin().await?;

        let cart_id = require_cart(&mut tx, user_id).await?;

        let lines = fetch_lines(&mut tx, &cart_id).await?;
        if lines.is_empty() {
            return Err(CoreError::EmptyOrder(cart_id).into());
        }

        for line in &lines {
            take_stock(&mut tx, &line.product_id, line.quantity).await?;
        }

        let totals = recompute_totals(&mut tx, &cart_id, &self.pricing).await?;
        set_delivery(&mut tx, &cart_id, &delivery).await?;
        set_status(&mut tx, &cart_id, OrderStatus::Confirmed).await?;

        let order = fetch_with_lines(&mut tx, &cart_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", &cart_id))?;

        tx.commit().await?;

        info!(
            order_id = %cart_id,
            user_id = %user_id,
            lines = lines.len(),
            total = %totals.total,
            payment = %delivery.payment_method,
            "Cart confirmed"
        );
        Ok(order)
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn fetch_cart_id(conn: &mut SqliteConnection, user_id: &str) -> DbResult<Option<String>> {
    let id = sqlx::query_scalar("SELECT id FROM orders WHERE user_id = ? AND status = ?")
        .bind(user_id)
        .bind(OrderStatus::Pending)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(id)
}

async fn require_cart(conn: &mut SqliteConnection, user_id: &str) -> DbResult<String> {
    fetch_cart_id(conn, user_id)
        .await?
        .ok_or_else(|| CoreError::CartNotFound(user_id.to_string()).into())
}

/// Claims the user's cart row and returns its id.
///
/// The insert runs first so the transaction takes the write lock before it
/// reads anything. A conflicting pending row is left alone; an unknown user
/// trips the foreign key.
async fn ensure_cart(conn: &mut SqliteConnection, user_id: &str) -> DbResult<String> {
    let now = Utc::now();

    let inserted = sqlx::query(
        "INSERT INTO orders (id, user_id, status, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT DO NOTHING",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(OrderStatus::Pending)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(DbError::from);

    match inserted {
        Ok(result) if result.rows_affected() > 0 => {
            debug!(user_id = %user_id, "Cart created");
        }
        Ok(_) => {}
        Err(DbError::ForeignKeyViolation { .. }) => {
            return Err(CoreError::UserNotFound(user_id.to_string()).into());
        }
        Err(e) => return Err(e),
    }

    fetch_cart_id(conn, user_id)
        .await?
        .ok_or_else(|| DbError::not_found("Cart", user_id))
}

/// Recomputes totals after a line change, deleting the cart when no lines
/// remain.
async fn finish_line_change(
    conn: &mut SqliteConnection,
    cart_id: &str,
    pricing: &PricingPolicy,
) -> DbResult<Option<OrderWithLines>> {
    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_lines WHERE order_id = ?")
        .bind(cart_id)
        .fetch_one(&mut *conn)
        .await?;

    if remaining == 0 {
        sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(cart_id)
            .execute(&mut *conn)
            .await?;
        return Ok(None);
    }

    recompute_totals(conn, cart_id, pricing).await?;
    fetch_with_lines(conn, cart_id).await
}

// =============================================================================
// Unit Tests
// =============================================================================
