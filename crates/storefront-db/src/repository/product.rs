//! # Product Repository
//!
//! The catalog store: product reads, writes and stock movements.
//!
//! ## Key Operations
//! - Search by text and category
//! - CRUD operations with validation
//! - Atomic conditional stock movements
//!
//! ## Conditional Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Why the check lives inside the UPDATE                   │
//! │                                                                         │
//! │  Two confirmations, stock = 3, each wants 2                            │
//! │                                                                         │
//! │  tx A: UPDATE products SET stock = stock - 2                           │
//! │        WHERE id = ? AND stock >= 2          → 1 row, stock = 1         │
//! │  tx B: UPDATE products SET stock = stock - 2                           │
//! │        WHERE id = ? AND stock >= 2          → 0 rows                   │
//! │        → InsufficientStock, tx B rolls back                            │
//! │                                                                         │
//! │  A read-then-write check would let both pass.                          │
//! │  CHECK (stock >= 0) in the schema is the last line.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use storefront_core::validation::{
    validate_new_product, validate_product_update, validate_search_query,
};
use storefront_core::{
    CoreError, NewProduct, Product, ProductUpdate, ValidationError, ALL_CATEGORIES,
};

const PRODUCT_COLUMNS: &str =
    "id, name, description, price_cents, stock, category, image_url, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let results = repo.search("mate", Some("bazar")).await?;
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists every product ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Searches products by name or description.
    ///
    /// ## Arguments
    /// * `query` - Case-insensitive substring; empty matches everything
    /// * `category` - Exact category, or `None` / `"todos"` for all
    pub async fn search(&self, query: &str, category: Option<&str>) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query)?;
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(ALL_CATEGORIES));

        debug!(query = %query, category = ?category, "Searching products");

        let pattern = format!("%{}%", escape_like(&fold(&query)));

        let products = match category {
            Some(category) => {
                sqlx::query_as::<_, Product>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products
                     WHERE search_text LIKE ? ESCAPE '\\' AND category = ?
                     ORDER BY name"
                ))
                .bind(&pattern)
                .bind(category)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Product>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products
                     WHERE search_text LIKE ? ESCAPE '\\'
                     ORDER BY name"
                ))
                .bind(&pattern)
                .fetch_all(&self.pool)
                .await?
            }
        };

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Lists the products of one category.
    pub async fn list_by_category(&self, category: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category = ? ORDER BY name"
        ))
        .bind(category.trim())
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product after validating it.
    pub async fn insert(&self, product: NewProduct) -> DbResult<Product> {
        validate_new_product(&product)?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, name = %product.name, "Inserting product");

        sqlx::query(
            "INSERT INTO products
                (id, name, description, price_cents, stock, category, image_url, search_text,
                 created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(product.name.trim())
        .bind(product.description.trim())
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.category.trim())
        .bind(product.image_url.as_deref().map(str::trim))
        .bind(search_text(&product.name, &product.description))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", &id))
    }

    /// Applies a partial update.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - The updated product
    /// * `Ok(None)` - No product with that id
    pub async fn update(&self, id: &str, update: ProductUpdate) -> DbResult<Option<Product>> {
        validate_product_update(&update)?;

        debug!(id = %id, "Updating product");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE products SET
                name        = COALESCE(?, name),
                description = COALESCE(?, description),
                price_cents = COALESCE(?, price_cents),
                stock       = COALESCE(?, stock),
                category    = COALESCE(?, category),
                image_url   = COALESCE(?, image_url),
                updated_at  = ?
             WHERE id = ?",
        )
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.description.as_deref().map(str::trim))
        .bind(update.price_cents)
        .bind(update.stock)
        .bind(update.category.as_deref().map(str::trim))
        .bind(update.image_url.as_deref().map(str::trim))
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let product = fetch_product(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        sqlx::query("UPDATE products SET search_text = ? WHERE id = ?")
            .bind(search_text(&product.name, &product.description))
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(product))
    }

    /// Deletes a product.
    ///
    /// Refused with `ProductInUse` while any order line references it.
    ///
    /// ## Returns
    /// The deleted product, or `None` if it did not exist.
    pub async fn delete(&self, id: &str) -> DbResult<Option<Product>> {
        let mut tx = self.pool.begin().await?;

        let Some(product) = fetch_product(&mut tx, id).await? else {
            return Ok(None);
        };

        let references: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM order_lines WHERE product_id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if references > 0 {
            return Err(CoreError::ProductInUse(id.to_string()).into());
        }

        sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, name = %product.name, "Product deleted");
        Ok(Some(product))
    }

    /// Moves stock by `delta` (negative takes, positive restores).
    ///
    /// ## Errors
    /// * `ProductNotFound` - unknown id
    /// * `InsufficientStock` - the result would be negative
    /// * `ValidationFailed` - the result would not fit in an `i64`
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<Product> {
        let mut tx = self.pool.begin().await?;

        match delta.checked_neg() {
            Some(quantity) if delta < 0 => take_stock(&mut tx, id, quantity).await?,
            Some(_) => return_stock(&mut tx, id, delta).await?,
            // i64::MIN is more than any stored stock
            None => return Err(shortage(&mut tx, id, i64::MAX).await),
        }

        let product = fetch_product(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

        tx.commit().await?;

        debug!(id = %id, delta, stock = product.stock, "Stock adjusted");
        Ok(product)
    }

    /// Products with `stock <= threshold`, lowest first.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE stock <= ? ORDER BY stock, name"
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}

// =============================================================================
// Transaction helpers (shared with the cart and order engines)
// =============================================================================

/// Reads a product on an open connection or transaction.
pub(crate) async fn fetch_product(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

/// Takes `quantity` units if, and only if, that many are on hand.
pub(crate) async fn take_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE products SET stock = stock - ?, updated_at = ?
         WHERE id = ? AND stock >= ?",
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(product_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    // Nothing updated: either the product is gone or stock is short.
    Err(shortage(conn, product_id, quantity).await)
}

async fn shortage(conn: &mut SqliteConnection, product_id: &str, requested: i64) -> DbError {
    match fetch_product(conn, product_id).await {
        Ok(Some(product)) => CoreError::InsufficientStock {
            product_id: product.id,
            product_name: product.name,
            available: product.stock,
            requested,
        }
        .into(),
        Ok(None) => CoreError::ProductNotFound(product_id.to_string()).into(),
        Err(e) => e,
    }
}

/// Gives `quantity` units back.
pub(crate) async fn return_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE products SET stock = stock + ?, updated_at = ?
         WHERE id = ? AND stock <= ?",
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(product_id)
    .bind(i64::MAX.saturating_sub(quantity))
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    if fetch_product(conn, product_id).await?.is_none() {
        return Err(CoreError::ProductNotFound(product_id.to_string()).into());
    }
    Err(CoreError::from(ValidationError::OutOfRange {
        field: "stock".to_string(),
        min: 0,
        max: i64::MAX,
    })
    .into())
}

/// Case folding shared by stored search text and queries. SQLite's `lower()`
/// only folds ASCII, so both sides are folded here.
fn fold(text: &str) -> String {
    text.trim().to_lowercase()
}

fn search_text(name: &str, description: &str) -> String {
    format!("{}\n{}", fold(name), fold(description))
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{customer, new_product, test_db};
    use storefront_core::ErrorKind;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.products();

        let product = repo.insert(new_product("Mate imperial", 450_000, 10)).await.unwrap();
        assert_eq!(product.price_cents, 450_000);
        assert_eq!(product.stock, 10);

        let fetched = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Mate imperial");
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_product() {
        let db = test_db().await;
        let product = new_product("X", 100, 1);

        let err = db.products().insert(product).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert!(db.products().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_by_text_and_category() {
        let db = test_db().await;
        let repo = db.products();

        let mut bombilla = new_product("Bombilla alpaca", 120_000, 5);
        bombilla.category = "accesorios".to_string();
        repo.insert(bombilla).await.unwrap();
        repo.insert(new_product("Mate imperial", 450_000, 10)).await.unwrap();

        assert_eq!(repo.search("MATE", None).await.unwrap().len(), 1);
        assert_eq!(repo.search("", Some("todos")).await.unwrap().len(), 2);
        assert_eq!(repo.search("", Some("accesorios")).await.unwrap().len(), 1);
        assert!(repo.search("mate", Some("accesorios")).await.unwrap().is_empty());
        assert!(repo.search("100%", None).await.unwrap().is_empty());
        assert_eq!(repo.list_by_category("bazar").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let db = test_db().await;
        let repo = db.products();
        let exito = repo.insert(new_product("Éxito mate", 300_000, 4)).await.unwrap();
        repo.insert(new_product("Yerba 1kg", 300_000, 4)).await.unwrap();

        for query in ["éx", "ÉX", "ÉXITO MATE"] {
            let found = repo.search(query, None).await.unwrap();
            assert_eq!(found.len(), 1, "query {query}");
            assert_eq!(found[0].id, exito.id);
        }

        repo.update(
            &exito.id,
            ProductUpdate {
                name: Some("Ñandú de cerámica".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(repo.search("ÑANDÚ", None).await.unwrap().len(), 1);
        assert_eq!(repo.search("CERÁMICA", None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.insert(new_product("Mate imperial", 450_000, 10)).await.unwrap();

        let updated = repo
            .update(
                &product.id,
                ProductUpdate {
                    price_cents: Some(500_000),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.price_cents, 500_000);
        assert_eq!(updated.name, "Mate imperial");
        assert_eq!(updated.stock, 10);

        assert!(repo.update("missing", ProductUpdate::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_adjust_stock_never_goes_negative() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.insert(new_product("Mate imperial", 450_000, 3)).await.unwrap();

        assert_eq!(repo.adjust_stock(&product.id, -2).await.unwrap().stock, 1);

        let err = repo.adjust_stock(&product.id, -2).await.unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::InsufficientStock { available: 1, requested: 2, .. })
        ));
        assert_eq!(repo.get_by_id(&product.id).await.unwrap().unwrap().stock, 1);

        assert_eq!(repo.adjust_stock(&product.id, 4).await.unwrap().stock, 5);

        let err = repo.adjust_stock("missing", 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_adjust_stock_at_integer_limits() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.insert(new_product("Mate imperial", 450_000, 3)).await.unwrap();

        let err = repo.adjust_stock(&product.id, i64::MIN).await.unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::InsufficientStock { available: 3, .. })
        ));

        let err = repo.adjust_stock(&product.id, i64::MAX).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert_eq!(repo.get_by_id(&product.id).await.unwrap().unwrap().stock, 3);

        let err = repo.adjust_stock("missing", i64::MIN).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_low_stock() {
        let db = test_db().await;
        let repo = db.products();
        repo.insert(new_product("Yerba 1kg", 300_000, 2)).await.unwrap();
        repo.insert(new_product("Mate imperial", 450_000, 50)).await.unwrap();

        let low = repo.low_stock(5).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Yerba 1kg");
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.insert(new_product("Mate imperial", 450_000, 10)).await.unwrap();

        assert!(repo.delete(&product.id).await.unwrap().is_some());
        assert!(repo.delete(&product.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_refused_while_in_a_cart() {
        let db = test_db().await;
        let user = customer(&db).await;
        let product = db.products().insert(new_product("Mate imperial", 450_000, 10)).await.unwrap();
        db.carts().add_item(&user.id, &product.id, 1).await.unwrap();

        let err = db.products().delete(&product.id).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::ProductInUse(_))));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(db.products().get_by_id(&product.id).await.unwrap().is_some());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
    }
}
