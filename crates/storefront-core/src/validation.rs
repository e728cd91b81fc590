//! # Validation Module
//!
//! Input validation for catalog writes, cart operations and order
//! confirmation.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request handling (outside this workspace)                    │
//! │  └── Deserialization, authentication                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (runs before any transaction opens)             │
//! │  ├── Field lengths, quantities, prices                                 │
//! │  └── Delivery info completeness                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0), CHECK (quantity >= 1)                         │
//! │  ├── UNIQUE (invoice order, sequence, number)                          │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::validation::{validate_quantity, validate_product_name};
//!
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_product_name("Yerba 1kg").is_ok());
//! ```

use crate::error::ValidationError;
use crate::types::{DeliveryInfo, NewCustomer, NewProduct, ProductUpdate};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Image extensions accepted for product pictures.
pub const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

// =============================================================================
// String Validators
// =============================================================================

/// Checks that a trimmed field is present and within `min..=max` characters.
///
/// ## Example
/// ```rust
/// use storefront_core::validation::validate_length;
///
/// assert!(validate_length("city", "Rosario", 2, 50).is_ok());
/// assert!(validate_length("city", " ", 2, 50).is_err());
/// ```
pub fn validate_length(field: &str, value: &str, min: usize, max: usize) -> ValidationResult<()> {
    let value = value.trim();
    let len = value.chars().count();

    if len == 0 {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if len < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }

    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product name (2-100 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_length("name", name, 2, 100)
}

/// Validates a product description (10-500 characters).
pub fn validate_description(description: &str) -> ValidationResult<()> {
    validate_length("description", description, 10, 500)
}

/// Validates a category (2-50 characters).
pub fn validate_category(category: &str) -> ValidationResult<()> {
    validate_length("category", category, 2, 50)
}

/// Validates a product image URL.
///
/// ## Rules
/// - Must be an http(s) URL
/// - Must end in one of [`IMAGE_EXTENSIONS`] (case-insensitive)
///
/// ## Example
/// ```rust
/// use storefront_core::validation::validate_image_url;
///
/// assert!(validate_image_url("https://cdn.example.com/mate.PNG").is_ok());
/// assert!(validate_image_url("https://cdn.example.com/mate.bmp").is_err());
/// ```
pub fn validate_image_url(url: &str) -> ValidationResult<()> {
    let url = url.trim().to_lowercase();

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ValidationError::InvalidFormat {
            field: "image_url".to_string(),
            reason: "must be an http or https URL".to_string(),
        });
    }

    if !IMAGE_EXTENSIONS.iter().any(|ext| url.ends_with(ext)) {
        return Err(ValidationError::NotAllowed {
            field: "image_url extension".to_string(),
            allowed: IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns all results)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be at least 1
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cart: Add Item                                                         │
/// │                                                                         │
/// │  User enters quantity: 5                                               │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty < 1?   → Error: "quantity must be between 1 and 999"     │
/// │       │                                                                 │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       │                                                                 │
/// │       └── OK → Proceed with add_item                                   │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
///
/// ## Example
/// ```rust
/// use storefront_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level (non-negative).
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::Negative {
            field: "stock".to_string(),
        });
    }

    Ok(())
}

/// Validates a rate in basis points (0% to 100%).
pub fn validate_rate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size before adding a new line.
///
/// ## Rules
/// - Must stay within MAX_CART_ITEMS (100) distinct lines
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a new product.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&product.name)?;
    validate_description(&product.description)?;
    validate_price_cents(product.price_cents)?;
    validate_stock(product.stock)?;
    validate_category(&product.category)?;
    if let Some(url) = &product.image_url {
        validate_image_url(url)?;
    }
    Ok(())
}

/// Validates the fields present in a partial product update.
pub fn validate_product_update(update: &ProductUpdate) -> ValidationResult<()> {
    if let Some(name) = &update.name {
        validate_product_name(name)?;
    }
    if let Some(description) = &update.description {
        validate_description(description)?;
    }
    if let Some(price) = update.price_cents {
        validate_price_cents(price)?;
    }
    if let Some(stock) = update.stock {
        validate_stock(stock)?;
    }
    if let Some(category) = &update.category {
        validate_category(category)?;
    }
    if let Some(url) = &update.image_url {
        validate_image_url(url)?;
    }
    Ok(())
}

/// Validates a customer record.
pub fn validate_new_customer(customer: &NewCustomer) -> ValidationResult<()> {
    validate_length("first_name", &customer.first_name, 2, 50)?;
    validate_length("last_name", &customer.last_name, 2, 30)?;
    validate_length("national_id", &customer.national_id, 7, 20)?;
    validate_email(&customer.email)?;
    validate_length("phone", &customer.phone, 8, 20)?;
    validate_length("address", &customer.address, 5, 150)?;
    validate_length("city", &customer.city, 2, 50)?;
    validate_length("postal_code", &customer.postal_code, 4, 10)?;
    Ok(())
}

/// Minimal shape check: one `@` with text on both sides and a dot in the
/// domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.contains('@') && domain.contains('.') && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must be a valid email address".to_string(),
        });
    }

    Ok(())
}

/// Validates delivery details supplied at confirmation.
///
/// ## Rules
/// | Field           | Length  |
/// |-----------------|---------|
/// | delivery_method | 2-50    |
/// | address         | 5-200   |
/// | city            | 2-50    |
/// | postal_code     | 4-10    |
/// | phone           | 8-20    |
/// | full_name       | 2-100   |
///
/// `payment_method` is already constrained by its type.
pub fn validate_delivery_info(info: &DeliveryInfo) -> ValidationResult<()> {
    validate_length("delivery_method", &info.delivery_method, 2, 50)?;
    validate_length("address", &info.address, 5, 200)?;
    validate_length("city", &info.city, 2, 50)?;
    validate_length("postal_code", &info.postal_code, 4, 10)?;
    validate_length("phone", &info.phone, 8, 20)?;
    validate_length("full_name", &info.full_name, 2, 100)?;
    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use storefront_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
