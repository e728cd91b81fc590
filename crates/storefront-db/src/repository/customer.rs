//! # Customer Repository
//!
//! Identity lookup: the customer data orders and invoices print.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use storefront_core::validation::validate_new_customer;
use storefront_core::{Customer, NewCustomer};

const CUSTOMER_COLUMNS: &str =
    "id, first_name, last_name, national_id, email, phone, address, city, postal_code, created_at";

/// Repository for customer records.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Registers a customer.
    ///
    /// ## Errors
    /// * `ValidationFailed` - field lengths or email shape
    /// * `UniqueViolation` - email or national id already registered
    pub async fn insert(&self, customer: NewCustomer) -> DbResult<Customer> {
        validate_new_customer(&customer)?;

        let id = Uuid::new_v4().to_string();
        debug!(id = %id, email = %customer.email, "Inserting customer");

        sqlx::query(
            "INSERT INTO customers
                (id, first_name, last_name, national_id, email, phone, address, city, postal_code, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(customer.first_name.trim())
        .bind(customer.last_name.trim())
        .bind(customer.national_id.trim())
        .bind(customer.email.trim().to_lowercase())
        .bind(customer.phone.trim())
        .bind(customer.address.trim())
        .bind(customer.city.trim())
        .bind(customer.postal_code.trim())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", &id))
    }

    /// Gets a customer by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        fetch_customer(&mut conn, id).await
    }

    /// Lists customers by last name, first name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY last_name, first_name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }
}

/// Reads a customer on an open connection or transaction.
pub(crate) async fn fetch_customer(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Customer>> {
    let customer = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(customer)
}
