//! Fixtures shared by the repository tests.

use std::path::PathBuf;
use uuid::Uuid;

use storefront_core::{Customer, DeliveryInfo, NewCustomer, NewProduct, PaymentMethod, Product};

use crate::pool::{Database, DbConfig};

/// Fresh, migrated in-memory database.
pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

/// File-backed database with several connections, for tests that need
/// real concurrent writers. Files are removed when the guard drops.
pub(crate) struct FileDb {
    pub db: Database,
    path: PathBuf,
}

impl Drop for FileDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

pub(crate) async fn file_db() -> FileDb {
    let path = std::env::temp_dir().join(format!("storefront-test-{}.db", Uuid::new_v4()));
    let db = Database::new(DbConfig::new(path.clone()).max_connections(4))
        .await
        .expect("file database");
    FileDb { db, path }
}

pub(crate) fn new_product(name: &str, price_cents: i64, stock: i64) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: format!("{name} de primera calidad"),
        price_cents,
        stock,
        category: "bazar".to_string(),
        image_url: None,
    }
}

pub(crate) fn new_customer(email: &str, national_id: &str) -> NewCustomer {
    NewCustomer {
        first_name: "Ana".to_string(),
        last_name: "Pérez".to_string(),
        national_id: national_id.to_string(),
        email: email.to_string(),
        phone: "3415551234".to_string(),
        address: "Av. Pellegrini 1200".to_string(),
        city: "Rosario".to_string(),
        postal_code: "2000".to_string(),
    }
}

pub(crate) fn delivery() -> DeliveryInfo {
    DeliveryInfo {
        delivery_method: "domicilio".to_string(),
        payment_method: PaymentMethod::Card,
        address: "Av. Pellegrini 1200".to_string(),
        city: "Rosario".to_string(),
        postal_code: "2000".to_string(),
        phone: "3415551234".to_string(),
        full_name: "Ana Pérez".to_string(),
    }
}

/// Inserts a customer with a unique email and national id.
pub(crate) async fn customer(db: &Database) -> Customer {
    let tag = Uuid::new_v4().as_u128();
    db.customers()
        .insert(new_customer(
            &format!("{:x}@example.com", tag),
            &format!("{:010}", tag as u32),
        ))
        .await
        .expect("customer")
}

/// Inserts a product priced in whole currency units.
pub(crate) async fn product(db: &Database, name: &str, price_major: i64, stock: i64) -> Product {
    db.products()
        .insert(new_product(name, price_major * 100, stock))
        .await
        .expect("product")
}
