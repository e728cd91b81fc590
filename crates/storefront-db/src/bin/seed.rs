//! # Seed Data Generator
//!
//! Populates the database with demo customers and a product catalog for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by STOREFRONT_DB_PATH (default ./storefront.db)
//! cargo run -p storefront-db --bin seed
//!
//! # Specify database path
//! cargo run -p storefront-db --bin seed -- --db ./data/shop.db
//!
//! # More output
//! RUST_LOG=debug cargo run -p storefront-db --bin seed
//! ```
//!
//! Each catalog entry is expanded into a few size variants with a price
//! addon; stock cycles between 0 and 40 so critical-stock reports have
//! something to show.

use std::env;
use std::time::Instant;

use storefront_core::{NewCustomer, NewProduct};
use storefront_db::{Database, DbError, StoreConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (category, [(name, base price in cents, image file)])
const CATALOG: &[(&str, &[(&str, i64, &str)])] = &[
    (
        "bazar",
        &[
            ("Mate de calabaza", 850_000, "mate.jpg"),
            ("Termo acero", 2_450_000, "termo.png"),
            ("Bombilla alpaca", 420_000, "bombilla.jpg"),
            ("Yerbera de madera", 380_000, "yerbera.webp"),
        ],
    ),
    (
        "almacen",
        &[
            ("Yerba mate suave", 310_000, "yerba.jpg"),
            ("Dulce de leche", 190_000, "dulce.jpg"),
            ("Alfajores surtidos", 260_000, "alfajores.png"),
        ],
    ),
    (
        "textil",
        &[
            ("Poncho de lana", 5_200_000, "poncho.jpg"),
            ("Manta tejida", 3_100_000, "manta.jpeg"),
        ],
    ),
];

/// Size variants and their price addon in cents.
const SIZES: &[(&str, i64)] = &[("chico", 0), ("mediano", 150_000), ("grande", 300_000)];

const CUSTOMERS: &[(&str, &str, &str, &str, &str)] = &[
    ("Ana", "Pérez", "30111222", "ana.perez@example.com", "Rosario"),
    ("Bruno", "Gómez", "28999111", "bruno.gomez@example.com", "Córdoba"),
    ("Carla", "Díaz", "35123456", "carla.diaz@example.com", "Mendoza"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = StoreConfig::from_env()?;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if let Some(path) = args.get(i + 1) {
                    config.database_path = path.into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Storefront Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $STOREFRONT_DB_PATH)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(path = %config.database_path.display(), "Seeding database");
    let db = Database::new(config.db_config()).await?;

    seed_customers(&db).await?;

    let existing = db.products().list().await?.len();
    if existing > 0 {
        info!(existing, "Catalog already populated, skipping products");
        return Ok(());
    }

    let start = Instant::now();
    let mut generated = 0usize;

    for (category, products) in CATALOG {
        for (name, base_price, image) in products.iter() {
            for (size, addon) in SIZES {
                let product = NewProduct {
                    name: format!("{name} {size}"),
                    description: format!("{name} tamaño {size}, producto artesanal"),
                    price_cents: base_price + addon,
                    stock: ((generated * 7) % 41) as i64,
                    category: category.to_string(),
                    image_url: Some(format!("https://cdn.example.com/img/{image}")),
                };

                if let Err(e) = db.products().insert(product).await {
                    warn!(name = %name, size = %size, error = %e, "Failed to insert product");
                    continue;
                }
                generated += 1;
            }
        }
    }

    info!(generated, elapsed = ?start.elapsed(), "Catalog seeded");

    let critical = db.reports().critical_stock(config.low_stock_threshold).await?;
    info!(
        critical = critical.len(),
        threshold = config.low_stock_threshold,
        "Critical stock check"
    );

    db.close().await;
    Ok(())
}

async fn seed_customers(db: &Database) -> Result<(), DbError> {
    for (first_name, last_name, national_id, email, city) in CUSTOMERS {
        let customer = NewCustomer {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            national_id: national_id.to_string(),
            email: email.to_string(),
            phone: "3415550000".to_string(),
            address: "Calle Falsa 123".to_string(),
            city: city.to_string(),
            postal_code: "2000".to_string(),
        };

        match db.customers().insert(customer).await {
            Ok(c) => info!(id = %c.id, email = %c.email, "Customer created"),
            Err(DbError::UniqueViolation { .. }) => {
                info!(email = %email, "Customer already present");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
