//! # Seed Data Generator
//!
//! Fills an empty database with the bakery's starting catalog.
//!
//! ## Usage
//! ```bash
//! cargo run -p sonho-db --bin seed
//!
//! # Specify database path
//! cargo run -p sonho-db --bin seed -- --db ./data/sonho.db
//! ```
//!
//! Skips seeding when the database already has products.

use std::env;

use sonho_core::{Category, ProductDraft};
use sonho_db::{CatalogStore, Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (name, price in centavos, stock, image)
const CATALOG: &[(Category, &[(&str, i64, i64, &str)])] = &[
    (
        Category::Paes,
        &[
            ("Pão Francês", 50, 200, "🥖"),
            ("Pão de Forma Caseiro", 1200, 15, "🍞"),
            ("Pão Integral", 1400, 12, "🍞"),
            ("Baguete", 900, 20, "🥖"),
            ("Croissant", 750, 24, "🥐"),
        ],
    ),
    (
        Category::Doces,
        &[
            ("Sonho de Creme", 450, 30, "🍩"),
            ("Brigadeiro", 250, 60, "🍫"),
            ("Quindim", 500, 18, "🍮"),
            ("Pudim (fatia)", 800, 10, "🍮"),
        ],
    ),
    (
        Category::Salgados,
        &[
            ("Coxinha", 700, 40, "🍗"),
            ("Pão de Queijo", 150, 80, "🧀"),
            ("Empada de Frango", 650, 25, "🥧"),
            ("Esfiha de Carne", 600, 30, "🥟"),
        ],
    ),
    (
        Category::Bolos,
        &[
            ("Bolo de Cenoura", 3500, 4, "🎂"),
            ("Bolo de Fubá", 3000, 3, "🍰"),
            ("Bolo de Chocolate", 4500, 2, "🎂"),
        ],
    ),
    (
        Category::Bebidas,
        &[
            ("Café Expresso", 500, 100, "☕"),
            ("Suco de Laranja", 800, 30, "🍊"),
            ("Refrigerante Lata", 600, 48, "🥤"),
        ],
    ),
];

fn print_help() {
    println!("Sonho Doce Seed Data Generator");
    println!();
    println!("Usage: seed [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -d, --db <PATH>    Database file path (default: ./sonho.db)");
    println!("  -h, --help         Show this help message");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./sonho.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-d" | "--db" => {
                if let Some(path) = args.get(i + 1) {
                    db_path = path.clone();
                    i += 1;
                }
            }
            "-h" | "--help" => {
                print_help();
                return Ok(());
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(path = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let products = db.products();

    let existing = products.count().await?;
    if existing > 0 {
        warn!(existing = existing, "Database already has products, skipping seed");
        return Ok(());
    }

    let mut inserted = 0;
    for (category, items) in CATALOG {
        for (name, price_cents, stock, image) in items.iter() {
            let draft = ProductDraft {
                name: name.to_string(),
                price_cents: *price_cents,
                category: *category,
                stock: *stock,
                image: image.to_string(),
            };

            match products.insert(&draft).await {
                Ok(_) => inserted += 1,
                Err(e) => warn!(name = %name, error = %e, "Failed to insert product"),
            }
        }
    }

    info!(inserted = inserted, "Seed complete");
    db.close().await;
    Ok(())
}
