//! # Seed Data Generator
//!
//! Creates an admin account and a small liquor-store catalog for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed ./nailed_dev.db with the default admin
//! cargo run -p nailed-db --bin seed
//!
//! # Custom database and admin credentials
//! cargo run -p nailed-db --bin seed -- --db ./data/nailed.db \
//!     --email owner@example.com --password change-me-now
//! ```
//!
//! ## Generated Data
//! - One ADMIN user
//! - One client and one supplier
//! - Products across Whisky, Rum, Gin, Vodka and Wine, loaded through the
//!   bulk import so every opening stock has its "Bulk load" entry

use std::env;
use std::time::Duration;

use nailed_core::import::ImportRow;
use nailed_core::{ClientInput, Role, SupplierInput, UserInput};
use nailed_db::{Database, DbConfig};

/// (category, code prefix, product names, bottle size ml)
const CATALOG: &[(&str, &str, &[&str], i64)] = &[
    (
        "Whisky",
        "WHI",
        &["Highland Single Malt", "Bourbon Reserve", "Rye Classic", "Blended Gold"],
        750,
    ),
    ("Rum", "RUM", &["Dark Navy", "Spiced Caribbean", "White Cane"], 700),
    ("Gin", "GIN", &["London Dry", "Old Tom", "Citrus Botanical"], 700),
    ("Vodka", "VOD", &["Wheat Premium", "Potato Craft"], 1000),
    ("Wine", "WIN", &["Malbec", "Cabernet Sauvignon", "Sauvignon Blanc", "Rose"], 750),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./nailed_dev.db");
    let mut email = String::from("admin@nailed.local");
    let mut password = String::from("admin-password");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--email" | "-e" => {
                if i + 1 < args.len() {
                    email = args[i + 1].clone();
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if i + 1 < args.len() {
                    password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Nailed Inventory Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: ./nailed_dev.db)");
                println!("  -e, --email <EMAIL>      Admin email (default: admin@nailed.local)");
                println!("  -p, --password <PASS>    Admin password (default: admin-password)");
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Nailed Inventory Seed Data Generator");
    println!("====================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.users().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} users", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let admin = db
        .users()
        .create(&UserInput {
            document_number: "ADMIN-1".to_string(),
            full_name: "Store Administrator".to_string(),
            email: email.clone(),
            password: Some(password),
            role: Role::Admin,
            status: true,
        })
        .await?;
    println!("✓ Admin user: {} ({})", admin.email, admin.id);

    db.clients()
        .create(&ClientInput {
            document_number: "CF-0001".to_string(),
            full_name: "Walk-in Customer".to_string(),
            email: None,
            phone: None,
            status: true,
        })
        .await?;
    db.suppliers()
        .create(&SupplierInput {
            document_number: "SUP-0001".to_string(),
            company_name: "Andes Beverage Distributors".to_string(),
            email: Some("orders@andes.example".to_string()),
            phone: Some("555-0199".to_string()),
            status: true,
        })
        .await?;
    println!("✓ Sample client and supplier");

    let rows = catalog_rows();
    let summary = db
        .ledger()
        .import_inventory(&rows, Duration::from_secs(30))
        .await?;
    println!(
        "✓ Imported {} products ({} skipped)",
        summary.created, summary.skipped
    );

    let drift = db.ledger().reconcile().await?;
    println!("✓ Ledger consistent: {}", drift.is_empty());

    println!();
    println!("✓ Seed complete!");
    db.close().await;

    Ok(())
}

/// Builds import rows with deterministic prices and stock.
fn catalog_rows() -> Vec<ImportRow> {
    let mut rows = Vec::new();
    let mut seed: i64 = 0;

    for (category, prefix, names, bottle_size) in CATALOG {
        for (idx, name) in names.iter().enumerate() {
            seed += 1;
            rows.push(ImportRow {
                code: format!("{}-{:03}", prefix, idx + 1),
                name: name.to_string(),
                category: Some(category.to_string()),
                stock: (seed * 7) % 40,
                // $9.99 - $47.49
                price: 999 + (seed * 1_250) % 5_000,
                description: None,
                bottle_size: Some(*bottle_size),
                unit_quantity: None,
            });
        }
    }

    rows
}
