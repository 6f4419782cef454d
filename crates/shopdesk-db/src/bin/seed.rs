//! # Seed Data Generator
//!
//! Populates a fresh database with a demo catalog, ledger accounts, a staff
//! user and a customer.
//!
//! ## Usage
//! ```bash
//! # Use the configured database (shopdesk.toml / SHOPDESK_DB_PATH)
//! cargo run -p shopdesk-db --bin seed
//!
//! # Specify a config file or database path
//! cargo run -p shopdesk-db --bin seed -- --config ./shopdesk.toml
//! cargo run -p shopdesk-db --bin seed -- --db ./data/shopdesk.db
//! ```
//!
//! Skips seeding when the catalog already has products.

use std::env;
use std::path::PathBuf;

use shopdesk_core::{
    AccountStatus, AccountType, Designation, NewAccount, NewParty, NewProduct, NewStaffUser,
    ProductUnit,
};
use shopdesk_db::{AppConfig, Database};
use tracing_subscriber::EnvFilter;

/// (name, item code, unit, purchase price, sale price, opening stock, low-stock threshold)
const PRODUCTS: &[(&str, &str, ProductUnit, i64, i64, i64, i64)] = &[
    ("Basmati Rice 5kg", "RICE-5", ProductUnit::Pcs, 48_000, 56_000, 40, 5),
    ("Toor Dal 1kg", "DAL-1", ProductUnit::Pcs, 12_500, 14_900, 60, 10),
    ("Sunflower Oil 1L", "OIL-1", ProductUnit::Pcs, 13_000, 15_500, 48, 12),
    ("Tea Leaves 500g", "TEA-500", ProductUnit::Pcs, 21_000, 26_000, 30, 6),
    ("Sugar 1kg", "SUG-1", ProductUnit::Pcs, 4_200, 4_800, 100, 20),
    ("Cotton Cloth", "CLOTH-M", ProductUnit::Mtr, 9_000, 12_000, 250, 25),
    ("Detergent Box", "DET-BOX", ProductUnit::Box, 32_000, 39_900, 15, 3),
    ("Notebook 200pg", "NB-200", ProductUnit::Nos, 3_500, 5_000, 120, 20),
];

/// (name, type, opening balance)
const ACCOUNTS: &[(&str, AccountType, i64)] = &[
    ("Cash Counter", AccountType::Cash, 500_000),
    ("Shop QR", AccountType::QrCode, 0),
    ("Card Gateway", AccountType::Gateway, 0),
    ("Current Account", AccountType::Bank, 2_500_000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,shopdesk=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shopdesk Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -d, --db <PATH>      Database file path (overrides config)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = AppConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = path;
    }

    println!("🌱 Shopdesk Seed Data Generator");
    println!("===============================");
    println!("Database: {}", config.database.path.display());
    println!();

    let db = Database::new(config.db_config()).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let walk_in = db
        .parties()
        .ensure_walk_in(&config.settlement.walk_in_party_id)
        .await?;
    println!("✓ Walk-in party: {}", walk_in.id);

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (name, code, unit, purchase, sale, stock, threshold) in PRODUCTS {
        let product = db
            .products()
            .create(&NewProduct {
                name: name.to_string(),
                item_code: Some(code.to_string()),
                unit: *unit,
                purchase_price_cents: *purchase,
                sale_price_cents: *sale,
                min_sale_price_cents: None,
                mrp_cents: Some(sale + sale / 10),
                sale_discount_bps: None,
                low_stock_threshold: Some(*threshold),
                opening_stock: *stock,
                track_inventory: true,
            })
            .await?;
        println!("  + product {} ({})", product.name, product.id);
    }

    for (name, account_type, opening) in ACCOUNTS {
        let account = db
            .accounts()
            .create(&NewAccount {
                name: name.to_string(),
                account_type: *account_type,
                account_number: None,
                ifsc_code: None,
                branch: None,
                opening_balance_cents: *opening,
                status: AccountStatus::Active,
            })
            .await?;
        println!("  + account {} ({})", account.name, account.id);
    }

    let staff = db
        .staff()
        .create(&NewStaffUser {
            name: "Counter Staff".to_string(),
            email: "counter@shopdesk.local".to_string(),
        })
        .await?;
    println!("  + staff {} ({})", staff.email, staff.id);

    let customer = db
        .parties()
        .create(&NewParty {
            name: "Meera Iyer".to_string(),
            mobile_number: "9876543210".to_string(),
            email: None,
            address: "4 Temple Street".to_string(),
            designation: Designation::Customer,
        })
        .await?;
    println!("  + customer {} ({})", customer.name, customer.id);

    let supplier = db
        .parties()
        .create(&NewParty {
            name: "Sharma Wholesale".to_string(),
            mobile_number: "9812345678".to_string(),
            email: Some("orders@sharma.in".to_string()),
            address: "12 Market Yard".to_string(),
            designation: Designation::Supplier,
        })
        .await?;
    println!("  + supplier {} ({})", supplier.name, supplier.id);

    println!();
    println!(
        "✓ Seeded {} products, {} accounts",
        PRODUCTS.len(),
        ACCOUNTS.len()
    );

    db.close().await;

    Ok(())
}
