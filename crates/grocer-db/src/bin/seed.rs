//! # Seed Data Generator
//!
//! Populates a GrocerDesk database with demo data for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./grocerdesk_dev.db with 12 sales (default)
//! cargo run -p grocer-db --bin seed
//!
//! # Custom number of sales
//! cargo run -p grocer-db --bin seed -- --sales 40
//!
//! # Specify database path
//! cargo run -p grocer-db --bin seed -- --db ./data/grocerdesk.db
//! ```
//!
//! ## Generated Data
//! - One staff account per role (password `changeme1`)
//! - Grocery categories with a handful of products each
//! - A few customers
//! - Sales created through the sale engine, so stock moves like it would
//!   at the till

use grocer_core::{
    CheckoutRequest, LineRequest, Money, NewCustomer, NewProduct, NewStaff, ProductListing, StaffRole,
};
use grocer_db::{Database, DbConfig};
use std::env;

/// Categories and their products: (name, price in cents, stock).
const CATALOG: &[(&str, &[(&str, i64, i64)])] = &[
    (
        "Produce",
        &[
            ("Bananas (1 lb)", 59, 120),
            ("Gala Apples (1 lb)", 149, 90),
            ("Baby Spinach 5oz", 399, 25),
            ("Yellow Onions 3lb", 329, 40),
            ("Avocado", 125, 8),
        ],
    ),
    (
        "Dairy",
        &[
            ("Whole Milk 1gal", 429, 35),
            ("Large Eggs 12ct", 389, 30),
            ("Greek Yogurt 32oz", 599, 18),
            ("Cheddar Block 8oz", 349, 22),
            ("Salted Butter 1lb", 499, 6),
        ],
    ),
    (
        "Bakery",
        &[
            ("Sourdough Loaf", 549, 12),
            ("Whole Wheat Bread", 329, 20),
            ("Bagels 6ct", 399, 15),
            ("Croissant", 189, 0),
        ],
    ),
    (
        "Pantry",
        &[
            ("Long Grain Rice 2lb", 279, 60),
            ("Spaghetti 1lb", 169, 75),
            ("Black Beans 15oz", 119, 80),
            ("Olive Oil 500ml", 899, 14),
            ("Peanut Butter 16oz", 349, 9),
        ],
    ),
    (
        "Beverages",
        &[
            ("Orange Juice 52oz", 449, 24),
            ("Sparkling Water 12pk", 599, 30),
            ("Ground Coffee 12oz", 899, 16),
        ],
    ),
];

const CUSTOMERS: &[(&str, Option<&str>, Option<&str>)] = &[
    ("Maria Lopez", Some("maria.lopez@example.com"), Some("555-201-3344")),
    ("James Chen", Some("james.chen@example.com"), None),
    ("Priya Natarajan", None, Some("555-867-1200")),
    ("Tom O'Brien", Some("tom.obrien@example.com"), Some("+1 555 330 9087")),
];

const STAFF: &[(&str, &str, StaffRole)] = &[
    ("Store Admin", "admin@grocerdesk.local", StaffRole::Admin),
    ("Floor Manager", "manager@grocerdesk.local", StaffRole::Manager),
    ("Front Cashier", "cashier@grocerdesk.local", StaffRole::Cashier),
];

const DEMO_PASSWORD: &str = "changeme1";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut sales: usize = 12;
    let mut db_path = String::from("./grocerdesk_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sales = args[i + 1].parse().unwrap_or(12);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("GrocerDesk Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --sales <N>    Number of sales to create (default: 12)");
                println!("  -d, --db <PATH>    Database file path (default: ./grocerdesk_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 GrocerDesk Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!("Sales:    {}", sales);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.categories().list().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} categories", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Staff
    println!();
    println!("Creating staff...");
    for (name, email, role) in STAFF {
        db.staff()
            .create(NewStaff {
                name: name.to_string(),
                email: email.to_string(),
                password: DEMO_PASSWORD.to_string(),
                role: Some(*role),
            })
            .await?;
        println!("  {} <{}> ({})", name, email, role);
    }

    // Catalog
    println!();
    println!("Creating catalog...");
    let mut product_count = 0;
    for (category_name, products) in CATALOG {
        let category = db.categories().create(category_name).await?;

        for (name, price_cents, stock) in products.iter() {
            db.products()
                .create(NewProduct {
                    name: name.to_string(),
                    price: Money::from_cents(*price_cents),
                    stock: Some(*stock),
                    category_id: Some(category.id.clone()),
                })
                .await?;
            product_count += 1;
        }
    }
    println!("  {} categories, {} products", CATALOG.len(), product_count);

    // Customers
    println!();
    println!("Creating customers...");
    let mut customer_ids = Vec::with_capacity(CUSTOMERS.len());
    for (name, email, phone) in CUSTOMERS {
        let customer = db
            .customers()
            .create(NewCustomer {
                name: name.to_string(),
                email: email.map(str::to_string),
                phone: phone.map(str::to_string),
                address: None,
            })
            .await?;
        customer_ids.push(customer.id);
    }
    println!("  {} customers", customer_ids.len());

    // Sales
    println!();
    println!("Ringing up sales...");
    let products: Vec<ProductListing> = db.products().list().await?;
    let mut committed = 0;
    let mut rejected = 0;

    for n in 0..sales {
        let lines = (0..1 + n % 3)
            .map(|k| {
                let product = &products[(n * 7 + k * 5) % products.len()];
                LineRequest::new(&product.product.id, 1 + ((n + k) % 3) as i64)
            })
            .collect();

        // Every third sale is a walk-in.
        let request = if n % 3 == 2 {
            CheckoutRequest::walk_in(lines)
        } else {
            CheckoutRequest::for_customer(&customer_ids[n % customer_ids.len()], lines)
        };

        match db.engine().checkout(request).await {
            Ok(receipt) => {
                committed += 1;
                println!("  sale {} total {}", receipt.sale_id, receipt.total);
            }
            Err(e) => {
                rejected += 1;
                println!("  skipped: {}", e);
            }
        }
    }

    let summary = db.reports().summary(Default::default()).await?;

    println!();
    println!("✓ {} sales committed, {} rejected", committed, rejected);
    println!("  Revenue: {}  Average sale: {}", summary.revenue, summary.average_sale);
    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
