//! Shared fixtures for database tests.

use crate::{Database, DbConfig};
use grocer_core::{Customer, Money, NewCustomer, NewProduct, Product};

/// Fresh in-memory database with migrations applied.
pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// Uncategorized product with the given price and stock.
pub(crate) async fn add_product(db: &Database, name: &str, price_cents: i64, stock: i64) -> Product {
    db.products()
        .create(NewProduct {
            name: name.to_string(),
            price: Money::from_cents(price_cents),
            stock: Some(stock),
            category_id: None,
        })
        .await
        .unwrap()
}

/// Customer with only a name.
pub(crate) async fn add_customer(db: &Database, name: &str) -> Customer {
    db.customers()
        .create(NewCustomer {
            name: name.to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
}
