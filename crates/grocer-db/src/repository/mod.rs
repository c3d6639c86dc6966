//! # Repository Module
//!
//! Database repository implementations for GrocerDesk.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CLI command                                                            │
//! │       │  db.products().low_stock(10)                                    │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── pool-scoped: list, get, create, update, delete, adjust_stock …    │
//! │  └── tx-scoped:   fetch, claim_stock, restore_stock                    │
//! │       │                  (take &mut SqliteConnection so the engine     │
//! │       │                   can run them inside its transaction)         │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`category::CategoryRepository`] - Category CRUD and stats
//! - [`product::ProductRepository`] - Catalog Store: products and stock
//! - [`customer::CustomerRepository`] - Customers and search
//! - [`staff::StaffRepository`] - Staff accounts and credentials
//! - [`sale::SaleRepository`] - Ledger Store: sales and line items

pub mod category;
pub mod customer;
pub mod product;
pub mod sale;
pub mod staff;

/// Escapes `%`, `_` and `\` for a `LIKE … ESCAPE '\'` pattern.
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like(r"50%_off\"), r"50\%\_off\\");
        assert_eq!(escape_like("milk"), "milk");
    }
}
