//! # grocer-db: Database Layer for GrocerDesk
//!
//! SQLite persistence for the catalog, customers, staff and the sales
//! ledger, plus the sale transaction engine and the reporting aggregator.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GrocerDesk Data Flow                             │
//! │                                                                         │
//! │  grocerdesk sale checkout --line p-1:3                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     grocer-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌───────────────┐    │   │
//! │  │   │   Database    │   │  SaleEngine   │   │ Repositories  │    │   │
//! │  │   │   (pool.rs)   │──►│  checkout     │──►│ products      │    │   │
//! │  │   │               │   │  refund       │   │ sales         │    │   │
//! │  │   │  SqlitePool   │   │  (one tx)     │   │ categories …  │    │   │
//! │  │   └───────────────┘   └───────────────┘   └───────────────┘    │   │
//! │  │                                                                 │   │
//! │  │   ReportRepository (read-only)    Migrations (embedded)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL)                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Catalog, customer, staff and ledger stores
//! - [`engine`] - Atomic checkout and refund
//! - [`report`] - Sales analytics and listings
//!
//! ## Usage
//!
//! ```rust,ignore
//! use grocer_core::{CheckoutRequest, LineRequest};
//! use grocer_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("grocerdesk.db")).await?;
//!
//! let receipt = db
//!     .engine()
//!     .checkout(CheckoutRequest::walk_in(vec![LineRequest::new(&apples.id, 3)]))
//!     .await?;
//!
//! db.engine().refund(&receipt.sale_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod report;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use engine::SaleEngine;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use report::ReportRepository;

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::customer::CustomerRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::staff::StaffRepository;

/// Generates a new entity id (UUID v4).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
