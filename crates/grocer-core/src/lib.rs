//! # grocer-core: Pure Business Logic for GrocerDesk
//!
//! This crate holds the domain model and every business rule that can be
//! expressed without touching a database.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GrocerDesk Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Dashboard / POS UI  (out of tree)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 apps/backoffice (`grocerdesk`)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ grocer-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ checkout  │  │  report   │  │   │
//! │  │   │  Product  │  │   Money   │  │PricedLine │  │  Window   │  │   │
//! │  │   │   Sale    │  │           │  │SaleTotals │  │  Paging   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  grocer-db (Database Layer)                     │   │
//! │  │        SQLite stores, sale transaction engine, reports          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Category, Product, Customer, Staff, Sale)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`checkout`] - Checkout requests, price snapshots and sale totals
//! - [`inventory`] - Stock adjustment operations
//! - [`report`] - Report windows, report rows and pagination math
//! - [`update`] - Partial-update field semantics
//! - [`error`] - Domain error taxonomy
//! - [`validation`] - Input validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use grocer_core::money::Money;
//!
//! let price = Money::parse_decimal("2.00").unwrap();
//! let subtotal = price.multiply_quantity(3);
//!
//! assert_eq!(subtotal.cents(), 600);
//! assert_eq!(subtotal.to_string(), "$6.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod inventory;
pub mod money;
pub mod report;
pub mod types;
pub mod update;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{
    CheckoutReceipt, CheckoutRequest, LineRequest, PricedLine, RefundReceipt, SaleTotals,
};
pub use error::{CoreError, CoreResult, EntityKind, ErrorKind, ValidationError};
pub use inventory::{BulkStockEntry, InventoryOverview, StockAdjustment, StockAlerts, StockOperation};
pub use money::Money;
pub use report::{
    DailySales, HourlySales, InventoryMovement, Pagination, ReportWindow, SaleFilter, SaleListing,
    SalePage, SalesAnalytics, SalesSummary, TopProduct,
};
pub use types::*;
pub use update::FieldUpdate;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of line items in a single checkout.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity of a single line item.
///
/// Catches typos at the register (1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest accepted unit price in cents ($10,000,000.00).
///
/// Keeps `MAX_SALE_LINES × MAX_ITEM_QUANTITY × price` well inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;

/// Default stock level at or below which a product counts as "low stock".
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// Minimum length of category and product names.
pub const MIN_NAME_LENGTH: usize = 2;
