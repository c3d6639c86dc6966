//! # Domain Types
//!
//! Core domain types used throughout GrocerDesk.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │◄──│    Product      │◄──│  SaleLineItem   │       │
//! │  │  id, name       │   │  price, stock   │   │  unit_price     │       │
//! │  └─────────────────┘   └─────────────────┘   │  (snapshot)     │       │
//! │                                              └────────┬────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐            │ owned by       │
//! │  │    Customer     │◄──│      Sale       │◄───────────┘                │
//! │  │  (optional ref) │   │  total          │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │  Staff / Role   │  admin | manager | cashier                        │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Weak references (`Product.category_id`, `SaleLineItem.product_id`,
//! `Sale.customer_id`) are plain ids; the stores check existence at write time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::update::FieldUpdate;

// =============================================================================
// Category
// =============================================================================

/// A product category ("Dairy", "Bakery").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    /// Unique, at least two characters.
    pub name: String,
}

/// Per-category catalog statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CategoryStats {
    pub category_id: String,
    pub name: String,
    pub product_count: i64,
    pub total_stock: i64,
    /// Mean unit price of the products in this category.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "average_price_cents"))]
    pub average_price: Money,
    /// Σ price × stock.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "stock_value_cents"))]
    pub stock_value: Money,
}

// =============================================================================
// Product
// =============================================================================

/// A product on the shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to the cashier.
    pub name: String,

    /// Current unit price. Sales snapshot this value.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "price_cents"))]
    pub price: Money,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// Optional weak reference to a category.
    pub category_id: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks if the requested quantity can be taken from stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity > 0 && self.stock >= quantity
    }

    /// Value of the units on hand at the current price.
    pub fn stock_value(&self) -> Money {
        self.price.multiply_quantity(self.stock)
    }
}

/// A product joined with its category name, as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductListing {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub product: Product,

    pub category_name: Option<String>,
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    /// Defaults to zero when not given.
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub category_id: Option<String>,
}

/// Partial update of a product.
///
/// `category_id: FieldUpdate::Clear` detaches the product from its category;
/// clearing any other field is a validation error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: FieldUpdate<String>,
    #[serde(default)]
    pub price: FieldUpdate<Money>,
    #[serde(default)]
    pub stock: FieldUpdate<i64>,
    #[serde(default)]
    pub category_id: FieldUpdate<String>,
}

impl ProductUpdate {
    /// Returns true if the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_unchanged()
            && self.price.is_unchanged()
            && self.stock.is_unchanged()
            && self.category_id.is_unchanged()
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A store customer. Sales may reference zero or one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// Unique when present.
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Input for creating a customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Partial update of a customer. Optional contact fields may be cleared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerUpdate {
    #[serde(default)]
    pub name: FieldUpdate<String>,
    #[serde(default)]
    pub email: FieldUpdate<String>,
    #[serde(default)]
    pub phone: FieldUpdate<String>,
    #[serde(default)]
    pub address: FieldUpdate<String>,
}

// =============================================================================
// Staff
// =============================================================================

/// Role of a staff account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "TEXT", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum StaffRole {
    Admin,
    Manager,
    #[default]
    Cashier,
}

impl StaffRole {
    /// All roles, most privileged first.
    pub const ALL: [StaffRole; 3] = [StaffRole::Admin, StaffRole::Manager, StaffRole::Cashier];

    /// Lowercase name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Admin => "admin",
            StaffRole::Manager => "manager",
            StaffRole::Cashier => "cashier",
        }
    }
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StaffRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(StaffRole::Admin),
            "manager" => Ok(StaffRole::Manager),
            "cashier" => Ok(StaffRole::Cashier),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: StaffRole::ALL.iter().map(|r| r.as_str().to_string()).collect(),
            }),
        }
    }
}

/// A staff account. The password hash never leaves the database layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Staff {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: StaffRole,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Input for creating a staff account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStaff {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Defaults to cashier.
    #[serde(default)]
    pub role: Option<StaffRole>,
}

/// Partial update of a staff account. All fields are required columns,
/// so none of them may be cleared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffUpdate {
    #[serde(default)]
    pub name: FieldUpdate<String>,
    #[serde(default)]
    pub email: FieldUpdate<String>,
    #[serde(default)]
    pub role: FieldUpdate<StaffRole>,
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale. Never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// `None` for walk-in sales.
    pub customer_id: Option<String>,
    /// Sum of the line subtotals, computed by the engine.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "total_cents"))]
    pub total: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A line item in a sale.
/// Uses the snapshot pattern: `unit_price` is the product price at the
/// moment of sale and is never re-read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleLineItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Position of the line in the checkout request.
    pub line_no: i64,
    pub quantity: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "unit_price_cents"))]
    pub unit_price: Money,
    /// `quantity × unit_price`.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "subtotal_cents"))]
    pub subtotal: Money,
}

/// A sale together with its line items, in line order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRecord {
    pub sale: Sale,
    pub items: Vec<SaleLineItem>,
}

impl SaleRecord {
    /// Total quantity across all lines.
    pub fn units(&self) -> i64 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Checks `total == Σ subtotal` and `subtotal == quantity × unit_price`.
    pub fn is_consistent(&self) -> bool {
        let lines_ok = self
            .items
            .iter()
            .all(|item| item.subtotal == item.unit_price.multiply_quantity(item.quantity));
        let total: Money = self.items.iter().map(|item| item.subtotal).sum();
        lines_ok && total == self.sale.total
    }
}

/// Sale header with customer display fields, as shown in sale detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleHeader {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "id"))]
    pub sale_id: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "total_cents"))]
    pub total: Money,
}

/// A line of the sale detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleDetailItem {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "id"))]
    pub line_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "unit_price_cents"))]
    pub price: Money,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "subtotal_cents"))]
    pub subtotal: Money,
}

/// `{ sale: {...}, items: [...] }` response of a sale lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDetail {
    pub sale: SaleHeader,
    pub items: Vec<SaleDetailItem>,
}

// =============================================================================
// Unit Tests
// =============================================================================
