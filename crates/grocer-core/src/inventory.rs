//! # Stock Adjustments
//!
//! Manual stock corrections made from the back office, outside of sales.
//!
//! ```text
//! Add(n)       stock + n
//! Subtract(n)  max(stock - n, 0)
//! Set(n)       n
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::ProductListing;
use crate::validation::{validate_stock, ValidationResult};

/// A manual stock operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "operation", content = "quantity", rename_all = "lowercase")]
#[ts(export)]
pub enum StockOperation {
    Add(i64),
    /// Floors at zero instead of failing.
    Subtract(i64),
    Set(i64),
}

impl StockOperation {
    /// Parses `add | subtract | set` with an amount.
    pub fn parse(operation: &str, quantity: i64) -> ValidationResult<Self> {
        let op = match operation.trim().to_lowercase().as_str() {
            "add" => StockOperation::Add(quantity),
            "subtract" => StockOperation::Subtract(quantity),
            "set" => StockOperation::Set(quantity),
            _ => {
                return Err(ValidationError::NotAllowed {
                    field: "operation".to_string(),
                    allowed: vec!["add".into(), "subtract".into(), "set".into()],
                })
            }
        };
        op.validate()?;
        Ok(op)
    }

    pub fn quantity(&self) -> i64 {
        match *self {
            StockOperation::Add(q) | StockOperation::Subtract(q) | StockOperation::Set(q) => q,
        }
    }

    /// The amount must be a non-negative integer.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_stock(self.quantity())
    }

    /// Returns the new stock level. Never negative.
    pub fn apply(&self, current: i64) -> i64 {
        match *self {
            StockOperation::Add(q) => current.saturating_add(q),
            StockOperation::Subtract(q) => current.saturating_sub(q).max(0),
            StockOperation::Set(q) => q,
        }
    }
}

/// Result of one stock adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockAdjustment {
    pub product_id: String,
    pub name: String,
    pub old_stock: i64,
    pub new_stock: i64,
}

impl StockAdjustment {
    pub fn delta(&self) -> i64 {
        self.new_stock - self.old_stock
    }
}

/// One entry of a bulk stock update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkStockEntry {
    pub product_id: String,
    pub quantity: i64,
    /// Defaults to `set`.
    #[serde(default)]
    pub operation: Option<String>,
}

impl BulkStockEntry {
    pub fn to_operation(&self) -> ValidationResult<StockOperation> {
        StockOperation::parse(self.operation.as_deref().unwrap_or("set"), self.quantity)
    }
}

/// Catalog-wide stock figures.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryOverview {
    pub total_products: i64,
    pub total_stock: i64,
    /// Products with `stock <= threshold`, out-of-stock ones included.
    pub low_stock: i64,
    pub out_of_stock: i64,
    /// Σ price × stock.
    pub total_value: Money,
    pub low_stock_threshold: i64,
}

/// Products needing attention: running low (`0 < stock <= threshold`) and
/// sold out.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockAlerts {
    pub low_stock: Vec<ProductListing>,
    pub out_of_stock: Vec<ProductListing>,
}
