//! # Error Types
//!
//! The closed error taxonomy shared by every GrocerDesk layer.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  grocer-core errors (this file)                                        │
//! │  ├── CoreError        - What callers branch on (closed set of kinds)   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  grocer-db errors (separate crate)                                     │
//! │  └── DbError          - sqlx failures, converted into CoreError        │
//! │                                                                         │
//! │  backoffice errors (in app)                                            │
//! │  └── AppError         - {code, message} printed by the CLI             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ← DbError;  CoreError → AppError    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, amounts, field names)
//! 3. Errors are enum variants, never String matching
//! 4. Every variant maps to exactly one [`ErrorKind`]

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Entity Kind
// =============================================================================

/// The kind of entity a `NotFound` error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Category,
    Product,
    Customer,
    Staff,
    Sale,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Category => "Category",
            EntityKind::Product => "Product",
            EntityKind::Customer => "Customer",
            EntityKind::Staff => "Staff",
            EntityKind::Sale => "Sale",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Error Kind
// =============================================================================

/// Classification of a [`CoreError`].
///
/// Transport layers map these to status codes; nothing should ever need to
/// inspect the message text to decide what happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ValidationFailure,
    ReferenceNotFound,
    InsufficientStock,
    AlreadyExists,
    PersistenceFailure,
}

// =============================================================================
// Core Error
// =============================================================================

/// Business errors surfaced by stores, the sale engine and the reports.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed input. Always raised before any store interaction.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced customer, product, category, staff member or sale
    /// does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    /// Requested quantity exceeds the stock available for a product.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout [(Apples, 5)]
    ///      │
    ///      ▼
    /// Claim stock: available=2
    ///      │
    ///      ▼
    /// InsufficientStock { product_id, available: 2, requested: 5 }
    ///      │
    ///      ▼
    /// POS prompts the cashier to reduce the quantity
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Uniqueness violation (category name, customer email, staff email).
    #[error("{field} '{value}' already exists")]
    AlreadyExists { field: String, value: String },

    /// The store could not complete the operation for reasons opaque to
    /// the caller (unavailable, unclassified constraint, lock conflict).
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl CoreError {
    /// Creates a NotFound error.
    pub fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates an AlreadyExists error.
    pub fn already_exists(field: impl Into<String>, value: impl Into<String>) -> Self {
        CoreError::AlreadyExists {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::ValidationFailure,
            CoreError::NotFound { .. } => ErrorKind::ReferenceNotFound,
            CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            CoreError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            CoreError::Persistence(_) => ErrorKind::PersistenceFailure,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (invalid decimal, invalid email, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// The entity is still referenced and cannot be deleted.
    #[error("Cannot delete {entity} {id}: {reason}")]
    StillReferenced {
        entity: EntityKind,
        id: String,
        reason: String,
    },

    /// A supplied secret did not match the stored one.
    #[error("{field} is incorrect")]
    Mismatch { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            available: 2,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product p-1: available 2, requested 5"
        );
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
    }

    #[test]
    fn test_not_found_message() {
        let err = CoreError::not_found(EntityKind::Sale, "abc");
        assert_eq!(err.to_string(), "Sale not found: abc");
        assert_eq!(err.kind(), ErrorKind::ReferenceNotFound);
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "items".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::ValidationFailure);
    }

    #[test]
    fn test_kind_serializes_screaming() {
        let json = serde_json::to_string(&ErrorKind::ReferenceNotFound).unwrap();
        assert_eq!(json, "\"REFERENCE_NOT_FOUND\"");
    }
}
