//! # Checkout Pricing
//!
//! Pure pieces of the sale transaction: request validation, price snapshots
//! and totals. The database layer drives these inside its atomic unit.
//!
//! ## Flow
//! ```text
//! CheckoutRequest ──validate()──► (no store access yet)
//!        │
//!        ▼  per line, inside the transaction
//! claim stock + read price once ──► PricedLine { unit_price, subtotal }
//!        │
//!        ▼
//! SaleTotals::from_lines ──► total = Σ subtotal
//!        │
//!        ▼
//! persist Sale + SaleLineItems ──► CheckoutReceipt { sale_id, total }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{validate_id, validate_quantity, ValidationResult};
use crate::MAX_SALE_LINES;

// =============================================================================
// Request
// =============================================================================

/// One requested line: a product and a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineRequest {
    pub product_id: String,
    pub quantity: i64,
}

impl LineRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        LineRequest {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A checkout request as submitted by the POS.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRequest {
    /// `None` for a walk-in sale.
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Ordered lines. Order only affects which line an error reports.
    pub lines: Vec<LineRequest>,
}

impl CheckoutRequest {
    /// Creates a walk-in request.
    pub fn walk_in(lines: Vec<LineRequest>) -> Self {
        CheckoutRequest {
            customer_id: None,
            lines,
        }
    }

    /// Creates a request for a known customer.
    pub fn for_customer(customer_id: impl Into<String>, lines: Vec<LineRequest>) -> Self {
        CheckoutRequest {
            customer_id: Some(customer_id.into()),
            lines,
        }
    }

    /// Validates the request shape. Must pass before any store access.
    ///
    /// ## Rules
    /// - At least one line, at most [`MAX_SALE_LINES`]
    /// - Every quantity in `1..=MAX_ITEM_QUANTITY`
    /// - Product ids and the customer id (when given) are not blank
    pub fn validate(&self) -> ValidationResult<()> {
        if self.lines.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            });
        }

        if self.lines.len() > MAX_SALE_LINES {
            return Err(ValidationError::OutOfRange {
                field: "items".to_string(),
                min: 1,
                max: MAX_SALE_LINES as i64,
            });
        }

        if let Some(customer_id) = &self.customer_id {
            validate_id("customer_id", customer_id)?;
        }

        for line in &self.lines {
            validate_id("product_id", &line.product_id)?;
            validate_quantity(line.quantity)?;
        }

        Ok(())
    }
}

// =============================================================================
// Priced Lines
// =============================================================================

/// A line with its price captured exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: String,
    pub quantity: i64,
    /// Snapshot of the product price at claim time.
    pub unit_price: Money,
    pub subtotal: Money,
}

impl PricedLine {
    /// Prices a line from a snapshot price.
    ///
    /// Fails with `OutOfRange` when the subtotal does not fit in cents.
    pub fn new(
        product_id: impl Into<String>,
        quantity: i64,
        unit_price: Money,
    ) -> ValidationResult<Self> {
        let subtotal = unit_price
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| amount_overflow("subtotal"))?;

        Ok(PricedLine {
            product_id: product_id.into(),
            quantity,
            unit_price,
            subtotal,
        })
    }
}

/// Aggregate totals of a priced sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SaleTotals {
    pub total: Money,
    pub line_count: usize,
    pub units: i64,
}

impl SaleTotals {
    pub fn from_lines(lines: &[PricedLine]) -> ValidationResult<Self> {
        let total = lines
            .iter()
            .try_fold(Money::zero(), |acc, l| acc.checked_add(l.subtotal))
            .ok_or_else(|| amount_overflow("total"))?;

        Ok(SaleTotals {
            total,
            line_count: lines.len(),
            units: lines.iter().map(|l| l.quantity).sum(),
        })
    }
}

fn amount_overflow(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
}

// =============================================================================
// Receipts
// =============================================================================

/// Response of a successful checkout: `{ sale_id, total }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutReceipt {
    pub sale_id: String,
    pub total: Money,
}

/// Confirmation of a refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RefundReceipt {
    pub sale_id: String,
    /// Amount reversed.
    pub total: Money,
    /// Units put back on the shelf.
    pub units_restored: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_ITEM_QUANTITY;

    #[test]
    fn test_empty_request_is_rejected() {
        let req = CheckoutRequest::walk_in(vec![]);
        assert!(matches!(req.validate(), Err(ValidationError::Required { .. })));
    }

    #[test]
    fn test_non_positive_quantity_is_rejected() {
        for qty in [0, -3] {
            let req = CheckoutRequest::walk_in(vec![LineRequest::new("p-1", qty)]);
            assert!(req.validate().is_err(), "quantity {} accepted", qty);
        }
    }

    #[test]
    fn test_quantity_cap() {
        let ok = CheckoutRequest::walk_in(vec![LineRequest::new("p-1", MAX_ITEM_QUANTITY)]);
        assert!(ok.validate().is_ok());
        let too_many = CheckoutRequest::walk_in(vec![LineRequest::new("p-1", MAX_ITEM_QUANTITY + 1)]);
        assert!(too_many.validate().is_err());
    }

    #[test]
    fn test_line_cap() {
        let lines = (0..=MAX_SALE_LINES)
            .map(|i| LineRequest::new(format!("p-{}", i), 1))
            .collect();
        let req = CheckoutRequest::walk_in(lines);
        assert!(matches!(req.validate(), Err(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn test_blank_ids_are_rejected() {
        let req = CheckoutRequest::walk_in(vec![LineRequest::new("  ", 1)]);
        assert!(req.validate().is_err());

        let req = CheckoutRequest::for_customer("", vec![LineRequest::new("p-1", 1)]);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_totals_two_lines() {
        // 1 × 2.00 + 2 × 3.50 = 9.00
        let lines = vec![
            PricedLine::new("p", 1, Money::from_cents(200)).unwrap(),
            PricedLine::new("q", 2, Money::from_cents(350)).unwrap(),
        ];
        assert_eq!(lines[1].subtotal.cents(), 700);

        let totals = SaleTotals::from_lines(&lines).unwrap();
        assert_eq!(totals.total.cents(), 900);
        assert_eq!(totals.line_count, 2);
        assert_eq!(totals.units, 3);
    }

    #[test]
    fn test_oversized_amounts_are_rejected() {
        assert!(matches!(
            PricedLine::new("p", MAX_ITEM_QUANTITY, Money::from_cents(i64::MAX / 2)),
            Err(ValidationError::OutOfRange { .. })
        ));

        let half = Money::from_cents(i64::MAX / 2);
        let lines = vec![
            PricedLine::new("p", 1, half).unwrap(),
            PricedLine::new("q", 1, half).unwrap(),
            PricedLine::new("r", 1, half).unwrap(),
        ];
        assert!(SaleTotals::from_lines(&lines).is_err());

        let priciest = Money::from_cents(crate::MAX_PRICE_CENTS);
        let line = PricedLine::new("p", MAX_ITEM_QUANTITY, priciest).unwrap();
        let full_cart = vec![line; MAX_SALE_LINES];
        assert!(SaleTotals::from_lines(&full_cart).is_ok());
    }
}
