//! # Sale Transaction Engine
//!
//! Checkout and refund, each as one SQLite transaction.
//!
//! ## Checkout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CheckoutRequest                                                       │
//! │       │ validate()                  ← ValidationFailure, no store I/O  │
//! │       ▼                                                                 │
//! │  BEGIN                                                                 │
//! │       │ insert_header (guarded on customer)  ← takes the write lock    │
//! │       │     └── 0 rows → NotFound(customer)                            │
//! │       │                                                                 │
//! │       │ for each line, in order:                                       │
//! │       │     claim_stock → unit price snapshot                          │
//! │       │     └── NotFound(product) | InsufficientStock                  │
//! │       │                                                                 │
//! │       │ insert_items, set_total(Σ subtotal)                            │
//! │       ▼                                                                 │
//! │  COMMIT ──► CheckoutReceipt { sale_id, total }                         │
//! │                                                                         │
//! │  Any error drops the transaction, which rolls everything back.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Refund
//! ```text
//! BEGIN → lock_for_refund (NotFound(sale) if gone) → restore stock per line
//!       → delete items + sale → COMMIT
//! ```
//!
//! Every transaction opens with a write, so SQLite hands out the write
//! lock up front (waiting up to `busy_timeout`) and a concurrent writer can
//! never invalidate what this transaction has already read.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::new_id;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use grocer_core::validation::validate_id;
use grocer_core::{
    CheckoutReceipt, CheckoutRequest, CoreError, CoreResult, EntityKind, PricedLine, RefundReceipt,
    SaleDetail, SaleRecord, SaleTotals,
};

/// Runs checkouts and refunds atomically.
#[derive(Debug, Clone)]
pub struct SaleEngine {
    pool: SqlitePool,
}

impl SaleEngine {
    pub fn new(pool: SqlitePool) -> Self {
        SaleEngine { pool }
    }

    /// Records a sale and takes its stock, or changes nothing.
    ///
    /// ## Returns
    /// * `Ok(CheckoutReceipt)` - sale committed
    /// * `Err(CoreError::Validation)` - empty or malformed request
    /// * `Err(CoreError::NotFound)` - unknown customer or product
    /// * `Err(CoreError::InsufficientStock)` - a line asks for more than is left
    /// * `Err(CoreError::Persistence)` - the transaction could not commit
    pub async fn checkout(&self, request: CheckoutRequest) -> CoreResult<CheckoutReceipt> {
        if let Err(e) = request.validate() {
            warn!(error = %e, "Checkout rejected before touching the store");
            return Err(e.into());
        }

        let sale_id = new_id();
        debug!(
            sale_id = %sale_id,
            customer_id = ?request.customer_id,
            lines = request.lines.len(),
            "Starting checkout"
        );

        match self.run_checkout(&sale_id, &request).await {
            Ok((receipt, totals)) => {
                info!(
                    sale_id = %receipt.sale_id,
                    total = %receipt.total,
                    lines = totals.line_count,
                    units = totals.units,
                    "Sale committed"
                );
                Ok(receipt)
            }
            Err(e) => {
                warn!(sale_id = %sale_id, error = %e, "Checkout rolled back");
                Err(e.into())
            }
        }
    }

    async fn run_checkout(
        &self,
        sale_id: &str,
        request: &CheckoutRequest,
    ) -> DbResult<(CheckoutReceipt, SaleTotals)> {
        let mut tx = self.pool.begin().await?;
        let customer_id = request.customer_id.as_deref();

        if !SaleRepository::insert_header(&mut tx, sale_id, customer_id, Utc::now()).await? {
            return Err(DbError::not_found(
                EntityKind::Customer,
                customer_id.unwrap_or_default(),
            ));
        }

        let mut lines = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let unit_price =
                ProductRepository::claim_stock(&mut tx, &line.product_id, line.quantity).await?;
            lines.push(PricedLine::new(&line.product_id, line.quantity, unit_price)?);
        }

        let totals = SaleTotals::from_lines(&lines)?;
        SaleRepository::insert_items(&mut tx, sale_id, &lines).await?;
        SaleRepository::set_total(&mut tx, sale_id, totals.total).await?;

        tx.commit().await?;

        let receipt = CheckoutReceipt {
            sale_id: sale_id.to_string(),
            total: totals.total,
        };
        Ok((receipt, totals))
    }

    /// Deletes a sale and puts its stock back, or changes nothing.
    ///
    /// Refunding an unknown or already refunded sale is `NotFound`.
    pub async fn refund(&self, sale_id: &str) -> CoreResult<RefundReceipt> {
        validate_id("sale_id", sale_id)?;

        match self.run_refund(sale_id).await {
            Ok(receipt) => {
                info!(
                    sale_id = %sale_id,
                    total = %receipt.total,
                    units = receipt.units_restored,
                    "Sale refunded"
                );
                Ok(receipt)
            }
            Err(e) => {
                warn!(sale_id = %sale_id, error = %e, "Refund rolled back");
                Err(e.into())
            }
        }
    }

    async fn run_refund(&self, sale_id: &str) -> DbResult<RefundReceipt> {
        let mut tx = self.pool.begin().await?;

        let total = SaleRepository::lock_for_refund(&mut tx, sale_id)
            .await?
            .ok_or_else(|| DbError::not_found(EntityKind::Sale, sale_id))?;

        let items = SaleRepository::fetch_items(&mut tx, sale_id).await?;
        let mut units_restored = 0;
        for item in &items {
            ProductRepository::restore_stock(&mut tx, &item.product_id, item.quantity).await?;
            units_restored += item.quantity;
        }

        SaleRepository::delete(&mut tx, sale_id).await?;
        tx.commit().await?;

        Ok(RefundReceipt {
            sale_id: sale_id.to_string(),
            total,
            units_restored,
        })
    }

    /// Sale detail with customer display fields and product names.
    pub async fn get_sale(&self, sale_id: &str) -> CoreResult<SaleDetail> {
        SaleRepository::new(self.pool.clone())
            .get_detail(sale_id)
            .await
            .map_err(CoreError::from)
    }

    /// Sale with its raw line items.
    pub async fn get_record(&self, sale_id: &str) -> CoreResult<SaleRecord> {
        SaleRepository::new(self.pool.clone())
            .get_record(sale_id)
            .await
            .map_err(CoreError::from)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
