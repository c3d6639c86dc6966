//! # Sale Repository
//!
//! The ledger store: committed sales and their line items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CHECKOUT (one transaction, driven by SaleEngine)                   │
//! │     └── insert_header()   → sales row, total 0                         │
//! │     └── claim stock per line (ProductRepository)                       │
//! │     └── insert_items()    → sale_items rows, line_no 1..n              │
//! │     └── set_total()       → Σ subtotal                                 │
//! │                                                                         │
//! │  2. READ                                                               │
//! │     └── get_record() / get_detail()                                    │
//! │                                                                         │
//! │  3. REFUND (one transaction, driven by SaleEngine)                     │
//! │     └── lock_for_refund() → total, or None when the sale is gone       │
//! │     └── restore stock per line (ProductRepository)                     │
//! │     └── delete()          → sale_items, then sales                     │
//! │                                                                         │
//! │  A committed sale is never updated in place.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::new_id;
use grocer_core::{
    EntityKind, Money, PricedLine, Sale, SaleDetail, SaleDetailItem, SaleHeader, SaleLineItem, SaleRecord,
};

const SALE_COLUMNS: &str = "id, customer_id, total_cents, created_at";

const ITEM_COLUMNS: &str =
    "id, sale_id, product_id, line_no, quantity, unit_price_cents, subtotal_cents";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Loads a sale with its line items in line order.
    pub async fn get_record(&self, id: &str) -> DbResult<SaleRecord> {
        let mut conn = self.pool.acquire().await?;

        let sale = Self::fetch(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found(EntityKind::Sale, id))?;
        let items = Self::fetch_items(&mut conn, id).await?;

        Ok(SaleRecord { sale, items })
    }

    /// Loads a sale with customer display fields and product names.
    pub async fn get_detail(&self, id: &str) -> DbResult<SaleDetail> {
        let mut conn = self.pool.acquire().await?;

        let sale = sqlx::query_as::<_, SaleHeader>(
            r#"
            SELECT
                s.id, s.customer_id,
                c.name AS customer_name, c.email AS customer_email, c.phone AS customer_phone,
                s.created_at, s.total_cents
            FROM sales s
            LEFT JOIN customers c ON c.id = s.customer_id
            WHERE s.id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found(EntityKind::Sale, id))?;

        let items = sqlx::query_as::<_, SaleDetailItem>(
            r#"
            SELECT
                si.id, si.product_id, p.name AS product_name,
                si.quantity, si.unit_price_cents, si.subtotal_cents
            FROM sale_items si
            JOIN products p ON p.id = si.product_id
            WHERE si.sale_id = ?1
            ORDER BY si.line_no
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(SaleDetail { sale, items })
    }

    /// Sales of one customer, newest first.
    pub async fn for_customer(&self, customer_id: &str) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE customer_id = ?1 ORDER BY created_at DESC, id",
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Transaction-scoped operations
    // =========================================================================

    pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS);
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(sale)
    }

    pub async fn fetch_items(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleLineItem>> {
        let sql = format!(
            "SELECT {} FROM sale_items WHERE sale_id = ?1 ORDER BY line_no",
            ITEM_COLUMNS
        );
        let items = sqlx::query_as::<_, SaleLineItem>(&sql)
            .bind(sale_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(items)
    }

    /// Inserts the sale header with a zero total.
    ///
    /// The insert only happens if `customer_id` is `None` or names an
    /// existing customer; returns `false` otherwise. Being a write, it also
    /// takes the database write lock for the rest of the transaction.
    pub async fn insert_header(
        conn: &mut SqliteConnection,
        id: &str,
        customer_id: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO sales (id, customer_id, total_cents, created_at)
            SELECT ?1, ?2, 0, ?3
            WHERE ?2 IS NULL OR EXISTS (SELECT 1 FROM customers WHERE id = ?2)
            "#,
        )
        .bind(id)
        .bind(customer_id)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Persists priced lines as line items numbered from 1 in request order.
    pub async fn insert_items(
        conn: &mut SqliteConnection,
        sale_id: &str,
        lines: &[PricedLine],
    ) -> DbResult<Vec<SaleLineItem>> {
        let mut items = Vec::with_capacity(lines.len());

        for (index, line) in lines.iter().enumerate() {
            let item = SaleLineItem {
                id: new_id(),
                sale_id: sale_id.to_string(),
                product_id: line.product_id.clone(),
                line_no: index as i64 + 1,
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
            };

            sqlx::query(
                r#"
                INSERT INTO sale_items
                    (id, sale_id, product_id, line_no, quantity, unit_price_cents, subtotal_cents)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(item.line_no)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.subtotal)
            .execute(&mut *conn)
            .await?;

            items.push(item);
        }

        debug!(sale_id = %sale_id, lines = items.len(), "Inserted sale items");
        Ok(items)
    }

    pub async fn set_total(conn: &mut SqliteConnection, sale_id: &str, total: Money) -> DbResult<()> {
        let result = sqlx::query("UPDATE sales SET total_cents = ?2 WHERE id = ?1")
            .bind(sale_id)
            .bind(total)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::Consistency(format!(
                "sale {} vanished before its total was written",
                sale_id
            )));
        }

        Ok(())
    }

    /// Takes the write lock with a no-op update of the sale and returns its
    /// total, or `None` when the sale does not exist.
    pub async fn lock_for_refund(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Money>> {
        let total: Option<Money> = sqlx::query_scalar(
            "UPDATE sales SET total_cents = total_cents WHERE id = ?1 RETURNING total_cents",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(total)
    }

    /// Deletes the line items, then the sale.
    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        let items = sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(EntityKind::Sale, id));
        }

        debug!(sale_id = %id, items = items.rows_affected(), "Deleted sale");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{add_customer, add_product, test_db};

    #[tokio::test]
    async fn test_insert_header_checks_customer() {
        let db = test_db().await;
        let ana = add_customer(&db, "Ana").await;
        let mut tx = db.pool().begin().await.unwrap();

        assert!(SaleRepository::insert_header(&mut tx, "s-1", None, Utc::now()).await.unwrap());
        assert!(SaleRepository::insert_header(&mut tx, "s-2", Some(&ana.id), Utc::now())
            .await
            .unwrap());
        assert!(!SaleRepository::insert_header(&mut tx, "s-3", Some("ghost"), Utc::now())
            .await
            .unwrap());

        assert!(SaleRepository::fetch(&mut tx, "s-3").await.unwrap().is_none());
        let walk_in = SaleRepository::fetch(&mut tx, "s-1").await.unwrap().unwrap();
        assert_eq!(walk_in.customer_id, None);
        assert_eq!(walk_in.total, Money::zero());
    }

    #[tokio::test]
    async fn test_items_round_trip_in_line_order() {
        let db = test_db().await;
        let milk = add_product(&db, "Milk", 129, 10).await;
        let eggs = add_product(&db, "Eggs", 300, 10).await;

        let lines = vec![
            PricedLine::new(&eggs.id, 2, eggs.price).unwrap(),
            PricedLine::new(&milk.id, 1, milk.price).unwrap(),
        ];

        {
            let mut tx = db.pool().begin().await.unwrap();
            SaleRepository::insert_header(&mut tx, "s-1", None, Utc::now()).await.unwrap();
            SaleRepository::insert_items(&mut tx, "s-1", &lines).await.unwrap();
            SaleRepository::set_total(&mut tx, "s-1", Money::from_cents(729)).await.unwrap();
            tx.commit().await.unwrap();
        }

        let record = db.sales().get_record("s-1").await.unwrap();
        assert_eq!(record.items.len(), 2);
        assert_eq!(record.items[0].product_id, eggs.id);
        assert_eq!(record.items[0].line_no, 1);
        assert_eq!(record.units(), 3);
        assert!(record.is_consistent());

        let detail = db.sales().get_detail("s-1").await.unwrap();
        assert_eq!(detail.items[0].product_name, "Eggs");
        assert_eq!(detail.items[1].subtotal.cents(), 129);
        assert_eq!(detail.sale.total.cents(), 729);
    }

    #[tokio::test]
    async fn test_dropped_transaction_leaves_nothing() {
        let db = test_db().await;

        {
            let mut tx = db.pool().begin().await.unwrap();
            SaleRepository::insert_header(&mut tx, "s-1", None, Utc::now()).await.unwrap();
            // dropped without commit
        }

        assert_eq!(db.sales().count().await.unwrap(), 0);
        assert!(matches!(
            db.sales().get_record("s-1").await,
            Err(DbError::NotFound {
                entity: EntityKind::Sale,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_lock_and_delete() {
        let db = test_db().await;
        let mut tx = db.pool().begin().await.unwrap();

        assert_eq!(SaleRepository::lock_for_refund(&mut tx, "s-1").await.unwrap(), None);

        SaleRepository::insert_header(&mut tx, "s-1", None, Utc::now()).await.unwrap();
        SaleRepository::set_total(&mut tx, "s-1", Money::from_cents(50)).await.unwrap();
        assert_eq!(
            SaleRepository::lock_for_refund(&mut tx, "s-1").await.unwrap(),
            Some(Money::from_cents(50))
        );

        SaleRepository::delete(&mut tx, "s-1").await.unwrap();
        assert!(matches!(
            SaleRepository::delete(&mut tx, "s-1").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
