//! # Product Repository
//!
//! The catalog store: product CRUD, search, stock adjustments and the
//! transaction-scoped stock operations used by the sale engine.
//!
//! ## Guarded Stock Claim
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How a checkout line takes stock                      │
//! │                                                                         │
//! │  UPDATE products                                                       │
//! │     SET stock = stock - :qty                                           │
//! │   WHERE id = :id AND stock >= :qty                                     │
//! │  RETURNING price_cents          ← price snapshot, read exactly once    │
//! │       │                                                                 │
//! │       ├── 1 row  → claimed; price goes into the line item              │
//! │       └── 0 rows → SELECT stock                                        │
//! │                      ├── no row → NotFound(product)                    │
//! │                      └── stock  → InsufficientStock(available = stock) │
//! │                                                                         │
//! │  The UPDATE holds SQLite's write lock until the transaction ends, so   │
//! │  two checkouts can never both pass the check and drive stock below 0.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::new_id;
use crate::repository::category::CategoryRepository;
use crate::repository::escape_like;
use grocer_core::validation::{
    validate_name, validate_price, validate_search_query, validate_stock, validate_threshold,
};
use grocer_core::{
    BulkStockEntry, EntityKind, FieldUpdate, InventoryOverview, Money, NewProduct, Product, ProductListing,
    ProductUpdate, StockAdjustment, StockAlerts, StockOperation, ValidationError,
};

const PRODUCT_COLUMNS: &str = "id, name, price_cents, stock, category_id, created_at, updated_at";

const LISTING_SELECT: &str = r#"
    SELECT
        p.id, p.name, p.price_cents, p.stock, p.category_id, p.created_at, p.updated_at,
        c.name AS category_name
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let apples = repo.create(NewProduct { name: "Apples".into(), price, stock: Some(40), category_id: None }).await?;
/// repo.adjust_stock(&apples.id, StockOperation::Subtract(5)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lists every product with its category name, ordered by name.
    pub async fn list(&self) -> DbResult<Vec<ProductListing>> {
        let sql = format!("{} ORDER BY p.name, p.id", LISTING_SELECT);
        let products = sqlx::query_as::<_, ProductListing>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get(&self, id: &str) -> DbResult<Product> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found(EntityKind::Product, id))
    }

    /// Searches product names and category names (substring, case-insensitive),
    /// optionally restricted to one category.
    pub async fn search(&self, query: &str, category_id: Option<&str>) -> DbResult<Vec<ProductListing>> {
        let query = validate_search_query(query)?;
        let pattern = format!("%{}%", escape_like(&query));

        debug!(query = %query, category = ?category_id, "Searching products");

        let sql = format!(
            r#"{}
            WHERE (p.name LIKE ?1 ESCAPE '\' OR c.name LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR p.category_id = ?2)
            ORDER BY p.name, p.id"#,
            LISTING_SELECT
        );
        let products = sqlx::query_as::<_, ProductListing>(&sql)
            .bind(&pattern)
            .bind(category_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Products with `stock <= threshold`, emptiest first.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<ProductListing>> {
        validate_threshold(threshold)?;

        let sql = format!(
            "{} WHERE p.stock <= ?1 ORDER BY p.stock ASC, p.name",
            LISTING_SELECT
        );
        let products = sqlx::query_as::<_, ProductListing>(&sql)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Splits attention-worthy products into running low and sold out.
    pub async fn alerts(&self, threshold: i64) -> DbResult<StockAlerts> {
        let (out_of_stock, low_stock): (Vec<_>, Vec<_>) = self
            .low_stock(threshold)
            .await?
            .into_iter()
            .partition(|p| p.product.stock == 0);

        Ok(StockAlerts {
            low_stock,
            out_of_stock,
        })
    }

    /// Catalog-wide stock totals.
    pub async fn overview(&self, threshold: i64) -> DbResult<InventoryOverview> {
        validate_threshold(threshold)?;

        let (total_products, total_stock, low_stock, out_of_stock, total_value): (i64, i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(stock), 0),
                    COALESCE(SUM(CASE WHEN stock <= ?1 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN stock = 0 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(price_cents * stock), 0)
                FROM products
                "#,
            )
            .bind(threshold)
            .fetch_one(&self.pool)
            .await?;

        Ok(InventoryOverview {
            total_products,
            total_stock,
            low_stock,
            out_of_stock,
            total_value: Money::from_cents(total_value),
            low_stock_threshold: threshold,
        })
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Creates a product. Stock defaults to 0.
    ///
    /// ## Returns
    /// * `Err(DbError::Validation)` - bad name, negative price or stock
    /// * `Err(DbError::NotFound)` - `category_id` does not exist
    pub async fn create(&self, input: NewProduct) -> DbResult<Product> {
        let name = validate_name("name", &input.name)?;
        validate_price(input.price)?;
        let stock = input.stock.unwrap_or(0);
        validate_stock(stock)?;

        let mut conn = self.pool.acquire().await?;
        if let Some(category_id) = &input.category_id {
            ensure_category(&mut conn, category_id).await?;
        }

        let now = Utc::now();
        let product = Product {
            id: new_id(),
            name,
            price: input.price,
            stock,
            category_id: input.category_id,
            created_at: now,
            updated_at: now,
        };

        debug!(name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, stock, category_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.category_id)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *conn)
        .await?;

        info!(id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Applies a partial update.
    ///
    /// Only `category_id` may be cleared; clearing name, price or stock is a
    /// validation error. The row is locked before it is read so a concurrent
    /// checkout cannot have its stock claim overwritten.
    pub async fn update(&self, id: &str, update: ProductUpdate) -> DbResult<Product> {
        if update.is_empty() {
            return self.get(id).await;
        }

        let mut tx = self.pool.begin().await?;
        let current = lock_row(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found(EntityKind::Product, id))?;

        let name = match update.name {
            FieldUpdate::Set(name) => validate_name("name", &name)?,
            other => other.resolve_required("name", current.name)?,
        };
        let price = update.price.resolve_required("price", current.price)?;
        validate_price(price)?;
        let stock = update.stock.resolve_required("stock", current.stock)?;
        validate_stock(stock)?;
        let category_id = update.category_id.resolve_optional(current.category_id);

        if let Some(category_id) = &category_id {
            ensure_category(&mut tx, category_id).await?;
        }

        let updated_at = Utc::now();
        sqlx::query(
            r#"
            UPDATE products
            SET name = ?2, price_cents = ?3, stock = ?4, category_id = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(price)
        .bind(stock)
        .bind(&category_id)
        .bind(updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(id = %id, "Product updated");
        Ok(Product {
            id: id.to_string(),
            name,
            price,
            stock,
            category_id,
            created_at: current.created_at,
            updated_at,
        })
    }

    /// Deletes a product that has never been sold.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        self.get(id).await?;

        let sold: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items WHERE product_id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        if sold > 0 {
            return Err(ValidationError::StillReferenced {
                entity: EntityKind::Product,
                id: id.to_string(),
                reason: "it appears in sales history".to_string(),
            }
            .into());
        }

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(EntityKind::Product, id));
        }

        info!(id = %id, "Product deleted");
        Ok(())
    }

    /// Applies one manual stock operation in its own transaction.
    pub async fn adjust_stock(&self, id: &str, operation: StockOperation) -> DbResult<StockAdjustment> {
        operation.validate()?;

        let mut tx = self.pool.begin().await?;
        let adjustment = Self::apply_operation(&mut tx, id, operation)
            .await?
            .ok_or_else(|| DbError::not_found(EntityKind::Product, id))?;
        tx.commit().await?;

        info!(
            id = %id,
            old = adjustment.old_stock,
            new = adjustment.new_stock,
            "Stock adjusted"
        );
        Ok(adjustment)
    }

    /// Applies many stock operations in one transaction.
    ///
    /// Every entry is validated before anything is written. Unknown product
    /// ids are skipped and absent from the result.
    pub async fn bulk_adjust(&self, entries: &[BulkStockEntry]) -> DbResult<Vec<StockAdjustment>> {
        if entries.is_empty() {
            return Err(ValidationError::Required {
                field: "updates".to_string(),
            }
            .into());
        }

        let operations = entries
            .iter()
            .map(|entry| Ok((entry.product_id.as_str(), entry.to_operation()?)))
            .collect::<Result<Vec<_>, ValidationError>>()?;

        let mut tx = self.pool.begin().await?;
        let mut results = Vec::with_capacity(operations.len());

        for (product_id, operation) in operations {
            match Self::apply_operation(&mut tx, product_id, operation).await? {
                Some(adjustment) => results.push(adjustment),
                None => warn!(product_id = %product_id, "Bulk stock update skipped unknown product"),
            }
        }

        tx.commit().await?;

        info!(requested = entries.len(), applied = results.len(), "Bulk stock update committed");
        Ok(results)
    }

    // =========================================================================
    // Transaction-scoped operations
    // =========================================================================

    /// Loads a product on the caller's connection or transaction.
    pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(product)
    }

    /// Takes `quantity` units if at least that many are on hand and returns
    /// the unit price read by the same statement.
    pub async fn claim_stock(conn: &mut SqliteConnection, id: &str, quantity: i64) -> DbResult<Money> {
        let claimed: Option<Money> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock - ?2, updated_at = ?3
            WHERE id = ?1 AND stock >= ?2
            RETURNING price_cents
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(price) = claimed {
            debug!(product_id = %id, quantity, "Stock claimed");
            return Ok(price);
        }

        let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match available {
            None => Err(DbError::not_found(EntityKind::Product, id)),
            Some(available) => Err(DbError::InsufficientStock {
                product_id: id.to_string(),
                available,
                requested: quantity,
            }),
        }
    }

    /// Puts `quantity` units back. A missing product means the ledger and the
    /// catalog disagree, which is never skipped.
    pub async fn restore_stock(conn: &mut SqliteConnection, id: &str, quantity: i64) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(quantity)
            .bind(Utc::now())
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::Consistency(format!(
                "sold product {} no longer exists",
                id
            )));
        }

        debug!(product_id = %id, quantity, "Stock restored");
        Ok(())
    }

    /// Locks the row (a no-op write) and returns its name and stock, then
    /// writes the new level. `None` when the product does not exist.
    async fn apply_operation(
        conn: &mut SqliteConnection,
        id: &str,
        operation: StockOperation,
    ) -> DbResult<Option<StockAdjustment>> {
        let locked: Option<(String, i64)> = sqlx::query_as(
            "UPDATE products SET stock = stock WHERE id = ?1 RETURNING name, stock",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some((name, old_stock)) = locked else {
            return Ok(None);
        };

        let new_stock = operation.apply(old_stock);
        sqlx::query("UPDATE products SET stock = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(new_stock)
            .bind(Utc::now())
            .execute(&mut *conn)
            .await?;

        Ok(Some(StockAdjustment {
            product_id: id.to_string(),
            name,
            old_stock,
            new_stock,
        }))
    }
}

/// Takes the write lock and reads the row with the same no-op statement.
async fn lock_row(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let sql = format!(
        "UPDATE products SET stock = stock WHERE id = ?1 RETURNING {}",
        PRODUCT_COLUMNS
    );
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

async fn ensure_category(conn: &mut SqliteConnection, category_id: &str) -> DbResult<()> {
    if CategoryRepository::exists(conn, category_id).await? {
        Ok(())
    } else {
        Err(DbError::not_found(EntityKind::Category, category_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{add_product, test_db};

    #[tokio::test]
    async fn test_create_defaults_stock_to_zero() {
        let db = test_db().await;
        let product = db
            .products()
            .create(NewProduct {
                name: "Sourdough".to_string(),
                price: Money::from_cents(450),
                stock: None,
                category_id: None,
            })
            .await
            .unwrap();

        assert_eq!(product.stock, 0);
        assert_eq!(db.products().get(&product.id).await.unwrap(), product);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let db = test_db().await;
        let repo = db.products();

        let bad_price = repo
            .create(NewProduct {
                name: "Eggs".to_string(),
                price: Money::from_cents(-1),
                stock: None,
                category_id: None,
            })
            .await;
        assert!(matches!(bad_price, Err(DbError::Validation(_))));

        let missing_category = repo
            .create(NewProduct {
                name: "Eggs".to_string(),
                price: Money::from_cents(300),
                stock: Some(1),
                category_id: Some("nope".to_string()),
            })
            .await;
        assert!(matches!(
            missing_category,
            Err(DbError::NotFound {
                entity: EntityKind::Category,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_update_field_semantics() {
        let db = test_db().await;
        let dairy = db.categories().create("Dairy").await.unwrap();
        let milk = add_product(&db, "Milk", 129, 4).await;

        let updated = db
            .products()
            .update(
                &milk.id,
                ProductUpdate {
                    price: FieldUpdate::Set(Money::from_cents(139)),
                    category_id: FieldUpdate::Set(dairy.id.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Milk");
        assert_eq!(updated.price.cents(), 139);
        assert_eq!(updated.stock, 4);
        assert_eq!(updated.category_id.as_deref(), Some(dairy.id.as_str()));

        let cleared = db
            .products()
            .update(
                &milk.id,
                ProductUpdate {
                    category_id: FieldUpdate::Clear,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.category_id, None);
        assert_eq!(cleared.price.cents(), 139);

        let clear_name = db
            .products()
            .update(
                &milk.id,
                ProductUpdate {
                    name: FieldUpdate::Clear,
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(
            clear_name,
            Err(DbError::Validation(ValidationError::Required { .. }))
        ));
    }

    #[tokio::test]
    async fn test_search_by_name_and_category() {
        let db = test_db().await;
        let bakery = db.categories().create("Bakery").await.unwrap();
        let bread = add_product(&db, "Rye Bread", 350, 5).await;
        add_product(&db, "Milk", 129, 5).await;
        let bun = db
            .products()
            .create(NewProduct {
                name: "Cinnamon Bun".to_string(),
                price: Money::from_cents(199),
                stock: Some(3),
                category_id: Some(bakery.id.clone()),
            })
            .await
            .unwrap();

        let hits = db.products().search("bread", None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].product.id, bread.id);

        // Matches on the category name too.
        let hits = db.products().search("bakery", None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].product.id, bun.id);
        assert_eq!(hits[0].category_name.as_deref(), Some("Bakery"));

        let hits = db.products().search("n", Some(&bakery.id)).await.unwrap();
        assert_eq!(hits.len(), 1);

        assert!(matches!(
            db.products().search("  ", None).await,
            Err(DbError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_low_stock_alerts_and_overview() {
        let db = test_db().await;
        add_product(&db, "Milk", 100, 0).await;
        add_product(&db, "Eggs", 300, 4).await;
        add_product(&db, "Rice", 200, 50).await;

        let low = db.products().low_stock(10).await.unwrap();
        let names: Vec<&str> = low.iter().map(|p| p.product.name.as_str()).collect();
        assert_eq!(names, vec!["Milk", "Eggs"]);

        let alerts = db.products().alerts(10).await.unwrap();
        assert_eq!(alerts.out_of_stock.len(), 1);
        assert_eq!(alerts.low_stock.len(), 1);
        assert_eq!(alerts.low_stock[0].product.name, "Eggs");

        let overview = db.products().overview(10).await.unwrap();
        assert_eq!(overview.total_products, 3);
        assert_eq!(overview.total_stock, 54);
        assert_eq!(overview.low_stock, 2);
        assert_eq!(overview.out_of_stock, 1);
        assert_eq!(overview.total_value.cents(), 1200 + 10000);
    }

    #[tokio::test]
    async fn test_adjust_stock() {
        let db = test_db().await;
        let rice = add_product(&db, "Rice", 200, 5).await;
        let repo = db.products();

        let added = repo.adjust_stock(&rice.id, StockOperation::Add(3)).await.unwrap();
        assert_eq!((added.old_stock, added.new_stock), (5, 8));

        let floored = repo.adjust_stock(&rice.id, StockOperation::Subtract(20)).await.unwrap();
        assert_eq!(floored.new_stock, 0);

        let set = repo.adjust_stock(&rice.id, StockOperation::Set(12)).await.unwrap();
        assert_eq!(set.delta(), 12);
        assert_eq!(repo.get(&rice.id).await.unwrap().stock, 12);

        assert!(matches!(
            repo.adjust_stock("missing", StockOperation::Add(1)).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            repo.adjust_stock(&rice.id, StockOperation::Add(-1)).await,
            Err(DbError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_bulk_adjust_skips_unknown() {
        let db = test_db().await;
        let rice = add_product(&db, "Rice", 200, 5).await;
        let milk = add_product(&db, "Milk", 100, 5).await;

        let entries = vec![
            BulkStockEntry {
                product_id: rice.id.clone(),
                quantity: 9,
                operation: None,
            },
            BulkStockEntry {
                product_id: "ghost".to_string(),
                quantity: 1,
                operation: Some("add".to_string()),
            },
            BulkStockEntry {
                product_id: milk.id.clone(),
                quantity: 2,
                operation: Some("subtract".to_string()),
            },
        ];

        let results = db.products().bulk_adjust(&entries).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(db.products().get(&rice.id).await.unwrap().stock, 9);
        assert_eq!(db.products().get(&milk.id).await.unwrap().stock, 3);
    }

    #[tokio::test]
    async fn test_bulk_adjust_validates_before_writing() {
        let db = test_db().await;
        let rice = add_product(&db, "Rice", 200, 5).await;

        let entries = vec![
            BulkStockEntry {
                product_id: rice.id.clone(),
                quantity: 1,
                operation: Some("add".to_string()),
            },
            BulkStockEntry {
                product_id: rice.id.clone(),
                quantity: 1,
                operation: Some("double".to_string()),
            },
        ];

        assert!(db.products().bulk_adjust(&entries).await.is_err());
        assert_eq!(db.products().get(&rice.id).await.unwrap().stock, 5);
        assert!(db.products().bulk_adjust(&[]).await.is_err());
    }

    #[tokio::test]
    async fn test_claim_stock_guards_and_reports() {
        let db = test_db().await;
        let eggs = add_product(&db, "Eggs", 300, 2).await;
        let mut conn = db.pool().acquire().await.unwrap();

        let price = ProductRepository::claim_stock(&mut conn, &eggs.id, 2).await.unwrap();
        assert_eq!(price.cents(), 300);

        match ProductRepository::claim_stock(&mut conn, &eggs.id, 1).await {
            Err(DbError::InsufficientStock {
                available, requested, ..
            }) => assert_eq!((available, requested), (0, 1)),
            other => panic!("expected InsufficientStock, got {:?}", other),
        }

        assert!(matches!(
            ProductRepository::claim_stock(&mut conn, "ghost", 1).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            ProductRepository::restore_stock(&mut conn, "ghost", 1).await,
            Err(DbError::Consistency(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_price_edit_during_checkout_keeps_claimed_stock() {
        let dir = tempfile::tempdir().unwrap();
        let db = crate::Database::new(
            crate::DbConfig::new(dir.path().join("grocer.db")).max_connections(4),
        )
        .await
        .unwrap();
        let bread = add_product(&db, "Bread", 200, 10).await;

        let mut tx = db.pool().begin().await.unwrap();
        ProductRepository::claim_stock(&mut tx, &bread.id, 3).await.unwrap();

        let repo = db.products();
        let id = bread.id.clone();
        let edit = tokio::spawn(async move {
            repo.update(
                &id,
                ProductUpdate {
                    price: FieldUpdate::Set(Money::from_cents(250)),
                    ..Default::default()
                },
            )
            .await
        });

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        tx.commit().await.unwrap();

        let edited = edit.await.unwrap().unwrap();
        assert_eq!(edited.stock, 7);

        let stored = db.products().get(&bread.id).await.unwrap();
        assert_eq!(stored.price.cents(), 250);
        assert_eq!(stored.stock, 7);
    }

    #[tokio::test]
    async fn test_price_above_ceiling_is_rejected() {
        let db = test_db().await;
        let too_much = Money::from_cents(grocer_core::MAX_PRICE_CENTS + 1);

        let created = db
            .products()
            .create(NewProduct {
                name: "Saffron".to_string(),
                price: too_much,
                stock: None,
                category_id: None,
            })
            .await;
        assert!(matches!(
            created,
            Err(DbError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let saffron = add_product(&db, "Saffron", 1_500, 1).await;
        let edited = db
            .products()
            .update(
                &saffron.id,
                ProductUpdate {
                    price: FieldUpdate::Set(too_much),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(edited, Err(DbError::Validation(_))));
        assert_eq!(db.products().get(&saffron.id).await.unwrap().price.cents(), 1_500);
    }
}
