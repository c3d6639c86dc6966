//! # Category Repository
//!
//! Category names are unique (case-insensitive). A category cannot be
//! deleted while any product still points at it.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::new_id;
use grocer_core::validation::validate_name;
use grocer_core::{Category, CategoryStats, EntityKind, ValidationError};

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists all categories ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        Ok(categories)
    }

    /// Gets a category by its ID.
    pub async fn get(&self, id: &str) -> DbResult<Category> {
        sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(EntityKind::Category, id))
    }

    /// Creates a category.
    ///
    /// ## Returns
    /// * `Err(DbError::Validation)` - name shorter than 2 characters
    /// * `Err(DbError::UniqueViolation)` - name already taken
    pub async fn create(&self, name: &str) -> DbResult<Category> {
        let name = validate_name("name", name)?;
        self.ensure_name_free(&name, None).await?;

        let category = Category { id: new_id(), name };
        debug!(name = %category.name, "Inserting category");

        sqlx::query("INSERT INTO categories (id, name) VALUES (?1, ?2)")
            .bind(&category.id)
            .bind(&category.name)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).with_duplicate_value(&category.name))?;

        info!(id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// Renames a category. The new name must be free among the others.
    pub async fn rename(&self, id: &str, name: &str) -> DbResult<Category> {
        let name = validate_name("name", name)?;
        self.get(id).await?;
        self.ensure_name_free(&name, Some(id)).await?;

        sqlx::query("UPDATE categories SET name = ?2 WHERE id = ?1")
            .bind(id)
            .bind(&name)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).with_duplicate_value(&name))?;

        debug!(id = %id, name = %name, "Category renamed");
        Ok(Category {
            id: id.to_string(),
            name,
        })
    }

    /// Deletes a category that no product references.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        self.get(id).await?;

        let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        if in_use > 0 {
            return Err(ValidationError::StillReferenced {
                entity: EntityKind::Category,
                id: id.to_string(),
                reason: format!("{} product(s) still belong to it", in_use),
            }
            .into());
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(EntityKind::Category, id));
        }

        info!(id = %id, "Category deleted");
        Ok(())
    }

    /// Per-category product count, stock, average price and stock value.
    /// Empty categories are included with zeros.
    pub async fn stats(&self) -> DbResult<Vec<CategoryStats>> {
        let stats = sqlx::query_as::<_, CategoryStats>(
            r#"
            SELECT
                c.id AS category_id,
                c.name AS name,
                COUNT(p.id) AS product_count,
                COALESCE(SUM(p.stock), 0) AS total_stock,
                CAST(COALESCE(ROUND(AVG(p.price_cents)), 0) AS INTEGER) AS average_price_cents,
                COALESCE(SUM(p.price_cents * p.stock), 0) AS stock_value_cents
            FROM categories c
            LEFT JOIN products p ON p.category_id = c.id
            GROUP BY c.id, c.name
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(stats)
    }

    /// Existence check usable inside a caller's transaction.
    pub async fn exists(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM categories WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(found.is_some())
    }

    async fn ensure_name_free(&self, name: &str, except_id: Option<&str>) -> DbResult<()> {
        let taken: Option<String> = sqlx::query_scalar(
            "SELECT id FROM categories WHERE name = ?1 AND (?2 IS NULL OR id <> ?2)",
        )
        .bind(name)
        .bind(except_id)
        .fetch_optional(&self.pool)
        .await?;

        match taken {
            Some(_) => Err(DbError::duplicate("name", name)),
            None => Ok(()),
        }
    }
}
