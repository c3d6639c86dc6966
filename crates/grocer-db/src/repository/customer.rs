//! # Customer Repository
//!
//! Customers are optional on sales. Email is unique when present. Deleting
//! a customer keeps their sales, which become walk-in sales.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::new_id;
use crate::repository::escape_like;
use grocer_core::validation::{
    validate_address, validate_email, validate_name, validate_phone, validate_search_query,
};
use grocer_core::{Customer, CustomerUpdate, EntityKind, FieldUpdate, NewCustomer};

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, address, created_at";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Lists customers ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let sql = format!("SELECT {} FROM customers ORDER BY name, id", CUSTOMER_COLUMNS);
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    /// Gets a customer by ID.
    pub async fn get(&self, id: &str) -> DbResult<Customer> {
        let sql = format!("SELECT {} FROM customers WHERE id = ?1", CUSTOMER_COLUMNS);
        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(EntityKind::Customer, id))
    }

    /// Creates a customer.
    ///
    /// ## Rules
    /// - name: 2..=200 characters
    /// - email: valid shape, unique, stored lowercase
    /// - phone: at least 10 characters
    /// - address: at least 5 characters
    pub async fn create(&self, input: NewCustomer) -> DbResult<Customer> {
        let name = validate_name("name", &input.name)?;
        let email = input.email.as_deref().map(validate_email).transpose()?;
        let phone = input.phone.as_deref().map(validate_phone).transpose()?;
        let address = input.address.as_deref().map(validate_address).transpose()?;

        if let Some(email) = &email {
            self.ensure_email_free(email, None).await?;
        }

        let customer = Customer {
            id: new_id(),
            name,
            email,
            phone,
            address,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, phone, address, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(customer.email.clone().unwrap_or_default()))?;

        info!(id = %customer.id, "Customer created");
        Ok(customer)
    }

    /// Applies a partial update. Contact fields may be cleared; the name
    /// may not.
    pub async fn update(&self, id: &str, update: CustomerUpdate) -> DbResult<Customer> {
        let current = self.get(id).await?;

        let name = match update.name {
            FieldUpdate::Set(name) => validate_name("name", &name)?,
            other => other.resolve_required("name", current.name)?,
        };
        let email = checked(update.email, validate_email)?.resolve_optional(current.email);
        let phone = checked(update.phone, validate_phone)?.resolve_optional(current.phone);
        let address = checked(update.address, validate_address)?.resolve_optional(current.address);

        if let Some(email) = &email {
            self.ensure_email_free(email, Some(id)).await?;
        }

        let result = sqlx::query(
            r#"
            UPDATE customers
            SET name = ?2, email = ?3, phone = ?4, address = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(&email)
        .bind(&phone)
        .bind(&address)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(email.clone().unwrap_or_default()))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(EntityKind::Customer, id));
        }

        debug!(id = %id, "Customer updated");
        Ok(Customer {
            id: id.to_string(),
            name,
            email,
            phone,
            address,
            created_at: current.created_at,
        })
    }

    /// Deletes a customer. Their past sales keep existing as walk-in sales.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(EntityKind::Customer, id));
        }

        info!(id = %id, "Customer deleted");
        Ok(())
    }

    /// Substring search across name, email and phone.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Customer>> {
        let query = validate_search_query(query)?;
        let pattern = format!("%{}%", escape_like(&query));

        let sql = format!(
            r#"
            SELECT {} FROM customers
            WHERE name LIKE ?1 ESCAPE '\'
               OR email LIKE ?1 ESCAPE '\'
               OR phone LIKE ?1 ESCAPE '\'
            ORDER BY name, id
            "#,
            CUSTOMER_COLUMNS
        );
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await?;

        debug!(query = %query, count = customers.len(), "Customer search");
        Ok(customers)
    }

    async fn ensure_email_free(&self, email: &str, except_id: Option<&str>) -> DbResult<()> {
        let taken: Option<String> = sqlx::query_scalar(
            "SELECT id FROM customers WHERE email = ?1 AND (?2 IS NULL OR id <> ?2)",
        )
        .bind(email)
        .bind(except_id)
        .fetch_optional(&self.pool)
        .await?;

        match taken {
            Some(_) => Err(DbError::duplicate("email", email)),
            None => Ok(()),
        }
    }
}

/// Runs a validator over a `Set` value, keeping `Unchanged`/`Clear` as is.
fn checked(
    update: FieldUpdate<String>,
    validate: fn(&str) -> grocer_core::validation::ValidationResult<String>,
) -> DbResult<FieldUpdate<String>> {
    Ok(match update {
        FieldUpdate::Set(value) => FieldUpdate::Set(validate(&value)?),
        other => other,
    })
}
