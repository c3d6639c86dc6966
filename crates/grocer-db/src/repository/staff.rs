//! # Staff Repository
//!
//! Staff accounts with argon2 password hashes. The hash column is only ever
//! read inside this module; [`Staff`] has no field for it.
//!
//! ```text
//! create(password) ──► argon2 hash (random salt) ──► staff.password_hash
//! verify(email, password) ──► load hash ──► Argon2::verify_password
//!                                             ├── ok  → Staff
//!                                             └── err → Mismatch("credentials")
//! ```

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::new_id;
use grocer_core::validation::{validate_email, validate_name, validate_password};
use grocer_core::{EntityKind, FieldUpdate, NewStaff, Staff, StaffUpdate, ValidationError};

const STAFF_COLUMNS: &str = "id, name, email, role, created_at";

/// Repository for staff accounts.
#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    /// Creates a new StaffRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    /// Lists staff ordered by name. Never includes password hashes.
    pub async fn list(&self) -> DbResult<Vec<Staff>> {
        let sql = format!("SELECT {} FROM staff ORDER BY name, id", STAFF_COLUMNS);
        let staff = sqlx::query_as::<_, Staff>(&sql).fetch_all(&self.pool).await?;

        Ok(staff)
    }

    pub async fn get(&self, id: &str) -> DbResult<Staff> {
        let sql = format!("SELECT {} FROM staff WHERE id = ?1", STAFF_COLUMNS);
        sqlx::query_as::<_, Staff>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(EntityKind::Staff, id))
    }

    /// Creates a staff account. Role defaults to cashier.
    pub async fn create(&self, input: NewStaff) -> DbResult<Staff> {
        let name = validate_name("name", &input.name)?;
        let email = validate_email(&input.email)?;
        validate_password(&input.password)?;

        self.ensure_email_free(&email, None).await?;

        let staff = Staff {
            id: new_id(),
            name,
            email,
            role: input.role.unwrap_or_default(),
            created_at: Utc::now(),
        };
        let password_hash = hash_password(&input.password)?;

        sqlx::query(
            r#"
            INSERT INTO staff (id, name, email, password_hash, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&staff.id)
        .bind(&staff.name)
        .bind(&staff.email)
        .bind(&password_hash)
        .bind(staff.role)
        .bind(staff.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&staff.email))?;

        info!(id = %staff.id, role = %staff.role, "Staff account created");
        Ok(staff)
    }

    /// Updates name, email or role. None of them can be cleared.
    pub async fn update(&self, id: &str, update: StaffUpdate) -> DbResult<Staff> {
        let current = self.get(id).await?;

        let name = match update.name {
            FieldUpdate::Set(name) => validate_name("name", &name)?,
            other => other.resolve_required("name", current.name)?,
        };
        let email = match update.email {
            FieldUpdate::Set(email) => validate_email(&email)?,
            other => other.resolve_required("email", current.email)?,
        };
        let role = update.role.resolve_required("role", current.role)?;

        self.ensure_email_free(&email, Some(id)).await?;

        sqlx::query("UPDATE staff SET name = ?2, email = ?3, role = ?4 WHERE id = ?1")
            .bind(id)
            .bind(&name)
            .bind(&email)
            .bind(role)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).with_duplicate_value(&email))?;

        debug!(id = %id, "Staff account updated");
        Ok(Staff {
            id: id.to_string(),
            name,
            email,
            role,
            created_at: current.created_at,
        })
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM staff WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(EntityKind::Staff, id));
        }

        info!(id = %id, "Staff account deleted");
        Ok(())
    }

    /// Replaces the password after checking the current one.
    pub async fn change_password(&self, id: &str, current: &str, new: &str) -> DbResult<()> {
        validate_password(new)?;

        let stored: Option<String> = sqlx::query_scalar("SELECT password_hash FROM staff WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let stored = stored.ok_or_else(|| DbError::not_found(EntityKind::Staff, id))?;

        if !verify_password(current, &stored) {
            warn!(id = %id, "Password change rejected");
            return Err(ValidationError::Mismatch {
                field: "current password".to_string(),
            }
            .into());
        }

        sqlx::query("UPDATE staff SET password_hash = ?2 WHERE id = ?1")
            .bind(id)
            .bind(hash_password(new)?)
            .execute(&self.pool)
            .await?;

        info!(id = %id, "Password changed");
        Ok(())
    }

    /// Returns the account when email and password match.
    ///
    /// Unknown email and wrong password fail the same way.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> DbResult<Staff> {
        let email = email.trim().to_lowercase();

        let row: Option<(String, String)> =
            sqlx::query_as("SELECT id, password_hash FROM staff WHERE email = ?1")
                .bind(&email)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((id, hash)) if verify_password(password, &hash) => {
                debug!(id = %id, "Credentials verified");
                self.get(&id).await
            }
            _ => {
                warn!("Credential check failed");
                Err(ValidationError::Mismatch {
                    field: "credentials".to_string(),
                }
                .into())
            }
        }
    }

    async fn ensure_email_free(&self, email: &str, except_id: Option<&str>) -> DbResult<()> {
        let taken: Option<String> =
            sqlx::query_scalar("SELECT id FROM staff WHERE email = ?1 AND (?2 IS NULL OR id <> ?2)")
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

/// Hashes a password for storage (PHC string, random salt).
fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
