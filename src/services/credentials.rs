//! Credential store: identity lookup, allow-list checks, account creation.
//!
//! ARCHITECTURE
//! ============
//! Handlers talk to the `CredentialStore` trait so the auth flow can be
//! exercised without Postgres. `PgCredentialStore` is the production
//! implementation.
//!
//! TRADE-OFFS
//! ==========
//! Uniqueness of login and email is enforced by table constraints rather
//! than a read-then-write check. Concurrent registrations race on the
//! `INSERT` and the loser gets `StoreError::Duplicate`.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub login: String,
    pub email: String,
    /// Argon2id PHC string. Never leaves the server.
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Public projection of an [`Identity`], without the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: i64,
    pub login: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<&Identity> for UserView {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            login: identity.login.clone(),
            email: identity.email.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
        }
    }
}

/// Fields needed to create an identity. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub login: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Column whose uniqueness constraint rejected an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Login,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Email => f.write_str("email"),
            Self::Login => f.write_str("login"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate {0}")]
    Duplicate(UniqueField),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Persistence seam for identities. Emails are passed already normalized.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Identity>, StoreError>;

    async fn find_by_login(&self, login: &str) -> Result<Option<Identity>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    /// Whether `email` is on the registration allow-list.
    async fn is_preverified(&self, email: &str) -> Result<bool, StoreError>;

    /// Atomically create an identity, failing if login or email is taken.
    async fn create(&self, new: NewIdentity) -> Result<Identity, StoreError>;
}

// =============================================================================
// POSTGRES
// =============================================================================

const IDENTITY_COLUMNS: &str = "id, login, email, password_hash, first_name, last_name";

pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<Identity>, StoreError> {
        let sql = format!("SELECT {IDENTITY_COLUMNS} FROM users WHERE {column} = $1");
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_identity))
    }
}

fn row_to_identity(row: &PgRow) -> Identity {
    Identity {
        id: row.get("id"),
        login: row.get("login"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
    }
}

/// Map a unique-constraint violation to the offending column.
pub(crate) fn unique_field_for_constraint(constraint: Option<&str>) -> UniqueField {
    match constraint {
        Some(name) if name.contains("login") => UniqueField::Login,
        _ => UniqueField::Email,
    }
}

fn map_insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate(unique_field_for_constraint(db_err.constraint()));
        }
    }
    StoreError::Db(err)
}

#[async_trait::async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Identity>, StoreError> {
        let sql = format!("SELECT {IDENTITY_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_identity))
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<Identity>, StoreError> {
        self.find_one("login", login).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        self.find_one("email", email).await
    }

    async fn is_preverified(&self, email: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM preverified_emails WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn create(&self, new: NewIdentity) -> Result<Identity, StoreError> {
        let sql = format!(
            "INSERT INTO users (login, email, password_hash, first_name, last_name)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {IDENTITY_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&new.login)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(&new.first_name)
            .bind(&new.last_name)
            .fetch_one(&self.pool)
            .await
            .map_err(map_insert_error)?;
        Ok(row_to_identity(&row))
    }
}

#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;
