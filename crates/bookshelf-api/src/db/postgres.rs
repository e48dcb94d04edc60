//! PostgreSQL store
//!
//! Expects the following tables to exist (schema management is external):
//!
//! ```sql
//! CREATE TABLE users (
//!     id          TEXT PRIMARY KEY,
//!     password    TEXT NOT NULL,
//!     email       TEXT NOT NULL UNIQUE,
//!     name        TEXT NOT NULL,
//!     token       TEXT,
//!     created_at  TIMESTAMPTZ NOT NULL,
//!     updated_at  TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE books (
//!     id         TEXT PRIMARY KEY,
//!     title      TEXT NOT NULL,
//!     author_id  TEXT NOT NULL
//! );
//! ```

use super::{RepositoryError, Store, StoreTx};
use crate::auth::models::User;
use crate::books::models::Book;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};

const USER_COLUMNS: &str = "id, password, email, name, token, created_at, updated_at";

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new connection pool
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| {
                RepositoryError::DatabaseError(format!("PostgreSQL connection failed: {e}"))
            })?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    fn name(&self) -> &str {
        "postgres"
    }
}

/// Open PostgreSQL transaction; SQLx rolls it back when dropped
struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 LIMIT 1"
        ))
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&mut self, id: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(user)
    }

    async fn count_users_by_id(&mut self, id: &str) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = $1")
            .bind(id)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(count)
    }

    async fn create_user(&mut self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, password, email, name, token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&user.id)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.token)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
                RepositoryError::EmailAlreadyExists
            } else {
                RepositoryError::from(e)
            }
        })?;

        Ok(())
    }

    async fn update_user_token(
        &mut self,
        id: &str,
        token: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET token = $1, updated_at = $2 WHERE id = $3")
            .bind(token)
            .bind(updated_at)
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::UserNotFound);
        }

        Ok(())
    }

    async fn list_books(&mut self) -> Result<Vec<Book>, RepositoryError> {
        let books = sqlx::query_as::<_, Book>("SELECT id, title, author_id FROM books ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(books)
    }

    async fn create_book(&mut self, book: &Book) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO books (id, title, author_id) VALUES ($1, $2, $3)")
            .bind(&book.id)
            .bind(&book.title)
            .bind(&book.author_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
