//! Persistence layer
//!
//! All reads and writes go through a [`StoreTx`] obtained from
//! [`Store::begin`]. The transaction is an owned guard: calling
//! [`StoreTx::commit`] consumes it, and dropping it any other way (early
//! return, error, panic, or the request future being cancelled) rolls back.
//!
//! Two backends exist:
//! - [`PgStore`]: PostgreSQL via SQLx
//! - [`MemoryStore`]: in-process tables, used by tests and `memory://` URLs

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::auth::models::User;
use crate::books::models::Book;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Repository errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("User not found")]
    UserNotFound,
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::DatabaseError(err.to_string())
    }
}

/// Source of transactions
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a new transaction
    async fn begin(&self) -> Result<Box<dyn StoreTx>, RepositoryError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Unit of work over users and books
///
/// Rolls back on drop unless committed.
#[async_trait]
pub trait StoreTx: Send {
    /// Find user by email
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// Find user by ID
    async fn find_user_by_id(&mut self, id: &str) -> Result<Option<User>, RepositoryError>;

    /// Count users with the given ID (0 or 1)
    async fn count_users_by_id(&mut self, id: &str) -> Result<i64, RepositoryError>;

    /// Insert a new user; fails with `EmailAlreadyExists` on a duplicate email
    async fn create_user(&mut self, user: &User) -> Result<(), RepositoryError>;

    /// Store the last issued access token on the user row
    async fn update_user_token(
        &mut self,
        id: &str,
        token: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// List all books
    async fn list_books(&mut self) -> Result<Vec<Book>, RepositoryError>;

    /// Insert a new book
    async fn create_book(&mut self, book: &Book) -> Result<(), RepositoryError>;

    /// Make every write of this transaction visible
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}
