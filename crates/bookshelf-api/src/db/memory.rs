//! In-process store
//!
//! A transaction reads the committed tables through the lock until its
//! first write. That write takes a private copy, and later reads see the
//! copy, own writes included. `commit` replays the recorded writes on the
//! shared tables under a write lock, re-checking email uniqueness against
//! rows committed in the meantime. Dropping the transaction discards them.

use super::{RepositoryError, Store, StoreTx};
use crate::auth::models::User;
use crate::books::models::Book;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<String, User>,
    books: Vec<Book>,
}

impl Tables {
    fn email_taken(&self, email: &str) -> bool {
        self.users.values().any(|u| u.email == email)
    }

    fn apply(&mut self, write: &Write) -> Result<(), RepositoryError> {
        match write {
            Write::CreateUser(user) => {
                if self.email_taken(&user.email) {
                    return Err(RepositoryError::EmailAlreadyExists);
                }
                self.users.insert(user.id.clone(), user.clone());
            }
            Write::UpdateToken {
                id,
                token,
                updated_at,
            } => {
                let user = self.users.get_mut(id).ok_or(RepositoryError::UserNotFound)?;
                user.token = Some(token.clone());
                user.updated_at = *updated_at;
            }
            Write::CreateBook(book) => self.books.push(book.clone()),
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Write {
    CreateUser(User),
    UpdateToken {
        id: String,
        token: String,
        updated_at: DateTime<Utc>,
    },
    CreateBook(Book),
}

/// In-memory store shared by clones
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed users
    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }
}

impl MemoryStore {
    fn open(&self) -> MemoryTx {
        MemoryTx {
            shared: Arc::clone(&self.tables),
            local: None,
            writes: Vec::new(),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, RepositoryError> {
        Ok(Box::new(self.open()))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

struct MemoryTx {
    shared: Arc<RwLock<Tables>>,
    /// Private copy, taken on the first write
    local: Option<Tables>,
    writes: Vec<Write>,
}

impl MemoryTx {
    async fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        match &self.local {
            Some(tables) => f(tables),
            None => f(&*self.shared.read().await),
        }
    }

    async fn record(&mut self, write: Write) -> Result<(), RepositoryError> {
        let mut local = match self.local.take() {
            Some(tables) => tables,
            None => self.shared.read().await.clone(),
        };
        let applied = local.apply(&write);
        self.local = Some(local);

        applied?;
        self.writes.push(write);
        Ok(())
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .read(|t| t.users.values().find(|u| u.email == email).cloned())
            .await)
    }

    async fn find_user_by_id(&mut self, id: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.read(|t| t.users.get(id).cloned()).await)
    }

    async fn count_users_by_id(&mut self, id: &str) -> Result<i64, RepositoryError> {
        Ok(self
            .read(|t| i64::from(t.users.contains_key(id)))
            .await)
    }

    async fn create_user(&mut self, user: &User) -> Result<(), RepositoryError> {
        self.record(Write::CreateUser(user.clone())).await
    }

    async fn update_user_token(
        &mut self,
        id: &str,
        token: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.record(Write::UpdateToken {
            id: id.to_string(),
            token: token.to_string(),
            updated_at,
        })
        .await
    }

    async fn list_books(&mut self) -> Result<Vec<Book>, RepositoryError> {
        Ok(self.read(|t| t.books.clone()).await)
    }

    async fn create_book(&mut self, book: &Book) -> Result<(), RepositoryError> {
        self.record(Write::CreateBook(book.clone())).await
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let mut shared = self.shared.write().await;

        // Validate against a scratch copy so a failed commit leaves nothing behind.
        let mut next = shared.clone();
        for write in &self.writes {
            next.apply(write)?;
        }
        *shared = next;

        Ok(())
    }
}
