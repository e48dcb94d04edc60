//! Book listing and creation

use super::models::{Book, CreateBookRequest};
use crate::db::Store;
use crate::error::AppError;
use std::sync::Arc;
use validator::Validate;

/// Book service
#[derive(Clone)]
pub struct BookService {
    store: Arc<dyn Store>,
}

impl BookService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// List every book
    pub async fn list(&self) -> Result<Vec<Book>, AppError> {
        let mut tx = self.store.begin().await?;
        let books = tx.list_books().await?;
        tx.commit().await?;

        Ok(books)
    }

    /// Create a book with a generated identifier
    pub async fn create(&self, request: CreateBookRequest) -> Result<Book, AppError> {
        request.validate().map_err(|e| {
            tracing::warn!(error = %e, "Invalid book request");
            AppError::BadRequest(e.to_string())
        })?;

        let book = Book::new(request.title, request.author_id);

        let mut tx = self.store.begin().await?;
        tx.create_book(&book).await?;
        tx.commit().await?;

        tracing::debug!(book_id = %book.id, "Book created");
        Ok(book)
    }
}
