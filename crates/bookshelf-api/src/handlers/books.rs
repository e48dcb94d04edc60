//! Book handlers
//!
//! Both routes sit behind the access gate.
//!
//! Author: hephaex@gmail.com

use super::{BookEnvelope, BookListEnvelope, WebResponse};
use crate::books::CreateBookRequest;
use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

/// List all books
#[utoipa::path(
    get,
    path = "/api/books",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = BookListEnvelope),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_books(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let books = state.books.list().await?;

    Ok(Json(WebResponse::new(books)))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/api/books",
    tag = "books",
    request_body = CreateBookRequest,
    responses(
        (status = 200, description = "Book created", body = BookEnvelope),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateBookRequest>,
) -> Result<impl IntoResponse, AppError> {
    let book = state.books.create(request).await?;

    Ok(Json(WebResponse::new(book)))
}
