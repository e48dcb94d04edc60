//! API handlers
//!
//! Successful responses are wrapped as `{"data": ...}`.
//!
//! Author: hephaex@gmail.com

pub mod auth;
pub mod books;
pub mod health;

use crate::auth::{LoginResponse, TokenPair, UserResponse};
use crate::books::Book;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response envelope
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[aliases(
    UserEnvelope = WebResponse<UserResponse>,
    LoginEnvelope = WebResponse<LoginResponse>,
    TokenPairEnvelope = WebResponse<TokenPair>,
    BookEnvelope = WebResponse<Book>,
    BookListEnvelope = WebResponse<Vec<Book>>
)]
pub struct WebResponse<T> {
    pub data: T,
}

impl<T> WebResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
