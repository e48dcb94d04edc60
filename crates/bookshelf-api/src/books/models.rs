//! Book entity and request/response shapes

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Book row in the `books` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author_id: String,
}

impl Book {
    pub fn new(title: String, author_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            author_id,
        }
    }
}

/// Book creation request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBookRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(min = 1, max = 100))]
    pub author_id: String,
}
