//! Data structures for authentication
//!
//! - User: persisted account row
//! - UserResponse: public profile, safe for API responses
//! - Identity: bearer identity carried inside tokens

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// User account model
///
/// Maps to the `users` table. The password column stores an Argon2id PHC
/// string, never the plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user identifier (UUID v4 text)
    pub id: String,

    /// Hashed password, never serialized
    #[serde(skip_serializing)]
    #[sqlx(rename = "password")]
    pub password_hash: String,

    /// Email address (unique, used for login)
    pub email: String,

    /// Display name
    pub name: String,

    /// Last access token issued at login
    #[serde(skip_serializing)]
    pub token: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with a freshly generated identifier
    pub fn new(email: String, password_hash: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            password_hash,
            email,
            name,
            token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Identity embedded in tokens issued for this user
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }

    /// Convert user to public representation (without credentials)
    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            created_at: self.created_at.timestamp(),
            updated_at: self.updated_at.timestamp(),
        }
    }
}

/// Public user representation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Unix epoch seconds
    pub created_at: i64,
    /// Unix epoch seconds
    pub updated_at: i64,
}

/// Identity of a token bearer
///
/// Decoded from token claims on every authenticated request and attached to
/// the request extensions once the gate lets it through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Identity {
    #[serde(rename = "user_id")]
    #[validate(length(min = 1, max = 100))]
    pub id: String,

    #[validate(length(min = 1, max = 100))]
    pub email: String,

    #[validate(length(min = 1, max = 100))]
    pub name: String,
}
