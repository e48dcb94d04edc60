//! Authentication service layer
//!
//! Composes the password hasher, the token service and the store into the
//! register, login, refresh and identity verification flows. Every flow that
//! touches the store runs inside one transaction; an early return drops the
//! transaction handle, which rolls it back.
//!
//! Author: hephaex@gmail.com

use super::jwt::{JwtError, TokenPair, TokenService};
use super::models::{Identity, User, UserResponse};
use super::password::{hash_password_async, verify_password_async, PasswordConfig, PasswordError};
use crate::db::Store;
use crate::error::AppError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::OnceCell;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// User registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email, length(min = 1, max = 100))]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

/// User login request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 100))]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub password: String,
}

/// Login response: public profile plus a fresh token pair
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserResponse,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(format!("Password hashing failed: {err}"))
    }
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::InvalidToken => AppError::Unauthorized,
            other => AppError::Internal(format!("Token issuance failed: {other}")),
        }
    }
}

fn invalid_input(err: validator::ValidationErrors) -> AppError {
    tracing::warn!(error = %err, "Invalid request body");
    AppError::BadRequest(err.to_string())
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    tokens: TokenService,
    password_config: PasswordConfig,
    /// Digest checked when the email is unknown, so both login failures
    /// pay for one Argon2 verification
    dummy_hash: Arc<OnceCell<String>>,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, password_config: PasswordConfig) -> Self {
        Self {
            store,
            tokens,
            password_config,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    async fn dummy_hash(&self) -> Result<&str, AppError> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| {
                hash_password_async(Uuid::new_v4().to_string(), self.password_config.clone())
            })
            .await?;
        Ok(hash.as_str())
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Register a new user
    ///
    /// Fails with `Conflict` when the email is taken. The email check and the
    /// insert share a transaction; the store's unique constraint catches a
    /// concurrent registration that slips between them.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, AppError> {
        request.validate().map_err(invalid_input)?;

        let mut tx = self.store.begin().await?;

        if tx.find_user_by_email(&request.email).await?.is_some() {
            tracing::warn!(email = %request.email, "Email already registered");
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash =
            hash_password_async(request.password, self.password_config.clone()).await?;

        let user = User::new(request.email, password_hash, request.name);
        tx.create_user(&user).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.to_response())
    }

    /// Login with email and password
    ///
    /// An unknown email and a wrong password both yield `Unauthorized`.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        request.validate().map_err(invalid_input)?;

        let mut tx = self.store.begin().await?;

        let Some(mut user) = tx.find_user_by_email(&request.email).await? else {
            let dummy = self.dummy_hash().await?.to_string();
            verify_password_async(request.password, dummy).await?;
            tracing::warn!(email = %request.email, "Login failed: unknown email");
            return Err(AppError::Unauthorized);
        };

        if !verify_password_async(request.password, user.password_hash.clone()).await? {
            tracing::warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(AppError::Unauthorized);
        }

        let now = Utc::now();
        let tokens = self.tokens.issue_pair_at(&user.identity(), now)?;

        tx.update_user_token(&user.id, &tokens.access_token, now)
            .await?;
        tx.commit().await?;

        user.token = Some(tokens.access_token.clone());
        user.updated_at = now;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginResponse {
            user: user.to_response(),
            tokens,
        })
    }

    /// Issue a brand-new pair for an identity decoded from a refresh token
    ///
    /// Stateless: no rotation tracking, both tokens are reissued.
    pub async fn refresh_token(&self, identity: &Identity) -> Result<TokenPair, AppError> {
        identity.validate().map_err(invalid_input)?;

        let tokens = self.tokens.issue_pair(identity)?;
        tracing::debug!(user_id = %identity.id, "Token pair reissued");

        Ok(tokens)
    }

    /// Confirm that the identity still refers to an existing user
    pub async fn verify(&self, identity: &Identity) -> Result<(), AppError> {
        identity.validate().map_err(invalid_input)?;

        let mut tx = self.store.begin().await?;
        let count = tx.count_users_by_id(&identity.id).await?;
        tx.commit().await?;

        if count == 0 {
            tracing::warn!(user_id = %identity.id, "Token identity no longer exists");
            return Err(AppError::NotFound("User".to_string()));
        }

        Ok(())
    }

    /// Current profile of the authenticated user
    pub async fn current(&self, identity: &Identity) -> Result<UserResponse, AppError> {
        let mut tx = self.store.begin().await?;
        let user = tx
            .find_user_by_id(&identity.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;
        tx.commit().await?;

        Ok(user.to_response())
    }
}
