//! Authentication gates for protecting routes
//!
//! A gate reads `Authorization: <Scheme> <token>`, verifies the token for
//! its class, optionally confirms the identity still exists, and attaches
//! the [`Identity`] to the request extensions. Handlers behind the gate
//! extract it with `Extension<Identity>`.
//!
//! Every rejection produces the same 401 body. The specific reason only
//! reaches the audit log.
//!
//! Author: hephaex@gmail.com

use super::jwt::{JwtError, TokenClass};
use super::models::Identity;
use super::service::AuthService;
use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use thiserror::Error;

/// Gate rejection reasons
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] JwtError),

    #[error("Token identity rejected: {0:?}")]
    IdentityRejected(AppError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        AppError::Unauthorized.into_response()
    }
}

/// Per-route authentication policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthGate {
    class: TokenClass,
    verify_identity: bool,
}

impl AuthGate {
    /// Gate for ordinary API calls: `Bearer` access tokens, identity checked
    pub fn access() -> Self {
        Self {
            class: TokenClass::Access,
            verify_identity: true,
        }
    }

    /// Gate for the refresh endpoint: `Refresh` tokens
    pub fn refresh(verify_identity: bool) -> Self {
        Self {
            class: TokenClass::Refresh,
            verify_identity,
        }
    }

    pub fn class(&self) -> TokenClass {
        self.class
    }

    pub fn verifies_identity(&self) -> bool {
        self.verify_identity
    }

    /// Resolve the bearer identity from request headers
    ///
    /// The store is consulted only after the header and token checks pass.
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        auth: &AuthService,
    ) -> Result<Identity, AuthError> {
        let value = headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = value
            .strip_prefix(self.class.scheme())
            .and_then(|rest| rest.strip_prefix(' '))
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::InvalidAuthHeader)?;

        let claims = auth.tokens().verify(token, self.class)?;

        if self.verify_identity {
            auth.verify(&claims.user)
                .await
                .map_err(AuthError::IdentityRejected)?;
        }

        Ok(claims.user)
    }

    async fn run(
        &self,
        auth: &AuthService,
        mut request: Request<Body>,
        next: Next,
    ) -> Result<Response, AuthError> {
        let outcome = self.authorize(request.headers(), auth).await;
        match outcome {
            Ok(identity) => {
                tracing::debug!(user_id = %identity.id, class = %self.class, "Request authorized");
                request.extensions_mut().insert(identity);
                Ok(next.run(request).await)
            }
            Err(e) => {
                tracing::warn!(class = %self.class, reason = %e, "Request rejected");
                audit_log(&AuditEvent::InvalidToken {
                    scheme: self.class.scheme().to_string(),
                    reason: e.to_string(),
                    ip_address: extract_ip_address(request.headers()),
                    user_agent: extract_user_agent(request.headers()),
                });
                Err(e)
            }
        }
    }
}

/// Middleware guarding routes with the access gate
///
/// # Usage
///
/// ```ignore
/// use axum::{middleware, routing::get, Router};
/// use bookshelf_api::auth::middleware::access_gate;
///
/// let app = Router::new()
///     .route("/api/books", get(list_books))
///     .route_layer(middleware::from_fn_with_state(state.clone(), access_gate));
/// ```
pub async fn access_gate(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    state.access_gate.run(&state.auth, request, next).await
}

/// Middleware guarding the refresh endpoint with the refresh gate
pub async fn refresh_gate(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    state.refresh_gate.run(&state.auth, request, next).await
}
