//! User account handlers
//!
//! Register and login are public. Refresh sits behind the refresh gate and
//! the current-profile route behind the access gate; both read the bearer
//! [`Identity`] the gate attached to the request.
//!
//! Author: hephaex@gmail.com

use super::{LoginEnvelope, TokenPairEnvelope, UserEnvelope, WebResponse};
use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::auth::{Identity, LoginRequest, RegisterRequest};
use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, http::HeaderMap, response::IntoResponse, Extension, Json};
use std::sync::Arc;

fn failure_reason(err: &AppError) -> String {
    match err {
        AppError::BadRequest(_) => "Invalid request".to_string(),
        AppError::Unauthorized => "Invalid credentials".to_string(),
        AppError::Conflict(msg) => msg.clone(),
        _ => "Internal error".to_string(),
    }
}

/// Register a new user account
///
/// # Responses
///
/// * `200 OK` - User registered, returns the public profile
/// * `400 Bad Request` - Missing field or field longer than 100 characters
/// * `409 Conflict` - Email already registered
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered", body = UserEnvelope),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 409, description = "Email already registered", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = request.email.clone();
    let ip_address = extract_ip_address(&headers);
    let user_agent = extract_user_agent(&headers);

    match state.auth.register(request).await {
        Ok(user) => {
            audit_log(&AuditEvent::RegistrationSuccess {
                user_id: user.id.clone(),
                email,
                ip_address,
                user_agent,
            });
            Ok(Json(WebResponse::new(user)))
        }
        Err(e) => {
            audit_log(&AuditEvent::RegistrationFailure {
                email,
                reason: failure_reason(&e),
                ip_address,
                user_agent,
            });
            Err(e)
        }
    }
}

/// Login with email and password
///
/// Unknown email and wrong password produce the same 401.
#[utoipa::path(
    post,
    path = "/api/users/_login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginEnvelope),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = request.email.clone();
    let ip_address = extract_ip_address(&headers);
    let user_agent = extract_user_agent(&headers);

    match state.auth.login(request).await {
        Ok(response) => {
            audit_log(&AuditEvent::LoginSuccess {
                user_id: response.user.id.clone(),
                email,
                ip_address,
                user_agent,
            });
            Ok(Json(WebResponse::new(response)))
        }
        Err(e) => {
            audit_log(&AuditEvent::LoginFailure {
                email,
                reason: failure_reason(&e),
                ip_address,
                user_agent,
            });
            Err(e)
        }
    }
}

/// Exchange a refresh token for a new token pair
///
/// Expects `Authorization: Refresh <refresh_token>`.
#[utoipa::path(
    post,
    path = "/api/users/_refresh",
    tag = "users",
    responses(
        (status = 200, description = "New token pair", body = TokenPairEnvelope),
        (status = 401, description = "Invalid refresh token", body = crate::error::ApiError),
    ),
    security(
        ("refresh_auth" = [])
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let tokens = state.auth.refresh_token(&identity).await?;

    audit_log(&AuditEvent::TokenRefresh {
        user_id: identity.id,
        email: identity.email,
        ip_address: extract_ip_address(&headers),
        user_agent: extract_user_agent(&headers),
    });

    Ok(Json(WebResponse::new(tokens)))
}

/// Get the authenticated user's profile
#[utoipa::path(
    get,
    path = "/api/users/_current",
    tag = "users",
    responses(
        (status = 200, description = "Current user profile", body = UserEnvelope),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn current_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth.current(&identity).await?;

    Ok(Json(WebResponse::new(user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reason_hides_internals() {
        assert_eq!(
            failure_reason(&AppError::Database("connection refused".to_string())),
            "Internal error"
        );
        assert_eq!(failure_reason(&AppError::Unauthorized), "Invalid credentials");
    }
}
