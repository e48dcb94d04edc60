//! Bookshelf API - user accounts and a book catalogue over HTTP
//!
//! Authentication uses two token classes: `Bearer` access tokens for
//! ordinary calls and `Refresh` tokens for minting a new pair.
//!
//! Author: hephaex@gmail.com

pub mod audit;
pub mod auth;
pub mod books;
pub mod db;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;

use auth::PasswordConfig;
use bookshelf_core::AppConfig;
use db::MemoryStore;
use state::AppState;
use std::sync::Arc;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI document served at `/api-docs/openapi.json`
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::auth::register_handler,
        handlers::auth::login_handler,
        handlers::auth::refresh_handler,
        handlers::auth::current_handler,
        handlers::books::list_books,
        handlers::books::create_book,
    ),
    components(schemas(
        handlers::health::HealthResponse,
        handlers::health::ReadinessResponse,
        handlers::UserEnvelope,
        handlers::LoginEnvelope,
        handlers::TokenPairEnvelope,
        handlers::BookEnvelope,
        handlers::BookListEnvelope,
        auth::RegisterRequest,
        auth::LoginRequest,
        auth::LoginResponse,
        auth::TokenPair,
        auth::UserResponse,
        books::Book,
        books::CreateBookRequest,
        error::ApiError,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "users", description = "Registration, login and token refresh"),
        (name = "books", description = "Book catalogue"),
        (name = "health", description = "Liveness and readiness probes"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "refresh_auth",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "Authorization",
                    "Refresh <refresh_token>",
                ))),
            );
        }
    }
}

/// State over a fresh in-memory store with cheap password hashing
pub fn testing_state() -> Arc<AppState> {
    let mut config = AppConfig::default();
    config.database.url = "memory://".to_string();

    Arc::new(AppState::with_password_config(
        config,
        Arc::new(MemoryStore::new()),
        PasswordConfig::insecure_fast(),
    ))
}

/// Router over [`testing_state`]
pub fn create_router_for_testing() -> axum::Router {
    create_router(testing_state())
}
