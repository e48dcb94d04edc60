//! API route definitions
//!
//! Author: hephaex@gmail.com

use crate::auth::{access_gate, refresh_gate};
use crate::handlers::{auth, books, health};
use crate::state::AppState;
use crate::ApiDoc;
use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create the user and book routes
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/users", post(auth::register_handler))
        .route("/api/users/_login", post(auth::login_handler));

    let refresh_routes = Router::new()
        .route("/api/users/_refresh", post(auth::refresh_handler))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            refresh_gate,
        ));

    let protected_routes = Router::new()
        .route("/api/users/_current", get(auth::current_handler))
        .route("/api/books", get(books::list_books).post(books::create_book))
        .route_layer(middleware::from_fn_with_state(state, access_gate));

    Router::new()
        .merge(public_routes)
        .merge(refresh_routes)
        .merge(protected_routes)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Build the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .merge(api_routes(Arc::clone(&state)))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
