//! Bookshelf API Server
//!
//! Author: hephaex@gmail.com

use bookshelf_api::{create_router, state::AppState};
use bookshelf_core::AppConfig;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // BOOKSHELF_CONFIG names an optional TOML file; env vars override it
    let config = match std::env::var("BOOKSHELF_CONFIG") {
        Ok(path) => AppConfig::from_file(path)?.with_env_override()?,
        Err(_) => AppConfig::from_env()?,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("bookshelf_api={0},audit={0},tower_http=info", config.logging.level).into()
    });
    if config.logging.json_format {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    if config.auth.uses_development_secrets() {
        tracing::warn!(
            "Using development signing secrets; set JWT_ACCESS_SECRET and JWT_REFRESH_SECRET"
        );
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = Arc::new(AppState::connect(config).await?);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Bookshelf API Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
