//! Application state management
//!
//! Author: hephaex@gmail.com

use crate::auth::{AuthGate, AuthService, PasswordConfig, TokenService};
use crate::books::BookService;
use crate::db::{MemoryStore, PgStore, Store};
use bookshelf_core::{AppConfig, BookshelfError};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
///
/// Built once at startup from an immutable [`AppConfig`]; nothing in it is
/// mutated afterwards.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Backing store
    pub store: Arc<dyn Store>,
    /// Register, login, refresh and identity checks
    pub auth: AuthService,
    /// Book catalogue
    pub books: BookService,
    /// Policy for `Bearer` routes
    pub access_gate: AuthGate,
    /// Policy for the `Refresh` route
    pub refresh_gate: AuthGate,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create state over an existing store
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        Self::with_password_config(config, store, PasswordConfig::default())
    }

    /// Create state with explicit Argon2 parameters
    pub fn with_password_config(
        config: AppConfig,
        store: Arc<dyn Store>,
        password_config: PasswordConfig,
    ) -> Self {
        let tokens = TokenService::new(&config.auth);
        let auth = AuthService::new(Arc::clone(&store), tokens, password_config);
        let books = BookService::new(Arc::clone(&store));
        let refresh_gate = AuthGate::refresh(config.auth.refresh_verifies_identity);

        Self {
            config,
            store,
            auth,
            books,
            access_gate: AuthGate::access(),
            refresh_gate,
            start_time: Instant::now(),
        }
    }

    /// Validate `config`, open the store named by `config.database.url`
    /// and build state over it
    pub async fn connect(config: AppConfig) -> bookshelf_core::Result<Self> {
        config.validate()?;

        let store: Arc<dyn Store> = if config.database.is_memory() {
            tracing::warn!("Using in-memory store, data is lost on shutdown");
            Arc::new(MemoryStore::new())
        } else {
            let store = PgStore::connect(&config.database.url, config.database.pool_size)
                .await
                .map_err(|e| BookshelfError::DatabaseError(e.to_string()))?;
            Arc::new(store)
        };

        tracing::info!(store = store.name(), "Store ready");
        Ok(Self::new(config, store))
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
