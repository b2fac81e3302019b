//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db::{CredentialStore, PgCredentialStore, PgProductRepository, ProductRepository};
use crate::services::TokenService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// configuration, the token service and the storage backends.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pool: Option<PgPool>,
    tokens: TokenService,
    users: Arc<dyn CredentialStore>,
    products: Arc<dyn ProductRepository>,
}

impl AppState {
    /// Create application state backed by `PostgreSQL`.
    #[must_use]
    pub fn new(config: AppConfig, pool: PgPool) -> Self {
        let users = Arc::new(PgCredentialStore::new(pool.clone()));
        let products = Arc::new(PgProductRepository::new(pool.clone()));
        Self::build(config, Some(pool), users, products)
    }

    /// Create application state over arbitrary stores, without a pool.
    #[must_use]
    pub fn with_stores(
        config: AppConfig,
        users: Arc<dyn CredentialStore>,
        products: Arc<dyn ProductRepository>,
    ) -> Self {
        Self::build(config, None, users, products)
    }

    fn build(
        config: AppConfig,
        pool: Option<PgPool>,
        users: Arc<dyn CredentialStore>,
        products: Arc<dyn ProductRepository>,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                users,
                products,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the database pool, if the state is backed by `PostgreSQL`.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get a reference to the bearer token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get the account store.
    #[must_use]
    pub fn users(&self) -> &dyn CredentialStore {
        self.inner.users.as_ref()
    }

    /// Get the product repository.
    #[must_use]
    pub fn products(&self) -> &dyn ProductRepository {
        self.inner.products.as_ref()
    }
}
