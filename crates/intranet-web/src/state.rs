//! Application state shared across all handlers.

use std::sync::Arc;

use intranet_core::config::AppConfig;
use intranet_security::ScopeCatalog;

use crate::token_helper::TokenHelperFactory;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Token helpers keyed by token type
    pub token_helpers: Arc<TokenHelperFactory>,
    /// Scopes the authorization server supports
    pub supported_scopes: Arc<ScopeCatalog>,
}

impl AppState {
    /// Creates the state.
    pub fn new(
        config: AppConfig,
        token_helpers: TokenHelperFactory,
        supported_scopes: ScopeCatalog,
    ) -> Self {
        Self {
            config: Arc::new(config),
            token_helpers: Arc::new(token_helpers),
            supported_scopes: Arc::new(supported_scopes),
        }
    }
}
