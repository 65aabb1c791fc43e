//! Dispatch of token helper operations by [`TokenType`].

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use intranet_core::error::AppError;
use intranet_core::result::AppResult;
use intranet_security::{TokenType, TokenValue};

use super::{FlowArguments, TokenHelper};
use crate::context::HttpContext;
use crate::flow::FlowResult;

/// Registry of token helpers keyed by the token type each one reports.
#[derive(Clone, Default)]
pub struct TokenHelperFactory {
    helpers: HashMap<TokenType, Arc<dyn TokenHelper>>,
}

impl std::fmt::Debug for TokenHelperFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenHelperFactory")
            .field("token_types", &self.helpers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TokenHelperFactory {
    /// Builds the registry. A later helper for the same token type
    /// replaces an earlier one.
    pub fn new(helpers: impl IntoIterator<Item = Arc<dyn TokenHelper>>) -> Self {
        let mut registry = HashMap::new();
        for helper in helpers {
            let token_type = helper.token_type();
            if registry.insert(token_type, helper).is_some() {
                warn!(token_type = %token_type, "Token helper registered twice; keeping the last");
            }
        }
        Self { helpers: registry }
    }

    /// Token types with a registered helper.
    pub fn token_types(&self) -> impl Iterator<Item = TokenType> + '_ {
        self.helpers.keys().copied()
    }

    fn resolve(&self, token_type: TokenType, method: &str) -> AppResult<&Arc<dyn TokenHelper>> {
        self.helpers.get(&token_type).ok_or_else(|| not_supported(token_type, method))
    }

    /// Starts the authorization flow for `token_type`.
    pub async fn authorize(
        &self,
        token_type: TokenType,
        context: &HttpContext,
        return_url: Option<&str>,
    ) -> FlowResult {
        self.resolve(token_type, "authorize")?
            .authorize(context, return_url)
            .await
    }

    /// Completes the flow for `token_type` from the provider callback.
    pub async fn acquire_token(
        &self,
        token_type: TokenType,
        context: &HttpContext,
        arguments: &FlowArguments,
    ) -> FlowResult {
        self.resolve(token_type, "acquire_token")?
            .acquire_token(context, arguments)
            .await
    }

    /// Renews the stored token of `token_type`.
    pub async fn refresh_token(
        &self,
        token_type: TokenType,
        context: &HttpContext,
        return_url: Option<&str>,
    ) -> FlowResult {
        self.resolve(token_type, "refresh_token")?
            .refresh_token(context, return_url)
            .await
    }

    /// Stores a base64 token of `token_type`. Entry point for host
    /// controllers handing over a token they obtained themselves.
    pub async fn store_token(
        &self,
        token_type: TokenType,
        context: &HttpContext,
        base64_token: &str,
    ) -> AppResult<()> {
        self.resolve(token_type, "store_token")?
            .store_token(context, base64_token)
            .await
    }

    /// Restores the stored token of `token_type` as `T`.
    ///
    /// Fails when no helper is registered for `token_type` or when the
    /// helper does not store tokens of type `T`.
    pub async fn get_token<T: TokenValue>(
        &self,
        token_type: TokenType,
        context: &HttpContext,
    ) -> AppResult<Option<T>> {
        let helper = self.resolve(token_type, "get_token")?;
        if helper.token_kind() != T::KIND {
            return Err(not_supported(token_type, "get_token"));
        }

        Ok(helper
            .get_stored_token(context)
            .await
            .and_then(T::from_stored))
    }

    /// Deletes the token cookie of every registered helper concurrently.
    pub async fn handle_logout(&self, context: &HttpContext) {
        debug!(helpers = self.helpers.len(), "Logging out of every token type");
        join_all(
            self.helpers
                .values()
                .map(|helper| helper.handle_logout(context)),
        )
        .await;
    }
}

fn not_supported(token_type: TokenType, method: &str) -> AppError {
    AppError::not_supported(format!(
        "Token type '{token_type}' is not supported by '{method}'"
    ))
}
