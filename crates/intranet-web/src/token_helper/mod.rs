//! Cookie-backed token helpers, one per [`TokenType`].
//!
//! A helper turns the authorize / acquire / refresh / store / logout
//! operations into browser redirects and protected cookies, and delegates
//! the actual token exchange to a command bus.

pub mod base;
pub mod factory;
pub mod strategy;

use std::collections::HashMap;

use async_trait::async_trait;

use intranet_core::result::AppResult;
use intranet_security::{StoredToken, TokenKind, TokenType};

use crate::context::HttpContext;
use crate::flow::FlowResult;

pub use base::{TokenHelperBase, TokenHelperStrategy};
pub use factory::TokenHelperFactory;
pub use strategy::{AuthorizationCodeStrategy, RefreshPolicy};

/// Query arguments received by the provider callback.
pub type FlowArguments = HashMap<String, String>;

/// Cookie lifecycle of one token type.
#[async_trait]
pub trait TokenHelper: Send + Sync {
    /// Token type served by this helper.
    fn token_type(&self) -> TokenType;

    /// Kind of token this helper stores.
    fn token_kind(&self) -> TokenKind;

    /// Starts the authorization flow, redirecting to the provider.
    async fn authorize(&self, context: &HttpContext, return_url: Option<&str>) -> FlowResult;

    /// Completes the flow from the provider callback, storing the token
    /// and redirecting to the original return URL.
    async fn acquire_token(&self, context: &HttpContext, arguments: &FlowArguments) -> FlowResult;

    /// Renews the stored token and redirects to `return_url`.
    async fn refresh_token(&self, context: &HttpContext, return_url: Option<&str>) -> FlowResult;

    /// Stores a token handed over as base64; ignores blobs that do not
    /// restore to a token. Called by host controllers that obtained a
    /// token outside the redirect flows.
    async fn store_token(&self, context: &HttpContext, base64_token: &str) -> AppResult<()>;

    /// Restores the stored token, or `None` when absent or garbled.
    async fn get_stored_token(&self, context: &HttpContext) -> Option<StoredToken>;

    /// Deletes the token cookie.
    async fn handle_logout(&self, context: &HttpContext);
}
