//! Commands exchanging authorization codes and refresh tokens for tokens.

use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use url::Url;

use intranet_core::traits::Command;

use crate::token::{
    RefreshableToken, RefreshableTokenFields, RefreshableTokenValue, TokenFields, TokenType,
    TokenValue,
};

/// Exchanges an authorization code for a token of type `T`.
///
/// The bus answers `None` when the provider refuses the code.
pub struct AcquireTokenCommand<T> {
    /// Credential family being acquired.
    pub token_type: TokenType,
    /// Code returned to the callback by the provider.
    pub authorization_code: String,
    /// Callback URI the code was issued for.
    pub redirect_uri: Url,
    _token: PhantomData<fn() -> T>,
}

impl<T> AcquireTokenCommand<T> {
    /// Creates the command.
    pub fn new(token_type: TokenType, authorization_code: impl Into<String>, redirect_uri: Url) -> Self {
        Self {
            token_type,
            authorization_code: authorization_code.into(),
            redirect_uri,
            _token: PhantomData,
        }
    }
}

impl<T> Clone for AcquireTokenCommand<T> {
    fn clone(&self) -> Self {
        Self::new(
            self.token_type,
            self.authorization_code.clone(),
            self.redirect_uri.clone(),
        )
    }
}

impl<T> fmt::Debug for AcquireTokenCommand<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcquireTokenCommand")
            .field("token_type", &self.token_type)
            .field("redirect_uri", &self.redirect_uri.as_str())
            .finish_non_exhaustive()
    }
}

impl<T: TokenValue> Command for AcquireTokenCommand<T> {
    type Output = Option<T>;
}

/// Renews a refreshable token with its refresh token.
///
/// The bus answers `None` when the provider refuses the refresh token.
#[derive(Debug, Clone)]
pub struct RefreshTokenCommand {
    /// Credential family being refreshed.
    pub token_type: TokenType,
    token: RefreshableToken,
}

impl RefreshTokenCommand {
    /// Creates the command for `token`.
    pub fn new(token_type: TokenType, token: RefreshableToken) -> Self {
        Self { token_type, token }
    }

    /// The token being refreshed.
    pub fn token(&self) -> &RefreshableToken {
        &self.token
    }
}

impl TokenFields for RefreshTokenCommand {
    fn token_type(&self) -> &str {
        self.token.token_type()
    }

    fn access_token(&self) -> &str {
        self.token.access_token()
    }

    fn expires(&self) -> DateTime<Utc> {
        self.token.expires()
    }
}

impl RefreshableTokenFields for RefreshTokenCommand {
    fn refresh_token(&self) -> &str {
        self.token.refresh_token()
    }
}

impl Command for RefreshTokenCommand {
    type Output = Option<RefreshableToken>;
}
