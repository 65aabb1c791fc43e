//! Access token without refresh capability.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use intranet_core::result::AppResult;

use super::creator::TokenCreator;
use super::{StoredToken, TokenFields, TokenKind, TokenValue};

/// Immutable access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    token_type: String,
    access_token: String,
    expires: DateTime<Utc>,
}

impl Token {
    pub(crate) fn new(token_type: String, access_token: String, expires: DateTime<Utc>) -> Self {
        Self {
            token_type,
            access_token,
            expires,
        }
    }

    /// Starts a fluent creator for a token.
    pub fn create() -> TokenCreator<Token> {
        TokenCreator::new()
    }

    /// Builds a token from any command or query exposing token fields.
    pub fn from_token_fields<F: TokenFields + ?Sized>(fields: &F) -> AppResult<Self> {
        Self::create()
            .with_token_type(fields.token_type())?
            .with_access_token(fields.access_token())?
            .with_expires(fields.expires())
            .build()
    }
}

impl TokenValue for Token {
    const KIND: TokenKind = TokenKind::Access;

    fn token_type(&self) -> &str {
        &self.token_type
    }

    fn access_token(&self) -> &str {
        &self.access_token
    }

    fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    fn into_stored(self) -> StoredToken {
        StoredToken::Access(self)
    }

    fn from_stored(stored: StoredToken) -> Option<Self> {
        match stored {
            StoredToken::Access(token) => Some(token),
            StoredToken::Refreshable(_) => None,
        }
    }
}
