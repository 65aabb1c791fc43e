//! Token value types, their byte/base64 codec and fluent creators.

pub mod access;
pub mod creator;
pub mod refreshable;

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use intranet_core::error::AppError;
use intranet_core::result::AppResult;

pub use access::Token;
pub use creator::{CreatableToken, RefreshableTokenCreator, TokenCreator};
pub use refreshable::RefreshableToken;

/// The credential families the intranet stores on behalf of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TokenType {
    /// Microsoft identity platform token for the Graph API (refreshable).
    #[serde(rename = "microsoft-graph")]
    MicrosoftGraphToken,
    /// Google APIs token (refreshable).
    #[serde(rename = "google-apis")]
    GoogleApisToken,
    /// Token issued by the intranet's own authorization server.
    #[serde(rename = "intranet-api")]
    IntranetApiToken,
}

impl TokenType {
    /// All token types.
    pub const ALL: [TokenType; 3] = [
        Self::MicrosoftGraphToken,
        Self::GoogleApisToken,
        Self::IntranetApiToken,
    ];

    /// Stable name used in cookie names and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MicrosoftGraphToken => "MicrosoftGraphToken",
            Self::GoogleApisToken => "GoogleApisToken",
            Self::IntranetApiToken => "IntranetApiToken",
        }
    }

    /// URL path segment for this token type.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::MicrosoftGraphToken => "microsoft-graph",
            Self::GoogleApisToken => "google-apis",
            Self::IntranetApiToken => "intranet-api",
        }
    }

    /// Kind of token issued for this type.
    pub fn token_kind(&self) -> TokenKind {
        match self {
            Self::MicrosoftGraphToken | Self::GoogleApisToken => TokenKind::Refreshable,
            Self::IntranetApiToken => TokenKind::Access,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.slug().eq_ignore_ascii_case(s) || t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::not_supported(format!("Unknown token type: {s}")))
    }
}

/// Whether a token carries a refresh token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Access token only.
    Access,
    /// Access token plus refresh token.
    Refreshable,
}

/// A token of either kind, as restored from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredToken {
    /// Access token only.
    Access(Token),
    /// Access token plus refresh token.
    Refreshable(RefreshableToken),
}

impl StoredToken {
    /// Kind of the wrapped token.
    pub fn kind(&self) -> TokenKind {
        match self {
            Self::Access(_) => TokenKind::Access,
            Self::Refreshable(_) => TokenKind::Refreshable,
        }
    }
}

/// Behaviour shared by every token value.
///
/// The byte layout is the token's JSON serialization; it is opaque to
/// callers and only guaranteed to round-trip through the `from_*`
/// constructors of the same type.
pub trait TokenValue:
    Serialize + DeserializeOwned + Clone + fmt::Debug + PartialEq + Send + Sync + 'static
{
    /// Kind of this token type.
    const KIND: TokenKind;

    /// Token type, e.g. `Bearer`.
    fn token_type(&self) -> &str;

    /// Opaque access token.
    fn access_token(&self) -> &str;

    /// Point in time (UTC) where the access token expires.
    fn expires(&self) -> DateTime<Utc>;

    /// Whether the access token has expired.
    fn has_expired(&self) -> bool {
        self.expires() <= Utc::now()
    }

    /// Serializes the token into its byte layout.
    fn to_byte_array(&self) -> AppResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Serializes the token into base64 of its byte layout.
    fn to_base64_string(&self) -> AppResult<String> {
        Ok(BASE64.encode(self.to_byte_array()?))
    }

    /// Restores a token from its byte layout.
    fn from_byte_array(byte_array: &[u8]) -> AppResult<Self> {
        if byte_array.is_empty() {
            return Err(AppError::missing_argument("byteArray"));
        }

        let token: Self = serde_json::from_slice(byte_array)?;
        if token.token_type().trim().is_empty() || token.access_token().trim().is_empty() {
            return Err(AppError::serialization(
                "Restored token is missing its token type or access token",
            ));
        }
        Ok(token)
    }

    /// Restores a token from base64 of its byte layout.
    fn from_base64_string(base64_string: &str) -> AppResult<Self> {
        if base64_string.trim().is_empty() {
            return Err(AppError::missing_argument("base64String"));
        }

        Self::from_byte_array(&BASE64.decode(base64_string.trim())?)
    }

    /// Wraps the token for kind-erased storage.
    fn into_stored(self) -> StoredToken;

    /// Unwraps a stored token when it has this type's kind.
    fn from_stored(stored: StoredToken) -> Option<Self>;
}

/// Behaviour of tokens that carry a refresh token.
pub trait RefreshableTokenValue: TokenValue {
    /// Opaque refresh token.
    fn refresh_token(&self) -> &str;

    /// Whether the access token expires within `within` from now. Used to
    /// decide whether a silent refresh is due.
    fn will_expire_within(&self, within: chrono::Duration) -> bool {
        self.expires() <= Utc::now() + within
    }
}

/// Read-only token fields exposed by commands and queries that carry a
/// token. Lets unrelated command/query types be converted into tokens.
pub trait TokenFields {
    /// Token type, e.g. `Bearer`.
    fn token_type(&self) -> &str;

    /// Opaque access token.
    fn access_token(&self) -> &str;

    /// Expiry of the access token.
    fn expires(&self) -> DateTime<Utc>;
}

/// [`TokenFields`] plus the refresh token.
pub trait RefreshableTokenFields: TokenFields {
    /// Opaque refresh token.
    fn refresh_token(&self) -> &str;
}
