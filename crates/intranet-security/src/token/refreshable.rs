//! Access token carrying a refresh token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use intranet_core::error::AppError;
use intranet_core::result::AppResult;

use super::creator::TokenCreator;
use super::{RefreshableTokenFields, RefreshableTokenValue, StoredToken, TokenKind, TokenValue};

/// Immutable access token with a refresh token for silent renewal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshableToken {
    token_type: String,
    access_token: String,
    refresh_token: String,
    expires: DateTime<Utc>,
}

impl RefreshableToken {
    pub(crate) fn new(
        token_type: String,
        access_token: String,
        refresh_token: String,
        expires: DateTime<Utc>,
    ) -> Self {
        Self {
            token_type,
            access_token,
            refresh_token,
            expires,
        }
    }

    /// Starts a fluent creator for a refreshable token.
    pub fn create() -> TokenCreator<RefreshableToken> {
        TokenCreator::new()
    }

    /// Builds a refreshable token from any command or query exposing
    /// refreshable token fields.
    pub fn from_refreshable_token_fields<F: RefreshableTokenFields + ?Sized>(
        fields: &F,
    ) -> AppResult<Self> {
        Self::create()
            .with_token_type(fields.token_type())?
            .with_access_token(fields.access_token())?
            .with_refresh_token(fields.refresh_token())?
            .with_expires(fields.expires())
            .build()
    }
}

impl TokenValue for RefreshableToken {
    const KIND: TokenKind = TokenKind::Refreshable;

    fn token_type(&self) -> &str {
        &self.token_type
    }

    fn access_token(&self) -> &str {
        &self.access_token
    }

    fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    fn from_byte_array(byte_array: &[u8]) -> AppResult<Self> {
        if byte_array.is_empty() {
            return Err(AppError::missing_argument("byteArray"));
        }

        let token: Self = serde_json::from_slice(byte_array)?;
        if token.token_type.trim().is_empty()
            || token.access_token.trim().is_empty()
            || token.refresh_token.trim().is_empty()
        {
            return Err(AppError::serialization(
                "Restored token is missing its token type, access token or refresh token",
            ));
        }
        Ok(token)
    }

    fn into_stored(self) -> StoredToken {
        StoredToken::Refreshable(self)
    }

    fn from_stored(stored: StoredToken) -> Option<Self> {
        match stored {
            StoredToken::Refreshable(token) => Some(token),
            StoredToken::Access(_) => None,
        }
    }
}

impl RefreshableTokenValue for RefreshableToken {
    fn refresh_token(&self) -> &str {
        &self.refresh_token
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use intranet_core::error::ErrorKind;

    use super::*;
    use crate::token::{Token, TokenFields};

    struct RefreshCommand {
        refresh_token: String,
        expires: DateTime<Utc>,
    }

    impl TokenFields for RefreshCommand {
        fn token_type(&self) -> &str {
            "Bearer"
        }

        fn access_token(&self) -> &str {
            "access"
        }

        fn expires(&self) -> DateTime<Utc> {
            self.expires
        }
    }

    impl RefreshableTokenFields for RefreshCommand {
        fn refresh_token(&self) -> &str {
            &self.refresh_token
        }
    }

    fn sample(expires: DateTime<Utc>) -> RefreshableToken {
        RefreshableToken::create()
            .with_token_type("Bearer")
            .unwrap()
            .with_access_token("access")
            .unwrap()
            .with_refresh_token("refresh")
            .unwrap()
            .with_expires(expires)
            .build()
            .unwrap()
    }

    #[test]
    fn test_roundtrip_keeps_refresh_token() {
        let token = sample(Utc::now() + Duration::hours(1));
        let restored =
            RefreshableToken::from_base64_string(&token.to_base64_string().unwrap()).unwrap();
        assert_eq!(restored, token);
        assert_eq!(restored.refresh_token(), "refresh");
    }

    #[test]
    fn test_will_expire_within() {
        let token = sample(Utc::now() + Duration::minutes(3));
        assert!(token.will_expire_within(Duration::minutes(5)));
        assert!(!token.will_expire_within(Duration::minutes(1)));
    }

    #[test]
    fn test_plain_token_bytes_are_not_refreshable() {
        let plain = Token::create()
            .with_token_type("Bearer")
            .unwrap()
            .with_access_token("access")
            .unwrap()
            .with_expires(Utc::now())
            .build()
            .unwrap();

        let result = RefreshableToken::from_byte_array(&plain.to_byte_array().unwrap());
        assert_eq!(result.unwrap_err().kind, ErrorKind::Serialization);
    }

    #[test]
    fn test_from_refreshable_token_fields() {
        let command = RefreshCommand {
            refresh_token: "r-1".to_string(),
            expires: Utc::now() + Duration::hours(1),
        };

        let token = RefreshableToken::from_refreshable_token_fields(&command).unwrap();
        assert_eq!(token.refresh_token(), "r-1");
        assert_eq!(token.expires(), command.expires);
    }

    #[test]
    fn test_from_refreshable_token_fields_rejects_blank_refresh_token() {
        let command = RefreshCommand {
            refresh_token: "  ".to_string(),
            expires: Utc::now(),
        };

        let err = RefreshableToken::from_refreshable_token_fields(&command).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingArgument);
        assert!(err.message.contains("refreshToken"));
    }

    #[test]
    fn test_from_stored_rejects_other_kind() {
        let token = sample(Utc::now());
        let stored = token.into_stored();
        assert!(Token::from_stored(stored).is_none());
    }
}
