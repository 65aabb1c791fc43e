//! Fluent creators enforcing that every required token field is set
//! before a token is built.

use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, TimeZone, Utc};

use intranet_core::error::AppError;
use intranet_core::result::AppResult;

use super::{RefreshableToken, Token, TokenValue};

/// Token types a [`TokenCreator`] can build.
pub trait CreatableToken: TokenValue {
    /// Name of the creator building this token type, used in error messages.
    const CREATOR_NAME: &'static str;

    /// Whether the token type carries a refresh token.
    const SUPPORTS_REFRESH_TOKEN: bool;

    /// Assembles the token from validated parts. `refresh_token` is `Some`
    /// exactly when [`Self::SUPPORTS_REFRESH_TOKEN`] is `true`.
    #[doc(hidden)]
    fn assemble(
        token_type: String,
        access_token: String,
        refresh_token: Option<String>,
        expires: DateTime<Utc>,
    ) -> Self;
}

impl CreatableToken for Token {
    const CREATOR_NAME: &'static str = "TokenCreator";
    const SUPPORTS_REFRESH_TOKEN: bool = false;

    fn assemble(
        token_type: String,
        access_token: String,
        _refresh_token: Option<String>,
        expires: DateTime<Utc>,
    ) -> Self {
        Token::new(token_type, access_token, expires)
    }
}

impl CreatableToken for RefreshableToken {
    const CREATOR_NAME: &'static str = "RefreshableTokenCreator";
    const SUPPORTS_REFRESH_TOKEN: bool = true;

    fn assemble(
        token_type: String,
        access_token: String,
        refresh_token: Option<String>,
        expires: DateTime<Utc>,
    ) -> Self {
        RefreshableToken::new(
            token_type,
            access_token,
            refresh_token.unwrap_or_default(),
            expires,
        )
    }
}

/// Fluent creator for tokens of type `T`.
///
/// Each setter validates its argument and hands the creator back; `build`
/// fails when a required setter was never called.
pub struct TokenCreator<T: CreatableToken> {
    token_type: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires: Option<DateTime<Utc>>,
    _token: PhantomData<fn() -> T>,
}

/// Creator for [`RefreshableToken`].
pub type RefreshableTokenCreator = TokenCreator<RefreshableToken>;

impl<T: CreatableToken> fmt::Debug for TokenCreator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(T::CREATOR_NAME)
            .field("token_type", &self.token_type)
            .field("has_access_token", &self.access_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires", &self.expires)
            .finish()
    }
}

impl<T: CreatableToken> Default for TokenCreator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: CreatableToken> TokenCreator<T> {
    /// Creates an empty creator.
    pub fn new() -> Self {
        Self {
            token_type: None,
            access_token: None,
            refresh_token: None,
            expires: None,
            _token: PhantomData,
        }
    }

    /// Sets the token type, e.g. `Bearer`.
    pub fn with_token_type(mut self, token_type: &str) -> AppResult<Self> {
        self.token_type = Some(required(token_type, "tokenType")?);
        Ok(self)
    }

    /// Sets the access token.
    pub fn with_access_token(mut self, access_token: &str) -> AppResult<Self> {
        self.access_token = Some(required(access_token, "accessToken")?);
        Ok(self)
    }

    /// Sets the refresh token. Fails with a not-supported error for token
    /// types without refresh capability, whatever the argument.
    pub fn with_refresh_token(mut self, refresh_token: &str) -> AppResult<Self> {
        if !T::SUPPORTS_REFRESH_TOKEN {
            return Err(AppError::not_supported(format!(
                "A refresh token is not supported by '{}'",
                T::CREATOR_NAME
            )));
        }

        self.refresh_token = Some(required(refresh_token, "refreshToken")?);
        Ok(self)
    }

    /// Sets the expiry; the instant is normalized to UTC.
    pub fn with_expires<Tz: TimeZone>(mut self, expires: DateTime<Tz>) -> Self {
        self.expires = Some(expires.with_timezone(&Utc));
        self
    }

    /// Builds the token.
    pub fn build(self) -> AppResult<T> {
        let token_type = self
            .token_type
            .ok_or_else(|| AppError::value_not_set("with_token_type", T::CREATOR_NAME))?;
        let access_token = self
            .access_token
            .ok_or_else(|| AppError::value_not_set("with_access_token", T::CREATOR_NAME))?;
        let refresh_token = if T::SUPPORTS_REFRESH_TOKEN {
            Some(
                self.refresh_token
                    .ok_or_else(|| AppError::value_not_set("with_refresh_token", T::CREATOR_NAME))?,
            )
        } else {
            None
        };
        let expires = self
            .expires
            .ok_or_else(|| AppError::value_not_set("with_expires", T::CREATOR_NAME))?;

        Ok(T::assemble(token_type, access_token, refresh_token, expires))
    }
}

fn required(value: &str, parameter: &str) -> AppResult<String> {
    if value.trim().is_empty() {
        return Err(AppError::missing_argument(parameter));
    }
    Ok(value.to_string())
}
