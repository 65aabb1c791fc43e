//! Shared cookie lifecycle of every token helper.
//!
//! The base owns the state cookie (random state identifier -> return URL,
//! 15 minutes) and the token cookie (protected token, token expiry plus one
//! day). Provider specifics come from a [`TokenHelperStrategy`].

use async_trait::async_trait;
use axum::http::Method;
use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Duration, Utc};
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use intranet_core::error::AppError;
use intranet_core::result::AppResult;
use intranet_security::{StoredToken, TokenKind, TokenType, TokenValue};

use super::{FlowArguments, TokenHelper};
use crate::context::HttpContext;
use crate::flow::{FlowError, FlowResult, RedirectTarget};
use crate::protection::{
    DataProtectionProvider, DataProtector, STATE_PROTECTION_PURPOSE, TOKEN_PROTECTION_PURPOSE,
};
use crate::trusted_domain_helper::TrustedDomainHelper;

/// Prefix of every cookie written by the token helpers.
pub const COOKIE_PREFIX: &str = "Intranet";

/// Lifetime of a state cookie.
pub const STATE_COOKIE_LIFETIME_MINUTES: i64 = 15;

/// Slack added to the token expiry for the token cookie, tolerating clock
/// skew between the intranet and the provider.
pub const TOKEN_COOKIE_SLACK_DAYS: i64 = 1;

/// Longest accepted state identifier.
const MAX_STATE_IDENTIFIER_LENGTH: usize = 64;

/// Provider-specific hooks of a token helper.
#[async_trait]
pub trait TokenHelperStrategy: Send + Sync + 'static {
    /// Token value stored by the helper.
    type Token: TokenValue;

    /// Token type served by the helper.
    fn token_type(&self) -> TokenType;

    /// Extracts the state identifier from the callback arguments.
    fn state_identifier(&self, arguments: &FlowArguments) -> Option<String>;

    /// Provider URL the user agent is sent to for authorization.
    fn authorize_uri(&self, context: &HttpContext, state_identifier: &str) -> AppResult<Url>;

    /// Exchanges the callback arguments for a token; `None` when the
    /// provider produced no token.
    async fn acquire(
        &self,
        context: &HttpContext,
        state_identifier: &str,
        return_url: &Url,
        arguments: &FlowArguments,
    ) -> AppResult<Option<Self::Token>>;

    /// Renews `token`; `None` when it cannot be renewed.
    async fn refresh(
        &self,
        context: &HttpContext,
        token: Self::Token,
    ) -> AppResult<Option<Self::Token>>;

    /// Restores a token handed over as base64.
    fn deserialize(&self, base64_token: &str) -> AppResult<Self::Token> {
        Self::Token::from_base64_string(base64_token)
    }
}

/// Token helper implemented over a [`TokenHelperStrategy`].
#[derive(Debug)]
pub struct TokenHelperBase<S> {
    strategy: S,
    trusted_domain_helper: TrustedDomainHelper,
    token_protector: DataProtector,
    state_protector: DataProtector,
}

impl<S: TokenHelperStrategy> TokenHelperBase<S> {
    /// Creates the helper; cookies are protected with purpose-bound
    /// protectors from `data_protection`.
    pub fn new(
        strategy: S,
        trusted_domain_helper: TrustedDomainHelper,
        data_protection: &DataProtectionProvider,
    ) -> AppResult<Self> {
        Ok(Self {
            strategy,
            trusted_domain_helper,
            token_protector: data_protection.create_protector(TOKEN_PROTECTION_PURPOSE)?,
            state_protector: data_protection.create_protector(STATE_PROTECTION_PURPOSE)?,
        })
    }

    /// The provider hooks.
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Name of the token cookie.
    pub fn token_cookie_name(&self) -> String {
        format!("{COOKIE_PREFIX}.{}", self.strategy.token_type())
    }

    /// Name of the state cookie for one authorize flow.
    pub fn state_cookie_name(&self, state_identifier: &str) -> String {
        format!(
            "{COOKIE_PREFIX}.{}.State.{state_identifier}",
            self.strategy.token_type()
        )
    }

    /// Restores the token cookie, or `None` when absent or garbled.
    pub async fn get_token(&self, context: &HttpContext) -> Option<S::Token> {
        let value = context.cookie_value(&self.token_cookie_name()).await?;

        let restored = unprotect_from_base64(&self.token_protector, &value)
            .and_then(|bytes| S::Token::from_byte_array(&bytes));
        match restored {
            Ok(token) => Some(token),
            Err(e) => {
                debug!(
                    token_type = %self.strategy.token_type(),
                    error = %e,
                    "Ignoring unreadable token cookie"
                );
                None
            }
        }
    }

    async fn write_state_cookie(
        &self,
        context: &HttpContext,
        name: &str,
        return_url: &Url,
    ) -> AppResult<()> {
        let value = protect_to_base64(&self.state_protector, return_url.as_str().as_bytes())?;
        let expires =
            OffsetDateTime::now_utc() + time::Duration::minutes(STATE_COOKIE_LIFETIME_MINUTES);

        context
            .set_cookie(build_cookie(context, name.to_string(), value, expires))
            .await;
        Ok(())
    }

    async fn read_state_cookie(&self, context: &HttpContext, name: &str) -> Option<Url> {
        let value = context.cookie_value(name).await?;

        let restored = unprotect_from_base64(&self.state_protector, &value).and_then(|bytes| {
            let text = String::from_utf8(bytes)
                .map_err(|e| AppError::serialization(format!("State is not UTF-8: {e}")))?;
            Ok(Url::parse(&text)?)
        });
        match restored {
            Ok(url) => Some(url),
            Err(e) => {
                debug!(cookie = %name, error = %e, "Ignoring unreadable state cookie");
                None
            }
        }
    }

    async fn write_token_cookie(&self, context: &HttpContext, token: &S::Token) -> AppResult<()> {
        let value = protect_to_base64(&self.token_protector, &token.to_byte_array()?)?;
        let expires = cookie_expiry(token.expires());

        context
            .set_cookie(build_cookie(context, self.token_cookie_name(), value, expires))
            .await;
        Ok(())
    }

    async fn store_token_cookie(&self, context: &HttpContext, token: &S::Token) -> AppResult<()> {
        if let Err(e) = self.write_token_cookie(context, token).await {
            context.delete_cookie(&self.token_cookie_name()).await;
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl<S: TokenHelperStrategy> TokenHelper for TokenHelperBase<S> {
    fn token_type(&self) -> TokenType {
        self.strategy.token_type()
    }

    fn token_kind(&self) -> TokenKind {
        S::Token::KIND
    }

    async fn authorize(&self, context: &HttpContext, return_url: Option<&str>) -> FlowResult {
        let token_type = self.strategy.token_type();

        let Some(return_url) = self.trusted_domain_helper.try_create_trusted_uri(return_url) else {
            warn!(token_type = %token_type, "Authorize rejected: return URL missing or untrusted");
            return Err(FlowError::BadRequest(
                "Return URL must be an absolute URI on a trusted domain".to_string(),
            ));
        };

        if *context.method() != Method::GET {
            warn!(token_type = %token_type, method = %context.method(), "Authorize rejected: method");
            return Err(FlowError::BadRequest(
                "Authorization must be requested with GET".to_string(),
            ));
        }

        let state_identifier = Uuid::new_v4().simple().to_string();
        let state_cookie_name = self.state_cookie_name(&state_identifier);
        self.write_state_cookie(context, &state_cookie_name, &return_url)
            .await?;

        match self.strategy.authorize_uri(context, &state_identifier) {
            Ok(authorize_uri) => {
                info!(
                    token_type = %token_type,
                    state_id = %state_identifier,
                    "Redirecting to provider for authorization"
                );
                Ok(RedirectTarget::new(authorize_uri))
            }
            Err(e) => {
                warn!(token_type = %token_type, error = %e, "Removing state cookie after failure");
                context.delete_cookie(&state_cookie_name).await;
                Err(e.into())
            }
        }
    }

    async fn acquire_token(&self, context: &HttpContext, arguments: &FlowArguments) -> FlowResult {
        let token_type = self.strategy.token_type();

        let Some(state_identifier) = self
            .strategy
            .state_identifier(arguments)
            .filter(|id| is_valid_state_identifier(id))
        else {
            warn!(token_type = %token_type, "Callback rejected: state identifier missing");
            return Err(FlowError::BadRequest("Missing state identifier".to_string()));
        };

        let state_cookie_name = self.state_cookie_name(&state_identifier);
        let return_url = self.read_state_cookie(context, &state_cookie_name).await;
        context.delete_cookie(&state_cookie_name).await;

        let Some(return_url) = return_url else {
            warn!(
                token_type = %token_type,
                state_id = %state_identifier,
                "Callback rejected: state cookie missing or unreadable"
            );
            return Err(FlowError::BadRequest("Unknown or expired state".to_string()));
        };

        let token = self
            .strategy
            .acquire(context, &state_identifier, &return_url, arguments)
            .await?;
        let Some(token) = token else {
            warn!(
                token_type = %token_type,
                state_id = %state_identifier,
                "Token acquisition produced no token"
            );
            return Err(FlowError::Unauthorized("No token was acquired".to_string()));
        };

        self.store_token_cookie(context, &token).await?;

        info!(token_type = %token_type, expires = %token.expires(), "Token acquired");
        Ok(RedirectTarget::new(return_url))
    }

    async fn refresh_token(&self, context: &HttpContext, return_url: Option<&str>) -> FlowResult {
        let token_type = self.strategy.token_type();

        let Some(return_url) = self.trusted_domain_helper.try_create_trusted_uri(return_url) else {
            warn!(token_type = %token_type, "Refresh rejected: return URL missing or untrusted");
            return Err(FlowError::BadRequest(
                "Return URL must be an absolute URI on a trusted domain".to_string(),
            ));
        };

        let Some(token) = self.get_token(context).await else {
            warn!(token_type = %token_type, "Refresh rejected: no stored token");
            return Err(FlowError::BadRequest("No token to refresh".to_string()));
        };

        let Some(refreshed) = self.strategy.refresh(context, token).await? else {
            warn!(token_type = %token_type, "Token refresh produced no token");
            return Err(FlowError::Unauthorized("Token could not be refreshed".to_string()));
        };

        self.store_token_cookie(context, &refreshed).await?;

        info!(token_type = %token_type, expires = %refreshed.expires(), "Token refreshed");
        Ok(RedirectTarget::new(return_url))
    }

    async fn store_token(&self, context: &HttpContext, base64_token: &str) -> AppResult<()> {
        match self.strategy.deserialize(base64_token) {
            Ok(token) => self.store_token_cookie(context, &token).await,
            Err(e) => {
                debug!(
                    token_type = %self.strategy.token_type(),
                    error = %e,
                    "Ignoring token that could not be restored"
                );
                Ok(())
            }
        }
    }

    async fn get_stored_token(&self, context: &HttpContext) -> Option<StoredToken> {
        self.get_token(context).await.map(|token| token.into_stored())
    }

    async fn handle_logout(&self, context: &HttpContext) {
        debug!(token_type = %self.strategy.token_type(), "Deleting token cookie");
        context.delete_cookie(&self.token_cookie_name()).await;
    }
}

fn is_valid_state_identifier(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_STATE_IDENTIFIER_LENGTH
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn protect_to_base64(protector: &DataProtector, bytes: &[u8]) -> AppResult<String> {
    Ok(BASE64.encode(protector.protect(bytes)?))
}

fn unprotect_from_base64(protector: &DataProtector, value: &str) -> AppResult<Vec<u8>> {
    protector.unprotect(&BASE64.decode(value)?)
}

/// Token expiry plus the slack, clamped to the latest instant a cookie can
/// carry.
fn cookie_expiry(token_expires: DateTime<Utc>) -> OffsetDateTime {
    token_expires
        .checked_add_signed(Duration::days(TOKEN_COOKIE_SLACK_DAYS))
        .and_then(|value| OffsetDateTime::from_unix_timestamp(value.timestamp()).ok())
        .unwrap_or(PrimitiveDateTime::MAX.assume_utc())
}

fn build_cookie(
    context: &HttpContext,
    name: String,
    value: String,
    expires: OffsetDateTime,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .domain(context.domain().to_string())
        .path("/")
        .secure(context.is_secure())
        .http_only(true)
        .same_site(SameSite::None)
        .expires(expires)
        .build()
}
