//! Command bus exchanging authorization codes and refresh tokens at the
//! providers' OAuth2 token endpoints.

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};

use intranet_core::config::{ProviderConfig, ProvidersConfig};
use intranet_core::error::{AppError, ErrorKind};
use intranet_core::result::AppResult;
use intranet_core::traits::CommandBus;
use intranet_security::token::{CreatableToken, TokenCreator};
use intranet_security::{
    AcquireTokenCommand, RefreshTokenCommand, RefreshableToken, RefreshableTokenFields, TokenType,
};

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECONDS: i64 = 3600;

/// Timeout of one token endpoint request.
const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Successful token endpoint response.
#[derive(Debug, Clone, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    token_type: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TokenEndpointResponse {
    /// Builds a token; refreshable tokens fall back to
    /// `fallback_refresh_token` when the provider did not rotate it.
    fn into_token<T: CreatableToken>(self, fallback_refresh_token: Option<&str>) -> AppResult<T> {
        let lifetime = self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECONDS);
        let expires = Duration::try_seconds(lifetime)
            .and_then(|d| Utc::now().checked_add_signed(d))
            .ok_or_else(|| {
                AppError::external_service(format!(
                    "Token endpoint returned an out-of-range expires_in: {lifetime}"
                ))
            })?;
        let creator = TokenCreator::<T>::new()
            .with_token_type(&self.token_type)?
            .with_access_token(&self.access_token)?
            .with_expires(expires);

        let creator = if T::SUPPORTS_REFRESH_TOKEN {
            let refresh_token = self
                .refresh_token
                .as_deref()
                .or(fallback_refresh_token)
                .ok_or_else(|| AppError::external_service("Token endpoint returned no refresh token"))?;
            creator.with_refresh_token(refresh_token)?
        } else {
            creator
        };

        creator.build()
    }
}

/// Providers from configuration, keyed by the token type they issue.
pub fn configured_providers(config: &ProvidersConfig) -> HashMap<TokenType, ProviderConfig> {
    [
        (TokenType::MicrosoftGraphToken, &config.microsoft_graph),
        (TokenType::GoogleApisToken, &config.google_apis),
        (TokenType::IntranetApiToken, &config.intranet_api),
    ]
    .into_iter()
    .filter_map(|(token_type, provider)| provider.clone().map(|p| (token_type, p)))
    .collect()
}

/// HTTP client for the token endpoints of every configured provider.
#[derive(Debug, Clone)]
pub struct TokenEndpointClient {
    http_client: reqwest::Client,
    providers: HashMap<TokenType, ProviderConfig>,
}

impl TokenEndpointClient {
    /// Creates the client for `providers`.
    pub fn new(providers: HashMap<TokenType, ProviderConfig>) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to create HTTP client", e)
            })?;

        Ok(Self {
            http_client,
            providers,
        })
    }

    /// Creates the client from the providers configuration section.
    pub fn from_config(config: &ProvidersConfig) -> AppResult<Self> {
        Self::new(configured_providers(config))
    }

    fn provider(&self, token_type: TokenType) -> AppResult<&ProviderConfig> {
        self.providers.get(&token_type).ok_or_else(|| {
            AppError::configuration(format!("No provider configured for '{token_type}'"))
        })
    }

    /// Posts a form grant; `None` when the provider refused the grant.
    async fn request_token(
        &self,
        token_type: TokenType,
        token_endpoint: &str,
        params: &[(&str, &str)],
    ) -> AppResult<Option<TokenEndpointResponse>> {
        debug!(token_type = %token_type, endpoint = %token_endpoint, "Calling token endpoint");

        let response = self
            .http_client
            .post(token_endpoint)
            .form(params)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalService,
                    format!("Token endpoint for '{token_type}' is unreachable"),
                    e,
                )
            })?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            warn!(
                token_type = %token_type,
                status = %status.as_u16(),
                body = %body,
                "Token endpoint refused the grant"
            );
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AppError::external_service(format!(
                "Token endpoint for '{token_type}' answered {status}"
            )));
        }

        let body = response.json::<TokenEndpointResponse>().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                format!("Token endpoint for '{token_type}' returned an unreadable response"),
                e,
            )
        })?;
        Ok(Some(body))
    }
}

#[async_trait]
impl<T: CreatableToken> CommandBus<AcquireTokenCommand<T>> for TokenEndpointClient {
    async fn publish(&self, command: AcquireTokenCommand<T>) -> AppResult<Option<T>> {
        let provider = self.provider(command.token_type)?;
        let redirect_uri = command.redirect_uri.to_string();
        let params = [
            ("grant_type", "authorization_code"),
            ("code", command.authorization_code.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("client_id", provider.client_id.as_str()),
            ("client_secret", provider.client_secret.as_str()),
        ];

        let Some(response) = self
            .request_token(command.token_type, &provider.token_endpoint, &params)
            .await?
        else {
            return Ok(None);
        };

        let token = response.into_token::<T>(None)?;
        info!(token_type = %command.token_type, "Authorization code exchanged");
        Ok(Some(token))
    }
}

#[async_trait]
impl CommandBus<RefreshTokenCommand> for TokenEndpointClient {
    async fn publish(&self, command: RefreshTokenCommand) -> AppResult<Option<RefreshableToken>> {
        let provider = self.provider(command.token_type)?;
        let scope = provider.scopes.join(" ");
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", command.refresh_token()),
            ("client_id", provider.client_id.as_str()),
            ("client_secret", provider.client_secret.as_str()),
            ("scope", scope.as_str()),
        ];

        let Some(response) = self
            .request_token(command.token_type, &provider.token_endpoint, &params)
            .await?
        else {
            return Ok(None);
        };

        let token = response.into_token::<RefreshableToken>(Some(command.refresh_token()))?;
        info!(token_type = %command.token_type, "Refresh token redeemed");
        Ok(Some(token))
    }
}
