//! OAuth2 authorization-code strategy shared by every configured provider.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use intranet_core::config::ProviderConfig;
use intranet_core::result::AppResult;
use intranet_core::traits::CommandBus;
use intranet_security::{AcquireTokenCommand, RefreshTokenCommand, RefreshableToken, Token, TokenType, TokenValue};

use super::FlowArguments;
use super::base::TokenHelperStrategy;
use crate::context::HttpContext;

/// How a token type is renewed through command bus `B`.
#[async_trait]
pub trait RefreshPolicy<B>: TokenValue {
    /// Renews `token`; `None` when the token type cannot be renewed or the
    /// provider refused.
    async fn refresh_with(command_bus: &B, token_type: TokenType, token: Self) -> AppResult<Option<Self>>;
}

#[async_trait]
impl<B: Send + Sync> RefreshPolicy<B> for Token {
    async fn refresh_with(_command_bus: &B, token_type: TokenType, _token: Self) -> AppResult<Option<Self>> {
        debug!(token_type = %token_type, "Access-only tokens cannot be refreshed");
        Ok(None)
    }
}

#[async_trait]
impl<B: CommandBus<RefreshTokenCommand>> RefreshPolicy<B> for RefreshableToken {
    async fn refresh_with(command_bus: &B, token_type: TokenType, token: Self) -> AppResult<Option<Self>> {
        command_bus
            .publish(RefreshTokenCommand::new(token_type, token))
            .await
    }
}

/// Authorization-code flow against one provider.
///
/// Sends the user agent to the provider's authorize endpoint and, on the
/// callback, publishes an [`AcquireTokenCommand`] for the returned code.
pub struct AuthorizationCodeStrategy<T, B> {
    token_type: TokenType,
    provider: ProviderConfig,
    command_bus: Arc<B>,
    _token: PhantomData<fn() -> T>,
}

impl<T, B> fmt::Debug for AuthorizationCodeStrategy<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationCodeStrategy")
            .field("token_type", &self.token_type)
            .field("client_id", &self.provider.client_id)
            .field("authorize_endpoint", &self.provider.authorize_endpoint)
            .finish_non_exhaustive()
    }
}

impl<T, B> AuthorizationCodeStrategy<T, B> {
    /// Creates the strategy for `token_type` against `provider`.
    pub fn new(token_type: TokenType, provider: ProviderConfig, command_bus: Arc<B>) -> Self {
        Self {
            token_type,
            provider,
            command_bus,
            _token: PhantomData,
        }
    }

    /// Callback URI registered with the provider for this token type.
    pub fn callback_uri(&self, context: &HttpContext) -> AppResult<Url> {
        let path = format!("account/{}/callback", self.token_type.slug());
        Ok(context.base_url()?.join(&path)?)
    }
}

#[async_trait]
impl<T, B> TokenHelperStrategy for AuthorizationCodeStrategy<T, B>
where
    T: RefreshPolicy<B>,
    B: CommandBus<AcquireTokenCommand<T>> + 'static,
{
    type Token = T;

    fn token_type(&self) -> TokenType {
        self.token_type
    }

    fn state_identifier(&self, arguments: &FlowArguments) -> Option<String> {
        arguments
            .get("state")
            .map(|state| state.trim().to_string())
            .filter(|state| !state.is_empty())
    }

    fn authorize_uri(&self, context: &HttpContext, state_identifier: &str) -> AppResult<Url> {
        let mut uri = Url::parse(&self.provider.authorize_endpoint)?;
        let redirect_uri = self.callback_uri(context)?;

        {
            let mut query = uri.query_pairs_mut();
            query
                .append_pair("client_id", &self.provider.client_id)
                .append_pair("response_type", "code")
                .append_pair("redirect_uri", redirect_uri.as_str())
                .append_pair("scope", &self.provider.scopes.join(" "))
                .append_pair("state", state_identifier);
            for (name, value) in &self.provider.extra_authorize_parameters {
                query.append_pair(name, value);
            }
        }

        Ok(uri)
    }

    async fn acquire(
        &self,
        context: &HttpContext,
        state_identifier: &str,
        _return_url: &Url,
        arguments: &FlowArguments,
    ) -> AppResult<Option<T>> {
        if let Some(error) = arguments.get("error") {
            warn!(
                token_type = %self.token_type,
                state_id = %state_identifier,
                error = %error,
                "Provider declined the authorization"
            );
            return Ok(None);
        }

        let Some(code) = arguments.get("code").filter(|code| !code.trim().is_empty()) else {
            return Ok(None);
        };

        let command = AcquireTokenCommand::<T>::new(self.token_type, code.as_str(), self.callback_uri(context)?);
        self.command_bus.publish(command).await
    }

    async fn refresh(&self, _context: &HttpContext, token: T) -> AppResult<Option<T>> {
        T::refresh_with(self.command_bus.as_ref(), self.token_type, token).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use axum::http::Method;
    use axum_extra::extract::CookieJar;
    use chrono::{Duration, Utc};

    use intranet_security::RefreshableTokenValue;

    use super::*;

    #[derive(Default)]
    struct RecordingBus {
        acquired: Mutex<Vec<(String, String)>>,
        refreshed: Mutex<Vec<String>>,
    }

    fn refreshable(refresh_token: &str) -> RefreshableToken {
        RefreshableToken::create()
            .with_token_type("Bearer")
            .unwrap()
            .with_access_token("access")
            .unwrap()
            .with_refresh_token(refresh_token)
            .unwrap()
            .with_expires(Utc::now() + Duration::hours(1))
            .build()
            .unwrap()
    }

    #[async_trait]
    impl CommandBus<AcquireTokenCommand<RefreshableToken>> for RecordingBus {
        async fn publish(
            &self,
            command: AcquireTokenCommand<RefreshableToken>,
        ) -> AppResult<Option<RefreshableToken>> {
            self.acquired.lock().unwrap().push((
                command.authorization_code.clone(),
                command.redirect_uri.to_string(),
            ));
            Ok(Some(refreshable("r1")))
        }
    }

    #[async_trait]
    impl CommandBus<AcquireTokenCommand<Token>> for RecordingBus {
        async fn publish(&self, _command: AcquireTokenCommand<Token>) -> AppResult<Option<Token>> {
            Ok(None)
        }
    }

    #[async_trait]
    impl CommandBus<RefreshTokenCommand> for RecordingBus {
        async fn publish(&self, command: RefreshTokenCommand) -> AppResult<Option<RefreshableToken>> {
            self.refreshed
                .lock()
                .unwrap()
                .push(command.token().refresh_token().to_string());
            Ok(Some(refreshable("r2")))
        }
    }

    fn provider() -> ProviderConfig {
        ProviderConfig {
            client_id: "intranet-client".to_string(),
            client_secret: "secret".to_string(),
            authorize_endpoint: "https://login.example.com/oauth2/authorize".to_string(),
            token_endpoint: "https://login.example.com/oauth2/token".to_string(),
            scopes: vec!["openid".to_string(), "offline_access".to_string()],
            extra_authorize_parameters: BTreeMap::from([(
                "prompt".to_string(),
                "select_account".to_string(),
            )]),
        }
    }

    fn context() -> HttpContext {
        HttpContext::new(Method::GET, "https", "intranet.local", CookieJar::default())
    }

    #[test]
    fn test_authorize_uri_carries_flow_parameters() {
        let strategy: AuthorizationCodeStrategy<RefreshableToken, RecordingBus> =
            AuthorizationCodeStrategy::new(
                TokenType::MicrosoftGraphToken,
                provider(),
                Arc::new(RecordingBus::default()),
            );

        let uri = strategy.authorize_uri(&context(), "s-1").unwrap();
        let query: BTreeMap<String, String> = uri.query_pairs().into_owned().collect();

        assert_eq!(uri.path(), "/oauth2/authorize");
        assert_eq!(query["client_id"], "intranet-client");
        assert_eq!(query["response_type"], "code");
        assert_eq!(
            query["redirect_uri"],
            "https://intranet.local/account/microsoft-graph/callback"
        );
        assert_eq!(query["scope"], "openid offline_access");
        assert_eq!(query["state"], "s-1");
        assert_eq!(query["prompt"], "select_account");
    }

    #[tokio::test]
    async fn test_acquire_publishes_code_with_callback_uri() {
        let bus = Arc::new(RecordingBus::default());
        let strategy: AuthorizationCodeStrategy<RefreshableToken, RecordingBus> =
            AuthorizationCodeStrategy::new(TokenType::MicrosoftGraphToken, provider(), bus.clone());
        let arguments = FlowArguments::from([
            ("state".to_string(), "s-1".to_string()),
            ("code".to_string(), "c-1".to_string()),
        ]);
        let return_url = Url::parse("https://intranet.local/home").unwrap();

        let token = strategy
            .acquire(&context(), "s-1", &return_url, &arguments)
            .await
            .unwrap();

        assert!(token.is_some());
        assert_eq!(
            bus.acquired.lock().unwrap().as_slice(),
            [(
                "c-1".to_string(),
                "https://intranet.local/account/microsoft-graph/callback".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_acquire_without_code_or_with_error_publishes_nothing() {
        let bus = Arc::new(RecordingBus::default());
        let strategy: AuthorizationCodeStrategy<RefreshableToken, RecordingBus> =
            AuthorizationCodeStrategy::new(TokenType::GoogleApisToken, provider(), bus.clone());
        let return_url = Url::parse("https://intranet.local/home").unwrap();

        let declined = FlowArguments::from([
            ("state".to_string(), "s-1".to_string()),
            ("error".to_string(), "access_denied".to_string()),
            ("code".to_string(), "c-1".to_string()),
        ]);
        let missing = FlowArguments::from([("state".to_string(), "s-1".to_string())]);

        for arguments in [declined, missing] {
            let token = strategy
                .acquire(&context(), "s-1", &return_url, &arguments)
                .await
                .unwrap();
            assert!(token.is_none());
        }
        assert!(bus.acquired.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_depends_on_token_kind() {
        let bus = Arc::new(RecordingBus::default());

        let refreshable_strategy: AuthorizationCodeStrategy<RefreshableToken, RecordingBus> =
            AuthorizationCodeStrategy::new(TokenType::MicrosoftGraphToken, provider(), bus.clone());
        let renewed = refreshable_strategy
            .refresh(&context(), refreshable("r1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renewed.refresh_token(), "r2");
        assert_eq!(bus.refreshed.lock().unwrap().as_slice(), ["r1".to_string()]);

        let access_strategy: AuthorizationCodeStrategy<Token, RecordingBus> =
            AuthorizationCodeStrategy::new(TokenType::IntranetApiToken, provider(), bus.clone());
        let access = Token::create()
            .with_token_type("Bearer")
            .unwrap()
            .with_access_token("a")
            .unwrap()
            .with_expires(Utc::now())
            .build()
            .unwrap();
        assert!(access_strategy.refresh(&context(), access).await.unwrap().is_none());
    }

    #[test]
    fn test_state_identifier_ignores_blank() {
        let strategy: AuthorizationCodeStrategy<Token, RecordingBus> = AuthorizationCodeStrategy::new(
            TokenType::IntranetApiToken,
            provider(),
            Arc::new(RecordingBus::default()),
        );

        let blank = FlowArguments::from([("state".to_string(), " ".to_string())]);
        assert!(strategy.state_identifier(&blank).is_none());
        assert!(strategy.state_identifier(&FlowArguments::new()).is_none());
    }
}
