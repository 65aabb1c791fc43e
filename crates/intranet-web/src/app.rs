//! Application builder: wires configuration, data protection, the token
//! endpoint bus and the token helpers into an [`AppState`].

use std::sync::Arc;

use chrono::Duration;
use tracing::info;

use intranet_core::config::{AppConfig, ProviderConfig, ProvidersConfig, SecurityConfig};
use intranet_core::error::AppError;
use intranet_core::result::AppResult;
use intranet_core::traits::CommandBus;
use intranet_security::{
    AcquireTokenCommand, DefaultAuthorizationStateFactory, GenerateAuthorizationCodeCommandHandler,
    RefreshTokenCommand, RefreshableToken, ScopeCatalog, SecurityRepository, SupportedScopesProvider,
    Token, TokenKind, TokenType, TrustedDomainCollection,
};

use crate::bus::{TokenEndpointClient, configured_providers};
use crate::protection::DataProtectionProvider;
use crate::state::AppState;
use crate::token_helper::{
    AuthorizationCodeStrategy, RefreshPolicy, TokenHelper, TokenHelperBase, TokenHelperFactory,
};
use crate::trusted_domain_helper::TrustedDomainHelper;

/// Builds the state served by the router, exchanging tokens over HTTP.
pub fn build_state(config: AppConfig) -> AppResult<AppState> {
    let command_bus = Arc::new(TokenEndpointClient::from_config(&config.security.providers)?);
    build_state_with_bus(config, command_bus)
}

/// Builds the state served by the router over `command_bus`.
pub fn build_state_with_bus<B>(config: AppConfig, command_bus: Arc<B>) -> AppResult<AppState>
where
    B: CommandBus<AcquireTokenCommand<Token>>
        + CommandBus<AcquireTokenCommand<RefreshableToken>>
        + CommandBus<RefreshTokenCommand>
        + 'static,
{
    let data_protection =
        DataProtectionProvider::from_base64_key(&config.security.data_protection_key)?;
    let trusted_domain_helper = TrustedDomainHelper::new(Arc::new(TrustedDomainCollection::new(
        &config.security.trusted_domains,
    )));

    let token_helpers = build_token_helpers(
        &config.security.providers,
        command_bus,
        &trusted_domain_helper,
        &data_protection,
    )?;
    let supported_scopes = ScopeCatalog::from_config(&config.security.supported_scopes);
    info!(
        count = supported_scopes.supported_scopes().len(),
        "Supported scopes loaded"
    );

    Ok(AppState::new(config, token_helpers, supported_scopes))
}

/// Builds the authorization-code handler of the authorization server over
/// the host's `security_repository`.
pub fn build_authorization_code_handler(
    security: &SecurityConfig,
    supported_scopes: Arc<ScopeCatalog>,
    security_repository: Arc<dyn SecurityRepository>,
) -> AppResult<GenerateAuthorizationCodeCommandHandler> {
    let lifetime = i64::try_from(security.authorization_code_lifetime_seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| {
            AppError::configuration(format!(
                "Authorization code lifetime out of range: {}s",
                security.authorization_code_lifetime_seconds
            ))
        })?;

    Ok(GenerateAuthorizationCodeCommandHandler::new(
        Arc::new(DefaultAuthorizationStateFactory),
        security_repository,
        Arc::new(TrustedDomainCollection::new(&security.trusted_domains)),
        supported_scopes,
        lifetime,
    ))
}

/// One authorization-code helper per configured provider.
pub fn build_token_helpers<B>(
    providers: &ProvidersConfig,
    command_bus: Arc<B>,
    trusted_domain_helper: &TrustedDomainHelper,
    data_protection: &DataProtectionProvider,
) -> AppResult<TokenHelperFactory>
where
    B: CommandBus<AcquireTokenCommand<Token>>
        + CommandBus<AcquireTokenCommand<RefreshableToken>>
        + CommandBus<RefreshTokenCommand>
        + 'static,
{
    let mut helpers = Vec::new();
    for (token_type, provider) in configured_providers(providers) {
        let helper = match token_type.token_kind() {
            TokenKind::Refreshable => authorization_code_helper::<RefreshableToken, B>(
                token_type,
                provider,
                &command_bus,
                trusted_domain_helper,
                data_protection,
            )?,
            TokenKind::Access => authorization_code_helper::<Token, B>(
                token_type,
                provider,
                &command_bus,
                trusted_domain_helper,
                data_protection,
            )?,
        };
        info!(token_type = %token_type, "Token helper registered");
        helpers.push(helper);
    }

    Ok(TokenHelperFactory::new(helpers))
}

fn authorization_code_helper<T, B>(
    token_type: TokenType,
    provider: ProviderConfig,
    command_bus: &Arc<B>,
    trusted_domain_helper: &TrustedDomainHelper,
    data_protection: &DataProtectionProvider,
) -> AppResult<Arc<dyn TokenHelper>>
where
    T: RefreshPolicy<B>,
    B: CommandBus<AcquireTokenCommand<T>> + 'static,
{
    let strategy = AuthorizationCodeStrategy::<T, B>::new(token_type, provider, Arc::clone(command_bus));
    let helper = TokenHelperBase::new(strategy, trusted_domain_helper.clone(), data_protection)?;
    Ok(Arc::new(helper))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use intranet_core::error::ErrorKind;
    use intranet_security::{AuthorizationState, Claim, ClientSecretIdentity};

    use super::*;

    const CONFIG: &str = r#"
[security]
data_protection_key = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="
trusted_domains = ["intranet.local"]
authorization_code_lifetime_seconds = 120

[[security.supported_scopes]]
name = "openid"
related_claims = ["sub"]

[[security.supported_scopes]]
name = "webapi"
"#;

    struct EmptyRepository;

    #[async_trait]
    impl SecurityRepository for EmptyRepository {
        async fn get_client_secret_identity(
            &self,
            _client_id: &str,
        ) -> AppResult<Option<ClientSecretIdentity>> {
            Ok(None)
        }

        async fn store_authorization_code(
            &self,
            _authorization_state: &AuthorizationState,
            _claims: &[Claim],
        ) -> AppResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_state_carries_configured_scopes() {
        let config = AppConfig::from_toml(CONFIG).unwrap();
        let state = build_state(config).unwrap();

        let scopes = state.supported_scopes.supported_scopes();
        assert_eq!(scopes.keys().collect::<Vec<_>>(), vec!["openid", "webapi"]);
        assert_eq!(scopes["openid"].related_claims, vec!["sub"]);
        assert!(state.token_helpers.token_types().next().is_none());
    }

    #[test]
    fn test_build_authorization_code_handler() {
        let config = AppConfig::from_toml(CONFIG).unwrap();
        let state = build_state(config).unwrap();

        let handler = build_authorization_code_handler(
            &state.config.security,
            Arc::clone(&state.supported_scopes),
            Arc::new(EmptyRepository),
        );
        assert!(handler.is_ok());
    }

    #[test]
    fn test_out_of_range_code_lifetime_is_configuration_error() {
        let mut config = AppConfig::from_toml(CONFIG).unwrap();
        config.security.authorization_code_lifetime_seconds = u64::MAX;

        let result = build_authorization_code_handler(
            &config.security,
            Arc::new(ScopeCatalog::from_config(&config.security.supported_scopes)),
            Arc::new(EmptyRepository),
        );
        assert!(matches!(result, Err(e) if e.kind == ErrorKind::Configuration));
    }
}
