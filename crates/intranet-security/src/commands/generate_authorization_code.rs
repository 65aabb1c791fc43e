//! Generates an authorization code for an authenticated principal from a
//! protected authorization-state blob.

use std::fmt;
use std::sync::{Arc, LazyLock};

use chrono::Duration;
use regex::Regex;
use tracing::{debug, info};
use url::Url;

use intranet_core::error::AppError;
use intranet_core::result::AppResult;
use intranet_core::traits::{
    EnumerableValidator, ObjectValidator, StringValidator, Validator,
};

use crate::authorization::{
    AuthorizationCode, AuthorizationState, AuthorizationStateFactory, Unprotect,
};
use crate::claim::Claim;
use crate::repository::SecurityRepository;
use crate::scopes::SupportedScopesProvider;
use crate::trusted_domain::TrustedDomainResolver;

const COMMAND_TYPE: &str = "GenerateAuthorizationCodeCommand";
const STATE_TYPE: &str = "AuthorizationState";

static BASE64_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$")
        .expect("base64 pattern is valid")
});

static RESPONSE_TYPE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^code$").expect("response type pattern is valid"));

/// Command carrying the protected authorization state, the authenticated
/// principal's claims and the function that unprotects the state.
#[derive(Clone, Default)]
pub struct GenerateAuthorizationCodeCommand {
    /// Base64 of the protected authorization state.
    pub authorization_state: Option<String>,
    /// Claims of the authenticated principal.
    pub claims: Option<Vec<Claim>>,
    /// Reverses the protection applied to the authorization state.
    pub unprotect: Option<Unprotect>,
}

impl fmt::Debug for GenerateAuthorizationCodeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerateAuthorizationCodeCommand")
            .field("authorization_state", &self.authorization_state)
            .field("claims", &self.claims)
            .field("has_unprotect", &self.unprotect.is_some())
            .finish()
    }
}

impl GenerateAuthorizationCodeCommand {
    /// Creates a command with every field set.
    pub fn new(authorization_state: impl Into<String>, claims: Vec<Claim>, unprotect: Unprotect) -> Self {
        Self {
            authorization_state: Some(authorization_state.into()),
            claims: Some(claims),
            unprotect: Some(unprotect),
        }
    }

    /// Records the command's own field checks on `validator` and hands the
    /// validator back for chaining.
    pub fn validate<'a, V: Validator>(&self, validator: &'a V) -> &'a V {
        let authorization_state = self.authorization_state.as_deref();
        validator
            .string()
            .should_not_be_null_or_white_space(authorization_state, COMMAND_TYPE, "AuthorizationState")
            .should_have_min_length(authorization_state, 1, COMMAND_TYPE, "AuthorizationState", false)
            .should_match_pattern(
                authorization_state,
                &BASE64_PATTERN,
                COMMAND_TYPE,
                "AuthorizationState",
                false,
            );

        validator
            .object()
            .should_not_be_null(self.claims.as_ref(), COMMAND_TYPE, "Claims")
            .should_not_be_null(self.unprotect.as_ref(), COMMAND_TYPE, "Unprotect");

        validator
            .enumerable()
            .should_contain_items(self.claims.as_deref(), COMMAND_TYPE, "Claims", false)
            .should_have_min_items(self.claims.as_deref(), 1, COMMAND_TYPE, "Claims", false);

        validator
    }

    /// Restores the authorization state and records the checks of every
    /// field on `validator`. The restored state is returned unchanged;
    /// failures are read from the validator.
    ///
    /// The client secret and the authorization code are never consulted;
    /// they belong to later steps of the flow.
    pub async fn to_domain<V, R, T, S>(
        &self,
        authorization_state_factory: &dyn AuthorizationStateFactory,
        validator: &V,
        security_repository: &R,
        trusted_domain_resolver: &T,
        supported_scopes_provider: &S,
    ) -> AppResult<AuthorizationState>
    where
        V: Validator,
        R: SecurityRepository + ?Sized,
        T: TrustedDomainResolver + ?Sized,
        S: SupportedScopesProvider + ?Sized,
    {
        let blob = self
            .authorization_state
            .as_deref()
            .ok_or_else(|| AppError::missing_argument("authorizationState"))?;
        let unprotect = self
            .unprotect
            .as_ref()
            .ok_or_else(|| AppError::missing_argument("unprotect"))?;

        let state = authorization_state_factory.from_base64_string(blob, unprotect)?;

        let response_type = Some(state.response_type());
        validator
            .string()
            .should_not_be_null_or_white_space(response_type, STATE_TYPE, "ResponseType")
            .should_have_min_length(response_type, 1, STATE_TYPE, "ResponseType", false)
            .should_match_pattern(
                response_type,
                &RESPONSE_TYPE_PATTERN,
                STATE_TYPE,
                "ResponseType",
                false,
            );

        let client_id = Some(state.client_id());
        validator
            .string()
            .should_not_be_null_or_white_space(client_id, STATE_TYPE, "ClientId")
            .should_have_min_length(client_id, 1, STATE_TYPE, "ClientId", false);
        validator
            .object()
            .should_be_known_value(
                client_id.map(str::to_string),
                |client_id: String| async move {
                    Ok(security_repository
                        .get_client_secret_identity(&client_id)
                        .await?
                        .is_some())
                },
                STATE_TYPE,
                "ClientId",
                false,
            )
            .await;

        // Registered-at-all check followed by the legitimacy check for this
        // authorization context; both resolve against the trusted domains.
        let redirect_uri = state.redirect_uri();
        validator
            .object()
            .should_not_be_null(Some(redirect_uri), STATE_TYPE, "RedirectUri");
        for _ in 0..2 {
            validator
                .object()
                .should_be_known_value(
                    Some(redirect_uri.clone()),
                    |uri: Url| async move { Ok(trusted_domain_resolver.is_trusted_domain(&uri)) },
                    STATE_TYPE,
                    "RedirectUri",
                    false,
                )
                .await;
        }

        let scopes = state.scopes();
        let supported_scope_count = supported_scopes_provider.supported_scopes().len();
        validator
            .object()
            .should_not_be_null(Some(scopes), STATE_TYPE, "Scopes");
        validator
            .enumerable()
            .should_contain_items(Some(scopes), STATE_TYPE, "Scopes", false)
            .should_have_min_items(Some(scopes), 1, STATE_TYPE, "Scopes", false)
            .should_have_max_items(Some(scopes), supported_scope_count, STATE_TYPE, "Scopes", false);
        validator
            .object()
            .should_be_known_value(
                Some(scopes.to_vec()),
                |scopes: Vec<String>| async move {
                    Ok(scopes
                        .iter()
                        .all(|scope| supported_scopes_provider.is_supported(scope)))
                },
                STATE_TYPE,
                "Scopes",
                false,
            )
            .await;

        validator.string().should_have_min_length(
            state.external_state(),
            1,
            STATE_TYPE,
            "ExternalState",
            true,
        );

        debug!(
            client_id = %state.client_id(),
            scopes = scopes.len(),
            "Authorization state checks recorded"
        );
        Ok(state)
    }
}

/// Validates a [`GenerateAuthorizationCodeCommand`], issues an
/// authorization code and persists it with the principal's claims.
#[derive(Clone)]
pub struct GenerateAuthorizationCodeCommandHandler {
    authorization_state_factory: Arc<dyn AuthorizationStateFactory>,
    security_repository: Arc<dyn SecurityRepository>,
    trusted_domain_resolver: Arc<dyn TrustedDomainResolver>,
    supported_scopes_provider: Arc<dyn SupportedScopesProvider>,
    authorization_code_lifetime: Duration,
}

impl fmt::Debug for GenerateAuthorizationCodeCommandHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerateAuthorizationCodeCommandHandler")
            .field("authorization_code_lifetime", &self.authorization_code_lifetime)
            .finish()
    }
}

impl GenerateAuthorizationCodeCommandHandler {
    /// Creates a handler with its collaborators.
    pub fn new(
        authorization_state_factory: Arc<dyn AuthorizationStateFactory>,
        security_repository: Arc<dyn SecurityRepository>,
        trusted_domain_resolver: Arc<dyn TrustedDomainResolver>,
        supported_scopes_provider: Arc<dyn SupportedScopesProvider>,
        authorization_code_lifetime: Duration,
    ) -> Self {
        Self {
            authorization_state_factory,
            security_repository,
            trusted_domain_resolver,
            supported_scopes_provider,
            authorization_code_lifetime,
        }
    }

    /// Runs the command:
    ///
    /// 1. Validate the command's own fields
    /// 2. Restore and validate the authorization state
    /// 3. Issue an authorization code
    /// 4. Persist the code with the principal's claims
    pub async fn execute<V: Validator>(
        &self,
        command: &GenerateAuthorizationCodeCommand,
        validator: &V,
    ) -> AppResult<AuthorizationState> {
        command.validate(validator).ensure_valid()?;

        let state = command
            .to_domain(
                self.authorization_state_factory.as_ref(),
                validator,
                self.security_repository.as_ref(),
                self.trusted_domain_resolver.as_ref(),
                self.supported_scopes_provider.as_ref(),
            )
            .await?;
        validator.ensure_valid()?;

        let authorization_code = AuthorizationCode::generate(self.authorization_code_lifetime);
        let issued = state
            .to_builder()
            .with_authorization_code(authorization_code)
            .build();

        let claims = command.claims.as_deref().unwrap_or_default();
        self.security_repository
            .store_authorization_code(&issued, claims)
            .await?;

        info!(
            client_id = %issued.client_id(),
            claims = claims.len(),
            "Authorization code issued"
        );
        Ok(issued)
    }
}
