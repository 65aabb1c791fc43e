//! State of one in-flight OAuth2 authorization-code request.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use url::Url;

use intranet_core::error::AppError;
use intranet_core::result::AppResult;

use super::Protect;
use super::code::AuthorizationCode;

/// One in-flight authorization-code request.
///
/// Round-tripped to the user agent as a protected base64 blob between the
/// authorize request and the code issuing step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationState {
    response_type: String,
    client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_secret: Option<String>,
    redirect_uri: Url,
    scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    authorization_code: Option<AuthorizationCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    external_state: Option<String>,
}

impl AuthorizationState {
    /// Response type; `code` for the authorization-code flow.
    pub fn response_type(&self) -> &str {
        &self.response_type
    }

    /// Identifier of the requesting client.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Client secret, present once the client has been authenticated.
    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    /// URI the user agent is sent back to.
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    /// Requested scopes, in request order.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Issued authorization code, if the authorize step has completed.
    pub fn authorization_code(&self) -> Option<&AuthorizationCode> {
        self.authorization_code.as_ref()
    }

    /// Opaque state supplied by the client, passed back unchanged.
    pub fn external_state(&self) -> Option<&str> {
        self.external_state.as_deref()
    }

    /// Starts a builder carrying every value of this state.
    pub fn to_builder(&self) -> AuthorizationStateBuilder {
        AuthorizationStateBuilder {
            response_type: self.response_type.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            redirect_uri: self.redirect_uri.clone(),
            scopes: self.scopes.clone(),
            authorization_code: self.authorization_code.clone(),
            external_state: self.external_state.clone(),
        }
    }

    /// Serializes the state and protects it for the round trip through the
    /// user agent.
    pub fn to_base64_string(&self, protect: &Protect) -> AppResult<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(BASE64.encode(protect(&bytes)?))
    }

    /// Redirect URI carrying the issued code and, when present, the
    /// external state.
    pub fn generate_redirect_uri(&self) -> AppResult<Url> {
        let code = self.authorization_code.as_ref().ok_or_else(|| {
            AppError::value_not_set("with_authorization_code", "AuthorizationStateBuilder")
        })?;

        let mut uri = self.redirect_uri.clone();
        {
            let mut query = uri.query_pairs_mut();
            query.append_pair("code", code.value());
            if let Some(state) = self.external_state.as_deref() {
                query.append_pair("state", state);
            }
        }
        Ok(uri)
    }
}

/// Builder for [`AuthorizationState`], obtained from
/// [`AuthorizationStateFactory::create`](super::AuthorizationStateFactory::create)
/// or [`AuthorizationState::to_builder`].
#[derive(Debug, Clone)]
pub struct AuthorizationStateBuilder {
    response_type: String,
    client_id: String,
    client_secret: Option<String>,
    redirect_uri: Url,
    scopes: Vec<String>,
    authorization_code: Option<AuthorizationCode>,
    external_state: Option<String>,
}

impl AuthorizationStateBuilder {
    pub(crate) fn new(
        response_type: &str,
        client_id: &str,
        redirect_uri: Url,
        scopes: Vec<String>,
    ) -> AppResult<Self> {
        if response_type.trim().is_empty() {
            return Err(AppError::missing_argument("responseType"));
        }
        if client_id.trim().is_empty() {
            return Err(AppError::missing_argument("clientId"));
        }

        Ok(Self {
            response_type: response_type.to_string(),
            client_id: client_id.to_string(),
            client_secret: None,
            redirect_uri,
            scopes,
            authorization_code: None,
            external_state: None,
        })
    }

    /// Sets the client secret.
    pub fn with_client_secret(mut self, client_secret: &str) -> AppResult<Self> {
        if client_secret.trim().is_empty() {
            return Err(AppError::missing_argument("clientSecret"));
        }
        self.client_secret = Some(client_secret.to_string());
        Ok(self)
    }

    /// Sets the external state.
    pub fn with_external_state(mut self, external_state: &str) -> AppResult<Self> {
        if external_state.is_empty() {
            return Err(AppError::missing_argument("externalState"));
        }
        self.external_state = Some(external_state.to_string());
        Ok(self)
    }

    /// Sets the issued authorization code.
    pub fn with_authorization_code(mut self, authorization_code: AuthorizationCode) -> Self {
        self.authorization_code = Some(authorization_code);
        self
    }

    /// Builds the state.
    pub fn build(self) -> AuthorizationState {
        AuthorizationState {
            response_type: self.response_type,
            client_id: self.client_id,
            client_secret: self.client_secret,
            redirect_uri: self.redirect_uri,
            scopes: self.scopes,
            authorization_code: self.authorization_code,
            external_state: self.external_state,
        }
    }
}
