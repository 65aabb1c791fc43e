//! Creates authorization states and restores them from protected blobs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::debug;
use url::Url;

use intranet_core::error::AppError;
use intranet_core::result::AppResult;

use super::Unprotect;
use super::state::{AuthorizationState, AuthorizationStateBuilder};

/// Creates and restores [`AuthorizationState`] values.
pub trait AuthorizationStateFactory: Send + Sync {
    /// Starts a builder for a new authorization request.
    fn create(
        &self,
        response_type: &str,
        client_id: &str,
        redirect_uri: Url,
        scopes: Vec<String>,
    ) -> AppResult<AuthorizationStateBuilder>;

    /// Decodes a base64 blob, unprotects it and deserializes the state.
    ///
    /// Business rules are not checked here; they belong to the validator
    /// run by the consuming command.
    fn from_base64_string(
        &self,
        value: &str,
        unprotect: &Unprotect,
    ) -> AppResult<AuthorizationState>;
}

/// JSON-backed factory, the inverse of
/// [`AuthorizationState::to_base64_string`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAuthorizationStateFactory;

impl AuthorizationStateFactory for DefaultAuthorizationStateFactory {
    fn create(
        &self,
        response_type: &str,
        client_id: &str,
        redirect_uri: Url,
        scopes: Vec<String>,
    ) -> AppResult<AuthorizationStateBuilder> {
        AuthorizationStateBuilder::new(response_type, client_id, redirect_uri, scopes)
    }

    fn from_base64_string(
        &self,
        value: &str,
        unprotect: &Unprotect,
    ) -> AppResult<AuthorizationState> {
        if value.trim().is_empty() {
            return Err(AppError::missing_argument("value"));
        }

        let protected = BASE64.decode(value.trim())?;
        let bytes = unprotect(&protected)?;
        let state: AuthorizationState = serde_json::from_slice(&bytes)?;

        debug!(
            client_id = %state.client_id(),
            scopes = state.scopes().len(),
            "Authorization state restored"
        );
        Ok(state)
    }
}
