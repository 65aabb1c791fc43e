//! Persistence contract consumed by the security commands.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use intranet_core::result::AppResult;

use crate::authorization::AuthorizationState;
use crate::claim::Claim;

/// A registered OAuth2 client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSecretIdentity {
    /// Display name of the client.
    pub friendly_name: String,
    /// OAuth2 client identifier.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: String,
}

/// Security repository. Implementations live in the hosting application.
#[async_trait]
pub trait SecurityRepository: Send + Sync {
    /// Finds the client registered under `client_id`.
    async fn get_client_secret_identity(
        &self,
        client_id: &str,
    ) -> AppResult<Option<ClientSecretIdentity>>;

    /// Persists an issued authorization code together with the state it
    /// was issued for and the principal's claims.
    async fn store_authorization_code(
        &self,
        authorization_state: &AuthorizationState,
        claims: &[Claim],
    ) -> AppResult<()>;
}
