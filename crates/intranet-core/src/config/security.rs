//! Token, cookie and authorization configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Security configuration shared by the authorization server and the
/// token helpers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Hosts that may be used as return or redirect targets. A host matches
    /// when it equals an entry or is a sub-domain of one.
    #[serde(default = "default_trusted_domains")]
    pub trusted_domains: Vec<String>,
    /// Base64-encoded 32-byte master key for cookie data protection.
    pub data_protection_key: String,
    /// Scopes the authorization server supports.
    #[serde(default = "default_supported_scopes")]
    pub supported_scopes: Vec<ScopeConfig>,
    /// Lifetime of issued authorization codes in seconds.
    #[serde(default = "default_authorization_code_lifetime")]
    pub authorization_code_lifetime_seconds: u64,
    /// External and internal token providers.
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// A scope the authorization server supports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScopeConfig {
    /// Scope name as it appears in authorization requests.
    pub name: String,
    /// Human readable description.
    #[serde(default)]
    pub description: String,
    /// Claim types a token with this scope may assert.
    #[serde(default)]
    pub related_claims: Vec<String>,
}

/// Token providers, one per token type. Absent providers are not registered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Microsoft identity platform (Graph API).
    #[serde(default)]
    pub microsoft_graph: Option<ProviderConfig>,
    /// Google APIs.
    #[serde(default)]
    pub google_apis: Option<ProviderConfig>,
    /// The intranet's own authorization server.
    #[serde(default)]
    pub intranet_api: Option<ProviderConfig>,
}

/// Authorization-code flow endpoints and credentials for one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OAuth2 client identifier.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: String,
    /// Absolute URL of the provider's authorize endpoint.
    pub authorize_endpoint: String,
    /// Absolute URL of the provider's token endpoint.
    pub token_endpoint: String,
    /// Scopes requested from the provider.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Additional query parameters for the authorize request
    /// (e.g. `response_mode`, `access_type`).
    #[serde(default)]
    pub extra_authorize_parameters: BTreeMap<String, String>,
}

fn default_trusted_domains() -> Vec<String> {
    vec!["localhost".to_string()]
}

fn default_authorization_code_lifetime() -> u64 {
    60
}

fn default_supported_scopes() -> Vec<ScopeConfig> {
    vec![
        ScopeConfig {
            name: "openid".to_string(),
            description: "Access to the user identifier".to_string(),
            related_claims: vec!["sub".to_string()],
        },
        ScopeConfig {
            name: "profile".to_string(),
            description: "Access to the user's profile".to_string(),
            related_claims: vec![
                "name".to_string(),
                "given_name".to_string(),
                "family_name".to_string(),
            ],
        },
        ScopeConfig {
            name: "email".to_string(),
            description: "Access to the user's email address".to_string(),
            related_claims: vec!["email".to_string()],
        },
        ScopeConfig {
            name: "webapi".to_string(),
            description: "Access to the intranet web API".to_string(),
            related_claims: Vec::new(),
        },
    ]
}
