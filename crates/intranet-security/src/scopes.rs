//! Catalog of the scopes the authorization server supports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use intranet_core::config::ScopeConfig;

/// A supported scope and the claims it relates to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    /// Scope name as it appears in authorization requests.
    pub name: String,
    /// Human readable description.
    pub description: String,
    /// Claim types a token with this scope may assert.
    pub related_claims: Vec<String>,
}

/// Exposes the global scope catalog.
pub trait SupportedScopesProvider: Send + Sync {
    /// Supported scopes keyed by name.
    fn supported_scopes(&self) -> &BTreeMap<String, Scope>;

    /// Whether `name` is a supported scope.
    fn is_supported(&self, name: &str) -> bool {
        self.supported_scopes().contains_key(name)
    }
}

/// Scope catalog built from configuration.
#[derive(Debug, Clone, Default)]
pub struct ScopeCatalog {
    scopes: BTreeMap<String, Scope>,
}

impl ScopeCatalog {
    /// Creates a catalog from configured scopes. Later duplicates win.
    pub fn from_config(scopes: &[ScopeConfig]) -> Self {
        let scopes = scopes
            .iter()
            .map(|s| {
                (
                    s.name.clone(),
                    Scope {
                        name: s.name.clone(),
                        description: s.description.clone(),
                        related_claims: s.related_claims.clone(),
                    },
                )
            })
            .collect();
        Self { scopes }
    }

    /// Creates a catalog from scope values.
    pub fn from_scopes(scopes: impl IntoIterator<Item = Scope>) -> Self {
        Self {
            scopes: scopes.into_iter().map(|s| (s.name.clone(), s)).collect(),
        }
    }
}

impl SupportedScopesProvider for ScopeCatalog {
    fn supported_scopes(&self) -> &BTreeMap<String, Scope> {
        &self.scopes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(name: &str, claims: &[&str]) -> ScopeConfig {
        ScopeConfig {
            name: name.to_string(),
            description: String::new(),
            related_claims: claims.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_from_config() {
        let catalog = ScopeCatalog::from_config(&[scope("openid", &["sub"]), scope("email", &["email"])]);
        assert_eq!(catalog.supported_scopes().len(), 2);
        assert!(catalog.is_supported("openid"));
        assert!(!catalog.is_supported("profile"));
    }
}
