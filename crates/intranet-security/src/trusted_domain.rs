//! Host allow-list used to prevent open redirects.

use url::Url;

/// Decides whether a URI points at a trusted host.
pub trait TrustedDomainResolver: Send + Sync {
    /// Whether the host of `uri` is trusted.
    fn is_trusted_domain(&self, uri: &Url) -> bool;
}

/// Trusted domains from configuration. A host is trusted when it equals a
/// configured domain or is a sub-domain of one (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct TrustedDomainCollection {
    domains: Vec<String>,
}

impl TrustedDomainCollection {
    /// Creates the collection; blank entries are ignored.
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = domains
            .into_iter()
            .map(|d| d.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        Self { domains }
    }
}

impl TrustedDomainResolver for TrustedDomainCollection {
    fn is_trusted_domain(&self, uri: &Url) -> bool {
        let Some(host) = uri.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();

        self.domains.iter().any(|domain| {
            host == *domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}
