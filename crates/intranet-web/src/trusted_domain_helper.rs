//! Return-URL checks guarding the redirect flows against open redirects.

use std::sync::Arc;

use tracing::debug;
use url::Url;

use intranet_security::TrustedDomainResolver;

/// Parses return URLs and accepts them only when they are absolute HTTP(S)
/// URIs on a trusted domain.
#[derive(Clone)]
pub struct TrustedDomainHelper {
    resolver: Arc<dyn TrustedDomainResolver>,
}

impl std::fmt::Debug for TrustedDomainHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustedDomainHelper").finish_non_exhaustive()
    }
}

impl TrustedDomainHelper {
    /// Creates the helper over `resolver`.
    pub fn new(resolver: Arc<dyn TrustedDomainResolver>) -> Self {
        Self { resolver }
    }

    /// Parses `value` into a trusted absolute URI, or `None` when it is
    /// missing, relative, not HTTP(S) or on an untrusted host.
    pub fn try_create_trusted_uri(&self, value: Option<&str>) -> Option<Url> {
        let value = value.map(str::trim).filter(|v| !v.is_empty())?;

        let uri = match Url::parse(value) {
            Ok(uri) => uri,
            Err(e) => {
                debug!(error = %e, "Return URL is not an absolute URI");
                return None;
            }
        };

        if !matches!(uri.scheme(), "http" | "https") || uri.host_str().is_none() {
            debug!(scheme = %uri.scheme(), "Return URL has no HTTP host");
            return None;
        }

        self.is_trusted(&uri).then_some(uri)
    }

    /// Whether `uri` is on a trusted domain.
    pub fn is_trusted(&self, uri: &Url) -> bool {
        self.resolver.is_trusted_domain(uri)
    }
}
