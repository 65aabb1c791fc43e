//! Explicit per-request context threaded through every token helper
//! operation.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{Method, header};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use tokio::sync::Mutex;
use url::Url;

use intranet_core::result::AppResult;

use crate::flow::FlowError;

/// Method, scheme, host and cookies of the request being served.
///
/// The cookie jar sits behind a mutex so that concurrent helper
/// operations within one request (logout fan-out) can share it. Cookie
/// changes are written back by turning the context into its jar.
#[derive(Debug)]
pub struct HttpContext {
    method: Method,
    scheme: String,
    host: String,
    jar: Mutex<CookieJar>,
}

impl HttpContext {
    /// Creates a context.
    pub fn new(method: Method, scheme: impl Into<String>, host: impl Into<String>, jar: CookieJar) -> Self {
        Self {
            method,
            scheme: scheme.into(),
            host: host.into(),
            jar: Mutex::new(jar),
        }
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request scheme, e.g. `https`.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Request host, including the port when one was sent.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Host without the port; the cookie domain.
    pub fn domain(&self) -> &str {
        if let Some(end) = self.host.find(']') {
            return &self.host[..=end];
        }
        self.host.split(':').next().unwrap_or(&self.host)
    }

    /// Whether cookies must carry the `Secure` flag: HTTPS or any scheme
    /// ending in `s`.
    pub fn is_secure(&self) -> bool {
        self.scheme.to_ascii_lowercase().ends_with('s')
    }

    /// Root URL of the application as seen by the user agent.
    pub fn base_url(&self) -> AppResult<Url> {
        Ok(Url::parse(&format!("{}://{}/", self.scheme, self.host))?)
    }

    /// Value of the cookie named `name`.
    pub async fn cookie_value(&self, name: &str) -> Option<String> {
        self.jar
            .lock()
            .await
            .get(name)
            .map(|cookie| cookie.value().to_string())
    }

    /// Adds or replaces a cookie.
    pub async fn set_cookie(&self, cookie: Cookie<'static>) {
        let mut jar = self.jar.lock().await;
        let current = std::mem::take(&mut *jar);
        *jar = current.add(cookie);
    }

    /// Deletes the cookie named `name` set on the root path of this
    /// request's domain.
    pub async fn delete_cookie(&self, name: &str) {
        let removal = Cookie::build(name.to_string())
            .path("/")
            .domain(self.domain().to_string());

        let mut jar = self.jar.lock().await;
        let current = std::mem::take(&mut *jar);
        *jar = current.remove(removal);
    }

    /// Copy of the current cookie jar.
    pub async fn jar(&self) -> CookieJar {
        self.jar.lock().await.clone()
    }

    /// Consumes the context, returning the jar with every cookie change
    /// made while serving the request.
    pub fn into_jar(self) -> CookieJar {
        self.jar.into_inner()
    }
}

impl<S> FromRequestParts<S> for HttpContext
where
    S: Send + Sync,
{
    type Rejection = FlowError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.to_string()))
            .ok_or_else(|| FlowError::BadRequest("Request carries no host".to_string()))?;

        let scheme = parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|value| value.to_str().ok())
            .or_else(|| parts.uri.scheme_str())
            .unwrap_or("http")
            .to_string();

        Ok(Self::new(
            parts.method.clone(),
            scheme,
            host,
            CookieJar::from_headers(&parts.headers),
        ))
    }
}
