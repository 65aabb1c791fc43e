//! Shared test helpers for integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use tower::ServiceExt;
use url::Url;

use intranet_core::config::AppConfig;
use intranet_core::result::AppResult;
use intranet_core::traits::CommandBus;
use intranet_security::{
    AcquireTokenCommand, RefreshTokenCommand, RefreshableToken, RefreshableTokenFields, Token,
    TokenType, TokenValue,
};
use intranet_web::{AppState, HttpContext, build_router, build_state_with_bus};

/// Host every test request is sent to.
pub const HOST: &str = "intranet.local";

/// Trusted return URL used by the flows.
pub const RETURN_URL: &str = "https://intranet.local/home";

/// Authorization code the fake provider refuses.
pub const REFUSED_CODE: &str = "refused";

const TEST_CONFIG: &str = r#"
[security]
data_protection_key = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="
trusted_domains = ["intranet.local"]

[security.providers.microsoft_graph]
client_id = "graph-client"
client_secret = "graph-secret"
authorize_endpoint = "https://login.example.com/graph/authorize"
token_endpoint = "https://login.example.com/graph/token"
scopes = ["User.Read", "offline_access"]

[security.providers.google_apis]
client_id = "google-client"
client_secret = "google-secret"
authorize_endpoint = "https://accounts.example.com/auth"
token_endpoint = "https://accounts.example.com/token"
scopes = ["openid", "email"]

[security.providers.intranet_api]
client_id = "intranet-client"
client_secret = "intranet-secret"
authorize_endpoint = "https://intranet.local/connect/authorize"
token_endpoint = "https://intranet.local/connect/token"
scopes = ["openid", "webapi"]
"#;

/// In-process token endpoint recording every published command.
#[derive(Debug, Default)]
pub struct FakeTokenBus {
    /// Token type and authorization code of every acquisition.
    pub acquired: Mutex<Vec<(TokenType, String)>>,
    /// Token type and refresh token of every refresh.
    pub refreshed: Mutex<Vec<(TokenType, String)>>,
}

fn expires() -> chrono::DateTime<Utc> {
    Utc::now() + Duration::hours(1)
}

#[async_trait]
impl CommandBus<AcquireTokenCommand<Token>> for FakeTokenBus {
    async fn publish(&self, command: AcquireTokenCommand<Token>) -> AppResult<Option<Token>> {
        self.acquired
            .lock()
            .unwrap()
            .push((command.token_type, command.authorization_code.clone()));
        if command.authorization_code == REFUSED_CODE {
            return Ok(None);
        }

        let token = Token::create()
            .with_token_type("Bearer")?
            .with_access_token(&format!("access-{}", command.authorization_code))?
            .with_expires(expires())
            .build()?;
        Ok(Some(token))
    }
}

#[async_trait]
impl CommandBus<AcquireTokenCommand<RefreshableToken>> for FakeTokenBus {
    async fn publish(
        &self,
        command: AcquireTokenCommand<RefreshableToken>,
    ) -> AppResult<Option<RefreshableToken>> {
        self.acquired
            .lock()
            .unwrap()
            .push((command.token_type, command.authorization_code.clone()));
        if command.authorization_code == REFUSED_CODE {
            return Ok(None);
        }

        let token = RefreshableToken::create()
            .with_token_type("Bearer")?
            .with_access_token(&format!("access-{}", command.authorization_code))?
            .with_refresh_token(&format!("refresh-{}", command.authorization_code))?
            .with_expires(expires())
            .build()?;
        Ok(Some(token))
    }
}

#[async_trait]
impl CommandBus<RefreshTokenCommand> for FakeTokenBus {
    async fn publish(&self, command: RefreshTokenCommand) -> AppResult<Option<RefreshableToken>> {
        let refresh_token = command.refresh_token().to_string();
        self.refreshed
            .lock()
            .unwrap()
            .push((command.token_type, refresh_token.clone()));

        let token = RefreshableToken::create()
            .with_token_type("Bearer")?
            .with_access_token(&format!("refreshed-{refresh_token}"))?
            .with_refresh_token(&refresh_token)?
            .with_expires(expires())
            .build()?;
        Ok(Some(token))
    }
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// State shared with the router
    pub state: AppState,
    /// Token endpoint double
    pub bus: Arc<FakeTokenBus>,
}

impl TestApp {
    /// Create a new test application with every provider configured
    pub fn new() -> Self {
        let config = AppConfig::from_toml(TEST_CONFIG).expect("Failed to parse test config");
        let bus = Arc::new(FakeTokenBus::default());
        let state = build_state_with_bus(config, bus.clone()).expect("Failed to build state");

        Self {
            router: build_router(state.clone()),
            state,
            bus,
        }
    }

    /// Send a request carrying `cookies` (raw `name=value` pairs)
    pub async fn request(&self, method: Method, path: &str, cookies: &[String]) -> TestResponse {
        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header(header::HOST, HOST)
            .header("x-forwarded-proto", "https");

        if !cookies.is_empty() {
            req = req.header(header::COOKIE, cookies.join("; "));
        }

        let req = req.body(Body::empty()).expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let set_cookies = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();

        TestResponse {
            status,
            location,
            set_cookies,
        }
    }

    /// Run authorize and callback for `slug`, returning the callback
    /// response and the state cookie name
    pub async fn sign_in(&self, slug: &str, code: &str) -> (TestResponse, String) {
        let authorize = self
            .request(
                Method::GET,
                &format!("/account/{slug}/authorize?returnUrl={}", encoded(RETURN_URL)),
                &[],
            )
            .await;
        assert_eq!(authorize.status, StatusCode::SEE_OTHER);

        let state_cookie = authorize
            .cookie_pair(".State.")
            .expect("authorize sets a state cookie");
        let state_cookie_name = cookie_name(&state_cookie).to_string();
        let state_identifier = authorize
            .location_query("state")
            .expect("authorize redirect carries the state");

        let callback = self
            .request(
                Method::GET,
                &format!("/account/{slug}/callback?state={state_identifier}&code={code}"),
                &[state_cookie],
            )
            .await;

        (callback, state_cookie_name)
    }

    /// Restore the token stored in `cookies` through the helper factory
    pub async fn stored_token<T: TokenValue>(
        &self,
        token_type: TokenType,
        cookies: &[String],
    ) -> Option<T> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&cookies.join("; ")).expect("Invalid cookie header"),
        );
        let context = HttpContext::new(Method::GET, "https", HOST, CookieJar::from_headers(&headers));

        self.state
            .token_helpers
            .get_token::<T>(token_type, &context)
            .await
            .expect("Token type is registered")
    }
}

/// Response summary
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// `Location` header
    pub location: Option<String>,
    /// Every `Set-Cookie` header
    pub set_cookies: Vec<String>,
}

impl TestResponse {
    /// `name=value` of the first non-removal cookie whose name contains
    /// `fragment`
    pub fn cookie_pair(&self, fragment: &str) -> Option<String> {
        self.set_cookies
            .iter()
            .filter(|c| !is_removal(c))
            .map(|c| c.split(';').next().unwrap_or_default().to_string())
            .find(|pair| cookie_name(pair).contains(fragment))
    }

    /// `name=value` of the non-removal cookie named exactly `name`
    pub fn cookie_named(&self, name: &str) -> Option<String> {
        self.set_cookies
            .iter()
            .filter(|c| !is_removal(c))
            .map(|c| c.split(';').next().unwrap_or_default().to_string())
            .find(|pair| cookie_name(pair) == name)
    }

    /// Number of removal cookies for `name`
    pub fn removals(&self, name: &str) -> usize {
        self.set_cookies
            .iter()
            .filter(|c| is_removal(c) && cookie_name(c) == name)
            .count()
    }

    /// Query parameter of the redirect location
    pub fn location_query(&self, key: &str) -> Option<String> {
        let location = Url::parse(self.location.as_deref()?).ok()?;
        location
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

fn cookie_name(cookie: &str) -> &str {
    cookie.split('=').next().unwrap_or_default().trim()
}

fn is_removal(cookie: &str) -> bool {
    cookie.contains("Max-Age=0")
}

/// Percent-encodes a query value
pub fn encoded(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
