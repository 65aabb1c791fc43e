//! Integration tests for the authorize / callback / refresh flows.

use axum::http::{Method, StatusCode};

use intranet_security::{RefreshableToken, RefreshableTokenValue, Token, TokenType, TokenValue};

use crate::helpers::{REFUSED_CODE, RETURN_URL, TestApp, encoded};

const GRAPH_TOKEN_COOKIE: &str = "Intranet.MicrosoftGraphToken";
const INTRANET_TOKEN_COOKIE: &str = "Intranet.IntranetApiToken";

#[tokio::test]
async fn test_authorize_redirects_to_provider() {
    let app = TestApp::new();

    let response = app
        .request(
            Method::GET,
            &format!(
                "/account/microsoft-graph/authorize?returnUrl={}",
                encoded(RETURN_URL)
            ),
            &[],
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    let location = response.location.clone().unwrap();
    assert!(location.starts_with("https://login.example.com/graph/authorize?"));
    assert_eq!(response.location_query("client_id").as_deref(), Some("graph-client"));
    assert_eq!(
        response.location_query("redirect_uri").as_deref(),
        Some("https://intranet.local/account/microsoft-graph/callback")
    );

    let state = response.location_query("state").unwrap();
    let state_cookie = response.cookie_pair(".State.").unwrap();
    assert!(state_cookie.starts_with(&format!("Intranet.MicrosoftGraphToken.State.{state}=")));
}

#[tokio::test]
async fn test_authorize_rejects_untrusted_return_url() {
    let app = TestApp::new();

    for return_url in ["https://evil.example.org/home", "/relative/home"] {
        let response = app
            .request(
                Method::GET,
                &format!(
                    "/account/google-apis/authorize?returnUrl={}",
                    encoded(return_url)
                ),
                &[],
            )
            .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(response.set_cookies.is_empty());
    }

    let missing = app
        .request(Method::GET, "/account/google-apis/authorize", &[])
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert!(missing.set_cookies.is_empty());
}

#[tokio::test]
async fn test_callback_stores_token_and_returns() {
    let app = TestApp::new();

    let (callback, state_cookie_name) = app.sign_in("microsoft-graph", "c-1").await;

    assert_eq!(callback.status, StatusCode::SEE_OTHER);
    assert_eq!(callback.location.as_deref(), Some(RETURN_URL));
    assert_eq!(callback.removals(&state_cookie_name), 1);
    assert_eq!(
        app.bus.acquired.lock().unwrap().as_slice(),
        [(TokenType::MicrosoftGraphToken, "c-1".to_string())]
    );

    let token_cookie = callback.cookie_named(GRAPH_TOKEN_COOKIE).unwrap();
    let token: RefreshableToken = app
        .stored_token(TokenType::MicrosoftGraphToken, &[token_cookie])
        .await
        .unwrap();
    assert_eq!(token.access_token(), "access-c-1");
    assert_eq!(token.refresh_token(), "refresh-c-1");
}

#[tokio::test]
async fn test_refused_code_is_unauthorized_and_clears_state() {
    let app = TestApp::new();

    let (callback, state_cookie_name) = app.sign_in("google-apis", REFUSED_CODE).await;

    assert_eq!(callback.status, StatusCode::UNAUTHORIZED);
    assert_eq!(callback.removals(&state_cookie_name), 1);
    assert!(callback.cookie_named("Intranet.GoogleApisToken").is_none());
}

#[tokio::test]
async fn test_callback_without_state_cookie_is_bad_request() {
    let app = TestApp::new();

    let response = app
        .request(
            Method::GET,
            "/account/microsoft-graph/callback?state=0123456789abcdef&code=c-1",
            &[],
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.bus.acquired.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_refresh_replaces_token_cookie() {
    let app = TestApp::new();
    let (callback, _) = app.sign_in("microsoft-graph", "c-2").await;
    let token_cookie = callback.cookie_named(GRAPH_TOKEN_COOKIE).unwrap();

    let refresh = app
        .request(
            Method::GET,
            &format!(
                "/account/microsoft-graph/refresh?returnUrl={}",
                encoded(RETURN_URL)
            ),
            &[token_cookie],
        )
        .await;

    assert_eq!(refresh.status, StatusCode::SEE_OTHER);
    assert_eq!(refresh.location.as_deref(), Some(RETURN_URL));
    assert_eq!(
        app.bus.refreshed.lock().unwrap().as_slice(),
        [(TokenType::MicrosoftGraphToken, "refresh-c-2".to_string())]
    );

    let renewed_cookie = refresh.cookie_named(GRAPH_TOKEN_COOKIE).unwrap();
    let renewed: RefreshableToken = app
        .stored_token(TokenType::MicrosoftGraphToken, &[renewed_cookie])
        .await
        .unwrap();
    assert_eq!(renewed.access_token(), "refreshed-refresh-c-2");
}

#[tokio::test]
async fn test_refresh_without_token_is_bad_request() {
    let app = TestApp::new();

    let response = app
        .request(
            Method::GET,
            &format!(
                "/account/microsoft-graph/refresh?returnUrl={}",
                encoded(RETURN_URL)
            ),
            &[],
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.bus.refreshed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_access_only_token_cannot_be_refreshed() {
    let app = TestApp::new();
    let (callback, _) = app.sign_in("intranet-api", "c-3").await;
    let token_cookie = callback.cookie_named(INTRANET_TOKEN_COOKIE).unwrap();

    let stored: Token = app
        .stored_token(TokenType::IntranetApiToken, &[token_cookie.clone()])
        .await
        .unwrap();
    assert_eq!(stored.access_token(), "access-c-3");

    let refresh = app
        .request(
            Method::GET,
            &format!(
                "/account/intranet-api/refresh?returnUrl={}",
                encoded(RETURN_URL)
            ),
            &[token_cookie],
        )
        .await;

    assert_eq!(refresh.status, StatusCode::UNAUTHORIZED);
    assert!(app.bus.refreshed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_token_type_is_not_found() {
    let app = TestApp::new();

    let response = app
        .request(Method::GET, "/account/dropbox/authorize", &[])
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
