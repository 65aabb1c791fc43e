//! Integration tests for logout.

use axum::http::{Method, StatusCode};

use crate::helpers::TestApp;

const TOKEN_COOKIES: [&str; 3] = [
    "Intranet.MicrosoftGraphToken",
    "Intranet.GoogleApisToken",
    "Intranet.IntranetApiToken",
];

#[tokio::test]
async fn test_logout_deletes_every_token_cookie_once() {
    let app = TestApp::new();
    let cookies: Vec<String> = TOKEN_COOKIES
        .iter()
        .map(|name| format!("{name}=stored"))
        .collect();

    let response = app.request(Method::POST, "/account/logout", &cookies).await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    for name in TOKEN_COOKIES {
        assert_eq!(response.removals(name), 1, "{name}");
    }
    assert_eq!(response.set_cookies.len(), TOKEN_COOKIES.len());
}

#[tokio::test]
async fn test_logout_keeps_unrelated_cookies() {
    let app = TestApp::new();

    let response = app
        .request(
            Method::POST,
            "/account/logout",
            &["Intranet.MicrosoftGraphToken=stored".to_string(), "theme=dark".to_string()],
        )
        .await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(response.removals("Intranet.MicrosoftGraphToken"), 1);
    assert_eq!(response.removals("theme"), 0);
}
