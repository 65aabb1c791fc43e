//! Account handlers: authorize, callback, refresh, logout.
//!
//! Every handler answers with the request's cookie jar so cookie changes
//! made by a helper reach the browser on failures as well.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use intranet_security::TokenType;

use crate::context::HttpContext;
use crate::flow::{FlowError, FlowResult};
use crate::state::AppState;
use crate::token_helper::FlowArguments;

/// Query carrying the URL to return to once the flow completes.
#[derive(Debug, Default, Deserialize)]
pub struct ReturnUrlQuery {
    /// Absolute URL on a trusted domain.
    #[serde(rename = "returnUrl")]
    pub return_url: Option<String>,
}

/// GET /account/{token_type}/authorize
pub async fn authorize(
    State(state): State<AppState>,
    Path(token_type): Path<String>,
    Query(query): Query<ReturnUrlQuery>,
    context: HttpContext,
) -> Response {
    let result = match parse_token_type(&token_type) {
        Ok(token_type) => {
            state
                .token_helpers
                .authorize(token_type, &context, query.return_url.as_deref())
                .await
        }
        Err(e) => Err(e),
    };
    respond(context, result)
}

/// GET /account/{token_type}/callback
pub async fn callback(
    State(state): State<AppState>,
    Path(token_type): Path<String>,
    Query(arguments): Query<FlowArguments>,
    context: HttpContext,
) -> Response {
    let result = match parse_token_type(&token_type) {
        Ok(token_type) => {
            state
                .token_helpers
                .acquire_token(token_type, &context, &arguments)
                .await
        }
        Err(e) => Err(e),
    };
    respond(context, result)
}

/// GET /account/{token_type}/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Path(token_type): Path<String>,
    Query(query): Query<ReturnUrlQuery>,
    context: HttpContext,
) -> Response {
    let result = match parse_token_type(&token_type) {
        Ok(token_type) => {
            state
                .token_helpers
                .refresh_token(token_type, &context, query.return_url.as_deref())
                .await
        }
        Err(e) => Err(e),
    };
    respond(context, result)
}

/// POST /account/logout
pub async fn logout(State(state): State<AppState>, context: HttpContext) -> Response {
    state.token_helpers.handle_logout(&context).await;
    (context.into_jar(), StatusCode::NO_CONTENT).into_response()
}

fn parse_token_type(value: &str) -> Result<TokenType, FlowError> {
    Ok(value.parse::<TokenType>()?)
}

fn respond(context: HttpContext, result: FlowResult) -> Response {
    (context.into_jar(), result).into_response()
}
