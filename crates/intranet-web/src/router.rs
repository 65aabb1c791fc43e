//! Route definitions for the account token flows.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the Axum router with the account routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(account_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Authorize, callback, refresh and logout endpoints
fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/account/{token_type}/authorize",
            get(handlers::account::authorize),
        )
        .route(
            "/account/{token_type}/callback",
            get(handlers::account::callback),
        )
        .route(
            "/account/{token_type}/refresh",
            get(handlers::account::refresh),
        )
        .route("/account/logout", post(handlers::account::logout))
}
