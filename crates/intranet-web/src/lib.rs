//! # intranet-web
//!
//! HTTP layer of the OS Intranet token lifecycle built on Axum.
//!
//! Provides the per-request context and cookie jar, named-purpose data
//! protection, the cookie-backed token helpers and their factory, the
//! token-endpoint command bus, and the account routes driving the
//! authorize / callback / refresh / logout flows.

pub mod app;
pub mod bus;
pub mod context;
pub mod error;
pub mod flow;
pub mod handlers;
pub mod protection;
pub mod router;
pub mod state;
pub mod token_helper;
pub mod trusted_domain_helper;

pub use app::{build_authorization_code_handler, build_state, build_state_with_bus};
pub use context::HttpContext;
pub use flow::{FlowError, FlowResult, RedirectTarget};
pub use router::build_router;
pub use state::AppState;
