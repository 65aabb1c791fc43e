//! OAuth2 authorization-code flow state, its factory and issued codes.

pub mod code;
pub mod factory;
pub mod state;

use std::sync::Arc;

use intranet_core::result::AppResult;

pub use code::AuthorizationCode;
pub use factory::{AuthorizationStateFactory, DefaultAuthorizationStateFactory};
pub use state::{AuthorizationState, AuthorizationStateBuilder};

/// Protects (encrypts/signs) an opaque payload before it leaves the server.
pub type Protect = Arc<dyn Fn(&[u8]) -> AppResult<Vec<u8>> + Send + Sync>;

/// Reverses [`Protect`]; fails when the payload was tampered with or was
/// protected for another purpose.
pub type Unprotect = Arc<dyn Fn(&[u8]) -> AppResult<Vec<u8>> + Send + Sync>;
