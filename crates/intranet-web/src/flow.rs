//! HTTP-shaped outcomes of the token helper flows.
//!
//! Untrusted return URLs, missing or garbled cookies and refused token
//! acquisitions are expected outcomes and surface as `BadRequest` or
//! `Unauthorized`; only unexpected failures carry an [`AppError`].

use axum::response::{IntoResponse, Redirect, Response};
use thiserror::Error;
use url::Url;

use intranet_core::error::AppError;

/// Where the user agent is sent when a flow step succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    location: Url,
}

impl RedirectTarget {
    /// Creates a redirect to `location`.
    pub fn new(location: Url) -> Self {
        Self { location }
    }

    /// Redirect location.
    pub fn location(&self) -> &Url {
        &self.location
    }
}

impl IntoResponse for RedirectTarget {
    fn into_response(self) -> Response {
        Redirect::to(self.location.as_str()).into_response()
    }
}

/// Failure of a flow step.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The request cannot be served as sent.
    #[error("Bad request: {0}")]
    BadRequest(String),
    /// No credential could be obtained.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// Unexpected failure.
    #[error(transparent)]
    Internal(#[from] AppError),
}

impl FlowError {
    /// Whether this is a `BadRequest` outcome.
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Self::BadRequest(_))
    }

    /// Whether this is an `Unauthorized` outcome.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Result of a flow step.
pub type FlowResult = Result<RedirectTarget, FlowError>;
