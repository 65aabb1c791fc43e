//! Authorization codes issued at the end of the authorize step.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use intranet_core::error::AppError;
use intranet_core::result::AppResult;

/// A one-time authorization code and its expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationCode {
    value: String,
    expires: DateTime<Utc>,
}

impl AuthorizationCode {
    /// Wraps an existing code value.
    pub fn new(value: &str, expires: DateTime<Utc>) -> AppResult<Self> {
        if value.trim().is_empty() {
            return Err(AppError::missing_argument("value"));
        }
        Ok(Self {
            value: value.to_string(),
            expires,
        })
    }

    /// Generates a fresh random code valid for `lifetime`.
    pub fn generate(lifetime: Duration) -> Self {
        let value = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        Self {
            value,
            expires: Utc::now() + lifetime,
        }
    }

    /// The code value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Expiry of the code.
    pub fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    /// Whether the code has expired.
    pub fn has_expired(&self) -> bool {
        self.expires <= Utc::now()
    }
}
