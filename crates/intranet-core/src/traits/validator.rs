//! Fluent per-field validation primitives.
//!
//! Validators accumulate failures instead of returning early, so a command
//! can run every check it owns and the caller decides how to surface the
//! result (typically as a 4xx response). Every check takes the value, its
//! constraint parameters, the name of the validating type and the field
//! name; most also take an `allow_null` flag which makes an absent value
//! pass.

use std::fmt;
use std::future::Future;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

/// A single failed check recorded by a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// Name of the type that owns the validated field.
    pub validating_type: String,
    /// Name of the validated field.
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {}", self.validating_type, self.field, self.message)
    }
}

/// Entry point of the validation framework.
pub trait Validator: Send + Sync {
    /// Checks over string values.
    type String: StringValidator;
    /// Checks over integer values.
    type Integer: IntegerValidator;
    /// Checks over arbitrary values.
    type Object: ObjectValidator;
    /// Checks over collections.
    type Enumerable: EnumerableValidator;

    /// String checks.
    fn string(&self) -> &Self::String;

    /// Integer checks.
    fn integer(&self) -> &Self::Integer;

    /// Object checks.
    fn object(&self) -> &Self::Object;

    /// Collection checks.
    fn enumerable(&self) -> &Self::Enumerable;

    /// Every failure recorded so far, in check order.
    fn validation_failures(&self) -> Vec<ValidationFailure>;

    /// Turns the recorded failures into a single validation error.
    fn ensure_valid(&self) -> AppResult<()> {
        let failures = self.validation_failures();
        if failures.is_empty() {
            return Ok(());
        }

        tracing::debug!(count = failures.len(), "Validation failed");

        let message = failures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(AppError::validation(message))
    }
}

/// Checks over string values.
pub trait StringValidator: Send + Sync {
    /// The value must be present and contain a non-whitespace character.
    fn should_not_be_null_or_white_space(
        &self,
        value: Option<&str>,
        validating_type: &str,
        field: &str,
    ) -> &Self;

    /// The value must be at least `min_length` characters long.
    fn should_have_min_length(
        &self,
        value: Option<&str>,
        min_length: usize,
        validating_type: &str,
        field: &str,
        allow_null: bool,
    ) -> &Self;

    /// The value must be at most `max_length` characters long.
    fn should_have_max_length(
        &self,
        value: Option<&str>,
        max_length: usize,
        validating_type: &str,
        field: &str,
        allow_null: bool,
    ) -> &Self;

    /// The value must match `pattern`.
    fn should_match_pattern(
        &self,
        value: Option<&str>,
        pattern: &Regex,
        validating_type: &str,
        field: &str,
        allow_null: bool,
    ) -> &Self;

    /// The value must be accepted by the asynchronous `is_known_value`
    /// lookup. A lookup error counts as a failure.
    fn should_be_known_value<F, Fut>(
        &self,
        value: Option<&str>,
        is_known_value: F,
        validating_type: &str,
        field: &str,
        allow_null: bool,
    ) -> impl Future<Output = &Self> + Send
    where
        F: FnOnce(String) -> Fut + Send,
        Fut: Future<Output = AppResult<bool>> + Send;
}

/// Checks over integer values.
pub trait IntegerValidator: Send + Sync {
    /// The value must lie within `min..=max`.
    fn should_be_between(
        &self,
        value: i64,
        min: i64,
        max: i64,
        validating_type: &str,
        field: &str,
    ) -> &Self;
}

/// Checks over arbitrary values.
pub trait ObjectValidator: Send + Sync {
    /// The value must be present.
    fn should_not_be_null<T: ?Sized + Sync>(
        &self,
        value: Option<&T>,
        validating_type: &str,
        field: &str,
    ) -> &Self;

    /// The value must be accepted by the asynchronous `is_known_value`
    /// lookup. A lookup error counts as a failure.
    fn should_be_known_value<T, F, Fut>(
        &self,
        value: Option<T>,
        is_known_value: F,
        validating_type: &str,
        field: &str,
        allow_null: bool,
    ) -> impl Future<Output = &Self> + Send
    where
        T: Send,
        F: FnOnce(T) -> Fut + Send,
        Fut: Future<Output = AppResult<bool>> + Send;
}

/// Checks over collections.
pub trait EnumerableValidator: Send + Sync {
    /// The collection must contain at least one item.
    fn should_contain_items<T: Sync>(
        &self,
        value: Option<&[T]>,
        validating_type: &str,
        field: &str,
        allow_null: bool,
    ) -> &Self;

    /// The collection must contain at least `min_items` items.
    fn should_have_min_items<T: Sync>(
        &self,
        value: Option<&[T]>,
        min_items: usize,
        validating_type: &str,
        field: &str,
        allow_null: bool,
    ) -> &Self;

    /// The collection must contain at most `max_items` items.
    fn should_have_max_items<T: Sync>(
        &self,
        value: Option<&[T]>,
        max_items: usize,
        validating_type: &str,
        field: &str,
        allow_null: bool,
    ) -> &Self;
}
