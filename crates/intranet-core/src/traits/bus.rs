//! Typed command bus used to reach identity providers and other
//! collaborators behind the business logic.

use async_trait::async_trait;

use crate::result::AppResult;

/// A command that can be published on a [`CommandBus`].
///
/// The associated `Output` is what the handler produces for the command.
pub trait Command: Send + Sync + 'static {
    /// Result produced by handling the command.
    type Output: Send + 'static;
}

/// Dispatches commands of type `C` to their handler.
///
/// A bus implementation implements this trait once per command type it
/// can handle, so missing handlers are compile-time errors.
#[async_trait]
pub trait CommandBus<C: Command>: Send + Sync {
    /// Publish the command and wait for its result.
    async fn publish(&self, command: C) -> AppResult<C::Output>;
}
