//! # intranet-security
//!
//! Token and authorization-state core of the OS Intranet security domain.
//!
//! ## Modules
//!
//! - `token`: token value types, byte/base64 codec and fluent creators
//! - `authorization`: OAuth2 authorization-code state, its factory and codes
//! - `commands`: authorization-code generation and token bus commands
//! - `scopes`: catalog of supported scopes
//! - `trusted_domain`: host allow-list used for redirect validation
//! - `repository`: persistence contract consumed by the commands
//! - `claim`: claims of an authenticated principal

pub mod authorization;
pub mod claim;
pub mod commands;
pub mod repository;
pub mod scopes;
pub mod token;
pub mod trusted_domain;

pub use authorization::{
    AuthorizationCode, AuthorizationState, AuthorizationStateBuilder, AuthorizationStateFactory,
    DefaultAuthorizationStateFactory, Protect, Unprotect,
};
pub use claim::Claim;
pub use commands::{
    AcquireTokenCommand, GenerateAuthorizationCodeCommand, GenerateAuthorizationCodeCommandHandler,
    RefreshTokenCommand,
};
pub use repository::{ClientSecretIdentity, SecurityRepository};
pub use scopes::{Scope, ScopeCatalog, SupportedScopesProvider};
pub use token::{
    RefreshableToken, RefreshableTokenFields, RefreshableTokenValue, StoredToken, Token,
    TokenCreator, TokenFields, TokenKind, TokenType, TokenValue,
};
pub use trusted_domain::{TrustedDomainCollection, TrustedDomainResolver};
