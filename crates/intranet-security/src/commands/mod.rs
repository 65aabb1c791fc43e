//! Commands published on the command bus by the security layer.

pub mod generate_authorization_code;
pub mod token;

pub use generate_authorization_code::{
    GenerateAuthorizationCodeCommand, GenerateAuthorizationCodeCommandHandler,
};
pub use token::{AcquireTokenCommand, RefreshTokenCommand};
