//! # intranet-core
//!
//! Core crate for the OS Intranet security slice. Contains the unified
//! error system, configuration schemas and the collaborator traits
//! (validation, command bus) consumed by the security and web crates.
//!
//! This crate has **no** internal dependencies on other intranet crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
