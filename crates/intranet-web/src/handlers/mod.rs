//! HTTP request handlers.

pub mod account;
