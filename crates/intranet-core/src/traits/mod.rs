//! Core traits defined in `intranet-core` and implemented by other crates
//! or by the hosting application.

pub mod bus;
pub mod validator;

pub use bus::{Command, CommandBus};
pub use validator::{
    EnumerableValidator, IntegerValidator, ObjectValidator, StringValidator, ValidationFailure,
    Validator,
};
