//! Integration tests driving the account routes end to end.

mod account_flow_test;
mod helpers;
mod logout_test;
