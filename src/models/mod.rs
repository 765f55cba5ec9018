//! External representations: the Remote Contact Store wire format and
//! application configuration.

pub mod config;
pub mod contact;
