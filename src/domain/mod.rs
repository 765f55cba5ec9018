//! Domain aggregates exposed by the contact manager client layer.

pub mod contact;
pub mod types;
