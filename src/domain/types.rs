//! Strongly-typed value objects used by domain entities.
//!
//! These wrappers enforce basic invariants (e.g., non-empty identifiers) so
//! that once a value reaches the domain layer it can be treated as trusted.
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors produced when attempting to construct a constrained value object.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// Provided string contained no non-whitespace characters.
    #[error("value cannot be empty")]
    EmptyString,
    /// Provided value failed custom validation.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Identifier assigned to a contact by the remote store.
///
/// Stores may hand out sequential integers or opaque strings; both are kept
/// as trimmed text.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ContactId(String);

impl ContactId {
    /// Trims whitespace and rejects empty identifiers.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let trimmed = value.into().trim().to_string();
        if trimmed.is_empty() {
            return Err(TypeConstraintError::EmptyString);
        }
        if trimmed.contains('/') {
            return Err(TypeConstraintError::InvalidValue(trimmed));
        }
        Ok(Self(trimmed))
    }

    /// Generates a fresh opaque identifier for client-assigned ids.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric value when the identifier is a plain integer.
    pub fn as_number(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    /// Orders identifiers numerically when both are integers, otherwise
    /// lexicographically.
    pub fn natural_cmp(&self, other: &Self) -> Ordering {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl Deref for ContactId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ContactId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ContactId {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ContactId {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<u64> for ContactId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<ContactId> for String {
    fn from(value: ContactId) -> Self {
        value.0
    }
}
