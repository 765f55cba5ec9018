//! Form definitions backing the contact manager routes.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use thiserror::Error;
use validator::ValidationErrors;

pub mod contact;
pub mod toolbar;

/// Validation messages keyed by form field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
/// Errors that can occur when processing form data.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),
}

impl FormError {
    /// Flattens validator output into per-field messages.
    pub fn field_errors(&self) -> FieldErrors {
        match self {
            FormError::Validation(errors) => errors
                .field_errors()
                .into_iter()
                .map(|(field, errors)| {
                    let messages = errors
                        .iter()
                        .map(|error| match &error.message {
                            Some(message) => message.to_string(),
                            None => format!("Invalid {field}"),
                        })
                        .collect();
                    (field.to_string(), messages)
                })
                .collect(),
        }
    }
}

/// Reads an HTML checkbox: present as `on`/`true`/`1`, absent when unchecked.
pub(crate) fn deserialize_checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(matches!(
        value.as_deref().map(str::trim),
        Some("on" | "true" | "1" | "yes")
    ))
}
