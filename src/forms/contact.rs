use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::contact::{Contact, NewContact};
use crate::forms::{FormError, deserialize_checkbox};

/// Digits, spaces and hyphens with an optional leading `+`.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9\s-]{7,20}$").expect("phone pattern is a valid regex")
});

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, PartialEq, Eq)]
/// Create/edit form for a single contact.
pub struct ContactForm {
    /// One-shot token of the form instance being submitted.
    #[serde(default)]
    pub token: String,
    #[validate(length(min = 2, max = 50, message = "Name must be 2 to 50 characters"))]
    pub name: String,
    #[validate(
        length(min = 1, max = 100, message = "Email is required, at most 100 characters"),
        email(message = "Invalid email address")
    )]
    pub email: String,
    #[validate(regex(path = *PHONE_RE, message = "Invalid phone number"))]
    pub phone: String,
    #[validate(length(min = 10, max = 200, message = "Address must be 10 to 200 characters"))]
    pub address: String,
    #[serde(default, deserialize_with = "deserialize_checkbox")]
    pub favourite: bool,
}

impl ContactForm {
    /// Pre-fills the form with an existing contact for edit mode.
    pub fn from_contact(contact: &Contact) -> Self {
        Self {
            token: String::new(),
            name: contact.name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            address: contact.address.clone(),
            favourite: contact.favourite,
        }
    }

    /// Trims every text field so validation sees what will be sent.
    fn trimmed(&self) -> Self {
        Self {
            token: self.token.trim().to_string(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: self.address.trim().to_string(),
            favourite: self.favourite,
        }
    }

    /// Runs every field rule on the trimmed values.
    pub fn check(&self) -> Result<(), FormError> {
        self.trimmed().validate()?;
        Ok(())
    }

    /// Validates and converts into the payload of a create request.
    pub fn to_new_contact(&self) -> Result<NewContact, FormError> {
        self.check()?;
        Ok(NewContact::new(
            self.name.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.address.clone(),
            self.favourite,
            None,
        ))
    }

    /// Validates and builds the full replacement record for `existing`.
    ///
    /// The identifier and avatar of `existing` are kept.
    pub fn to_updated_contact(&self, existing: &Contact) -> Result<Contact, FormError> {
        let mut updated = self.to_new_contact()?;
        updated.avatar = existing.avatar.clone();
        Ok(updated.with_id(existing.id.clone()))
    }
}
