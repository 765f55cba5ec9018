use serde::{Deserialize, Serialize};

use crate::domain::contact::{Contact as DomainContact, NewContact as DomainNewContact};
use crate::domain::types::{ContactId, TypeConstraintError};

/// Identifier as sent by the store: sequential stores emit numbers, others
/// opaque strings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RecordId {
    Number(u64),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
/// Contact as returned by the Remote Contact Store.
pub struct ContactRecord {
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub favourite: bool,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
/// JSON body for create and replace requests.
pub struct ContactBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub address: &'a str,
    pub favourite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<&'a str>,
}

impl TryFrom<ContactRecord> for DomainContact {
    type Error = TypeConstraintError;

    fn try_from(record: ContactRecord) -> Result<Self, Self::Error> {
        let id = match record.id {
            RecordId::Number(value) => ContactId::from(value),
            RecordId::Text(value) => ContactId::new(value)?,
        };
        Ok(Self {
            id,
            name: record.name,
            email: record.email,
            phone: record.phone,
            address: record.address,
            favourite: record.favourite,
            avatar: record.avatar.filter(|s| !s.is_empty()),
        })
    }
}

impl<'a> From<&'a DomainNewContact> for ContactBody<'a> {
    fn from(contact: &'a DomainNewContact) -> Self {
        Self {
            id: None,
            name: contact.name.as_str(),
            email: contact.email.as_str(),
            phone: contact.phone.as_str(),
            address: contact.address.as_str(),
            favourite: contact.favourite,
            avatar: contact.avatar.as_deref(),
        }
    }
}

impl<'a> From<&'a DomainContact> for ContactBody<'a> {
    fn from(contact: &'a DomainContact) -> Self {
        Self {
            id: Some(contact.id.as_str()),
            name: contact.name.as_str(),
            email: contact.email.as_str(),
            phone: contact.phone.as_str(),
            address: contact.address.as_str(),
            favourite: contact.favourite,
            avatar: contact.avatar.as_deref(),
        }
    }
}
