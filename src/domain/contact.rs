use serde::{Deserialize, Serialize};

use crate::domain::types::ContactId;

/// Number of contacts shown on one page of the list view.
pub const PAGE_SIZE: usize = 10;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub favourite: bool,
    /// Optional avatar image URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Contact {
    /// Builds the full replacement record with `favourite` flipped.
    #[must_use]
    pub fn with_favourite_toggled(&self) -> Self {
        Self {
            favourite: !self.favourite,
            ..self.clone()
        }
    }

    /// Case-insensitive full-text match over the textual fields.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [&self.name, &self.email, &self.phone, &self.address]
            .iter()
            .any(|value| value.to_lowercase().contains(&term))
    }

    /// Returns the record's fields without the identifier.
    pub fn to_new_contact(&self) -> NewContact {
        NewContact {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            favourite: self.favourite,
            avatar: self.avatar.clone(),
        }
    }
}

/// Contact payload before the store assigns an identifier.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub favourite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl NewContact {
    #[must_use]
    pub fn new(
        name: String,
        email: String,
        phone: String,
        address: String,
        favourite: bool,
        avatar: Option<String>,
    ) -> Self {
        Self {
            name: name.trim().to_string(),
            email: email.trim().to_lowercase(),
            phone: phone.trim().to_string(),
            address: address.trim().to_string(),
            favourite,
            avatar: avatar
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }

    /// Attaches an identifier producing the full record.
    pub fn with_id(self, id: ContactId) -> Contact {
        Contact {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            favourite: self.favourite,
            avatar: self.avatar,
        }
    }
}

/// Parameters of a single list fetch.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: usize,
    pub search: String,
    pub favorites_only: bool,
}

impl PageRequest {
    pub fn new(page: usize, search: impl Into<String>, favorites_only: bool) -> Self {
        Self {
            page: page.max(1),
            search: search.into(),
            favorites_only,
        }
    }

    pub fn page_size(&self) -> usize {
        PAGE_SIZE
    }

    /// Index of the first record of this page in the filtered collection.
    /// Saturates for page numbers no collection can reach.
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(PAGE_SIZE)
    }
}

/// One page of contacts plus the size of the whole filtered collection.
#[derive(Clone, Debug, Serialize, PartialEq, Eq, Default)]
pub struct PageResult {
    pub contacts: Vec<Contact>,
    pub total: usize,
}

impl PageResult {
    pub fn total_pages(&self) -> usize {
        crate::pagination::total_pages(self.total)
    }
}
