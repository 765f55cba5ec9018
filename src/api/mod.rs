//! Typed access to the Remote Contact Store.
//!
//! [`ContactReader`] and [`ContactWriter`] describe the four operations of the
//! store's HTTP contract. [`http::HttpContactApi`] speaks that contract over
//! the network and [`memory::InMemoryContactApi`] keeps an in-process
//! collection with the same semantics.

use async_trait::async_trait;

use crate::domain::contact::{Contact, NewContact, PageRequest, PageResult};
use crate::domain::types::ContactId;

pub mod consistency;
pub mod errors;
pub mod http;
pub mod memory;
#[cfg(any(test, feature = "test-mocks"))]
pub mod mock;

pub use errors::{ApiError, ApiResult};

/// Namespace shared by every cached contact query.
pub const CONTACTS_NAMESPACE: &str = "contacts";

#[async_trait]
pub trait ContactReader: Send + Sync {
    /// Fetches one page of the filtered collection together with its total.
    async fn list_contacts(&self, request: &PageRequest) -> ApiResult<PageResult>;

    /// Fetches the whole filtered collection, ignoring pagination.
    async fn list_all_contacts(&self, search: &str, favorites_only: bool)
    -> ApiResult<Vec<Contact>>;
}

#[async_trait]
pub trait ContactWriter: Send + Sync {
    async fn create_contact(&self, contact: &NewContact) -> ApiResult<Contact>;
    /// Replaces the stored record keyed by `contact.id`.
    async fn update_contact(&self, contact: &Contact) -> ApiResult<Contact>;
    async fn delete_contact(&self, id: &ContactId) -> ApiResult<()>;
}

/// Full read/write access to the store.
pub trait ContactApi: ContactReader + ContactWriter {}

impl<T> ContactApi for T where T: ContactReader + ContactWriter + ?Sized {}
