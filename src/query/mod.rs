//! Data cache and query layer.
//!
//! [`client::QueryClient`] sits between views and the store: it caches pages
//! by [`QueryKey`], shares in-flight fetches for the same key, and invalidates
//! a namespace after every successful mutation. Views observe their current
//! key through [`observer::ActiveQuery`], which subscribes to the
//! [`bus::InvalidationBus`].

use serde::Serialize;

use crate::api::{ApiError, CONTACTS_NAMESPACE};
use crate::domain::contact::{PageRequest, PageResult};

pub mod bus;
pub mod cache;
pub mod client;
pub mod observer;

/// Identity of a cached query.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub namespace: &'static str,
    pub page: usize,
    pub search: String,
    pub favorites_only: bool,
}

impl QueryKey {
    /// Key of a contact list page.
    pub fn contacts(request: &PageRequest) -> Self {
        Self {
            namespace: CONTACTS_NAMESPACE,
            page: request.page,
            search: request.search.trim().to_string(),
            favorites_only: request.favorites_only,
        }
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.search.clone(), self.favorites_only)
    }
}

/// What a view needs to render a query.
#[derive(Clone, Debug, Default, Serialize)]
pub struct QueryState {
    pub data: Option<PageResult>,
    pub is_loading: bool,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<ApiError>,
    /// `data` belongs to an earlier key and is shown while the current one loads.
    pub is_previous_data: bool,
}

fn serialize_error<S>(error: &Option<ApiError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match error {
        Some(error) => serializer.serialize_some(&error.to_string()),
        None => serializer.serialize_none(),
    }
}
