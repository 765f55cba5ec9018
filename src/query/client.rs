use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::api::{ApiResult, CONTACTS_NAMESPACE, ContactApi};
use crate::domain::contact::{Contact, NewContact, PageResult};
use crate::domain::types::ContactId;
use crate::query::QueryKey;
use crate::query::bus::InvalidationBus;
use crate::query::cache::{Lookup, QueryCache};

type SharedFetch = Shared<BoxFuture<'static, ApiResult<PageResult>>>;

/// Cached, deduplicated access to the contact store.
///
/// Reads go through the cache; mutations go straight to the store and, on
/// success, invalidate the `contacts` namespace. Failed mutations leave the
/// cache untouched. Concurrent mutations of one contact are not coordinated:
/// the last response wins.
pub struct QueryClient {
    api: Arc<dyn ContactApi>,
    cache: Mutex<QueryCache<PageResult>>,
    in_flight: Mutex<HashMap<QueryKey, SharedFetch>>,
    bus: Arc<InvalidationBus>,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("cached", &self.cache().len())
            .field("bus", &self.bus)
            .finish()
    }
}

impl QueryClient {
    pub fn new(api: Arc<dyn ContactApi>, stale_time: Duration) -> Self {
        Self {
            api,
            cache: Mutex::new(QueryCache::new(stale_time)),
            in_flight: Mutex::new(HashMap::new()),
            bus: Arc::new(InvalidationBus::new()),
        }
    }

    pub fn bus(&self) -> &Arc<InvalidationBus> {
        &self.bus
    }

    fn cache(&self) -> MutexGuard<'_, QueryCache<PageResult>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn in_flight(&self) -> MutexGuard<'_, HashMap<QueryKey, SharedFetch>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether `key` can be served from the cache without a fetch.
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        self.cache().lookup(key).is_fresh()
    }

    /// Cached data for `key`, fresh or not.
    pub fn cached(&self, key: &QueryKey) -> Option<PageResult> {
        match self.cache().lookup(key) {
            Lookup::Fresh(page) | Lookup::Stale(page) => Some(page),
            Lookup::Missing => None,
        }
    }

    /// Returns the page for `key`, fetching it when the cached copy is
    /// missing, expired or invalidated. Callers asking for a key that is
    /// already being fetched share that request.
    pub async fn fetch_page(&self, key: &QueryKey) -> ApiResult<PageResult> {
        let generation = {
            let cache = self.cache();
            if let Lookup::Fresh(page) = cache.lookup(key) {
                return Ok(page);
            }
            cache.generation(key.namespace)
        };

        let fetch = {
            let mut in_flight = self.in_flight();
            match in_flight.get(key) {
                Some(fetch) => fetch.clone(),
                None => {
                    let api = Arc::clone(&self.api);
                    let request = key.page_request();
                    let fetch = async move { api.list_contacts(&request).await }
                        .boxed()
                        .shared();
                    in_flight.insert(key.clone(), fetch.clone());
                    fetch
                }
            }
        };

        let result = fetch.clone().await;

        {
            let mut in_flight = self.in_flight();
            if in_flight
                .get(key)
                .is_some_and(|current| current.ptr_eq(&fetch))
            {
                in_flight.remove(key);
            }
        }

        match &result {
            Ok(page) => {
                if !self.cache().store(key.clone(), page.clone(), generation) {
                    log::warn!("Discarding page {} fetched before an invalidation", key.page);
                }
            }
            Err(err) => log::error!("Failed to fetch contacts page {}: {err}", key.page),
        }

        result
    }

    /// Forgets the cached page for `key` without notifying anyone; used for
    /// manual refetches.
    pub fn forget(&self, key: &QueryKey) {
        self.cache().remove(key);
    }

    /// Drops every cached page of `namespace` and notifies subscribers.
    pub fn invalidate(&self, namespace: &'static str) {
        let affected = self.cache().invalidate(namespace);
        self.in_flight().retain(|key, _| key.namespace != namespace);
        log::debug!("Invalidated {affected} cached page(s) in {namespace}");
        self.bus.publish(namespace);
    }

    pub async fn create_contact(&self, contact: &NewContact) -> ApiResult<Contact> {
        let created = self.api.create_contact(contact).await.map_err(|err| {
            log::error!("Failed to create contact: {err}");
            err
        })?;
        log::info!("Created contact {}", created.id);
        self.invalidate(CONTACTS_NAMESPACE);
        Ok(created)
    }

    pub async fn update_contact(&self, contact: &Contact) -> ApiResult<Contact> {
        let updated = self.api.update_contact(contact).await.map_err(|err| {
            log::error!("Failed to update contact {}: {err}", contact.id);
            err
        })?;
        log::info!("Updated contact {}", updated.id);
        self.invalidate(CONTACTS_NAMESPACE);
        Ok(updated)
    }

    /// Re-sends the full record with `favourite` flipped.
    pub async fn toggle_favourite(&self, contact: &Contact) -> ApiResult<Contact> {
        self.update_contact(&contact.with_favourite_toggled()).await
    }

    /// Deletes a contact. A contact that is already gone counts as deleted.
    pub async fn delete_contact(&self, id: &ContactId) -> ApiResult<()> {
        match self.api.delete_contact(id).await {
            Ok(()) => log::info!("Deleted contact {id}"),
            Err(err) if err.is_not_found() => log::warn!("Contact {id} was already deleted"),
            Err(err) => {
                log::error!("Failed to delete contact {id}: {err}");
                return Err(err);
            }
        }
        self.invalidate(CONTACTS_NAMESPACE);
        Ok(())
    }
}
