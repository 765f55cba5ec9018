use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::api::{ApiError, ApiResult};
use crate::domain::contact::PageResult;
use crate::query::bus::{InvalidationBus, SubscriptionId};
use crate::query::{QueryKey, QueryState};

/// A view's subscription to one query at a time.
///
/// The observer remembers the key it currently wants and the last data it
/// received. Switching keys keeps the previous data visible until the new
/// response lands, and responses for any other key are ignored.
#[derive(Debug, Default)]
pub struct ActiveQuery {
    key: Option<QueryKey>,
    data: Option<PageResult>,
    data_key: Option<QueryKey>,
    is_loading: bool,
    error: Option<ApiError>,
    /// Bumped by every invalidation and manual refetch.
    invalidations: Arc<AtomicU64>,
    /// Invalidation count observed when the in-flight fetch began.
    begun_at: u64,
    /// Invalidation count the current data is known to reflect.
    settled_at: u64,
    subscription: Option<(Arc<InvalidationBus>, SubscriptionId)>,
}

impl ActiveQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an observer that marks itself stale whenever `namespace` is
    /// invalidated on `bus`.
    pub fn watching(bus: Arc<InvalidationBus>, namespace: &'static str) -> Self {
        let invalidations = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&invalidations);
        let id = bus.subscribe(Box::new(move |invalidated| {
            if invalidated == namespace {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }));
        Self {
            key: None,
            data: None,
            data_key: None,
            is_loading: false,
            error: None,
            invalidations,
            begun_at: 0,
            settled_at: 0,
            subscription: Some((bus, id)),
        }
    }

    pub fn key(&self) -> Option<&QueryKey> {
        self.key.as_ref()
    }

    pub fn data(&self) -> Option<&PageResult> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Set by an invalidation or [`ActiveQuery::refetch`] until a successful
    /// response from a fetch started after it.
    pub fn is_stale(&self) -> bool {
        self.invalidations.load(Ordering::SeqCst) != self.settled_at
    }

    /// Requests a refetch on the next load.
    pub fn refetch(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }

    /// Whether the view has to fetch before rendering `key`.
    pub fn needs_fetch(&self, key: &QueryKey) -> bool {
        self.is_stale() || self.error.is_some() || self.data_key.as_ref() != Some(key)
    }

    /// Starts loading `key`; previous data stays available.
    pub fn begin(&mut self, key: QueryKey) {
        self.begun_at = self.invalidations.load(Ordering::SeqCst);
        self.key = Some(key);
        self.is_loading = true;
        self.error = None;
    }

    /// Applies the response for `key`. Responses for a key other than the
    /// current one are dropped and `false` is returned.
    pub fn resolve(&mut self, key: &QueryKey, result: ApiResult<PageResult>) -> bool {
        if self.key.as_ref() != Some(key) {
            log::warn!("Ignoring superseded response for page {}", key.page);
            return false;
        }

        self.is_loading = false;
        match result {
            Ok(page) => {
                self.data = Some(page);
                self.data_key = Some(key.clone());
                self.error = None;
                self.settled_at = self.begun_at;
            }
            Err(err) => self.error = Some(err),
        }
        true
    }

    pub fn state(&self) -> QueryState {
        QueryState {
            data: self.data.clone(),
            is_loading: self.is_loading,
            error: self.error.clone(),
            is_previous_data: self.data.is_some() && self.data_key != self.key,
        }
    }
}

impl Drop for ActiveQuery {
    fn drop(&mut self) {
        if let Some((bus, id)) = self.subscription.take() {
            bus.unsubscribe(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CONTACTS_NAMESPACE;
    use crate::domain::contact::PageRequest;

    fn key(page: usize) -> QueryKey {
        QueryKey::contacts(&PageRequest::new(page, "", false))
    }

    fn page(total: usize) -> PageResult {
        PageResult {
            contacts: vec![],
            total,
        }
    }

    #[test]
    fn keeps_previous_data_while_next_key_loads() {
        let mut query = ActiveQuery::new();
        query.begin(key(1));
        query.resolve(&key(1), Ok(page(25)));

        query.begin(key(2));
        let state = query.state();

        assert!(state.is_loading);
        assert!(state.is_previous_data);
        assert_eq!(state.data, Some(page(25)));
    }

    #[test]
    fn superseded_responses_are_ignored() {
        let mut query = ActiveQuery::new();
        query.begin(key(1));
        query.begin(key(2));

        assert!(!query.resolve(&key(1), Ok(page(1))));
        assert!(query.data().is_none());
        assert!(query.is_loading());

        assert!(query.resolve(&key(2), Ok(page(2))));
        assert_eq!(query.data(), Some(&page(2)));
        assert!(!query.state().is_previous_data);
    }

    #[test]
    fn errors_keep_last_data() {
        let mut query = ActiveQuery::new();
        query.begin(key(1));
        query.resolve(&key(1), Ok(page(5)));
        query.begin(key(1));
        query.resolve(&key(1), Err(ApiError::Network("down".into())));

        assert_eq!(query.data(), Some(&page(5)));
        assert!(query.error().is_some());
        assert!(query.needs_fetch(&key(1)));
    }

    #[test]
    fn invalidation_marks_watching_query_stale() {
        let bus = Arc::new(InvalidationBus::new());
        let mut query = ActiveQuery::watching(Arc::clone(&bus), CONTACTS_NAMESPACE);
        query.begin(key(1));
        query.resolve(&key(1), Ok(page(5)));
        assert!(!query.needs_fetch(&key(1)));

        bus.publish("groups");
        assert!(!query.is_stale());
        bus.publish(CONTACTS_NAMESPACE);
        assert!(query.needs_fetch(&key(1)));

        query.begin(key(1));
        query.resolve(&key(1), Ok(page(4)));
        assert!(!query.is_stale());
    }

    #[test]
    fn invalidation_during_a_fetch_keeps_the_query_stale() {
        let bus = Arc::new(InvalidationBus::new());
        let mut query = ActiveQuery::watching(Arc::clone(&bus), CONTACTS_NAMESPACE);
        query.begin(key(1));

        bus.publish(CONTACTS_NAMESPACE);
        query.resolve(&key(1), Ok(page(5)));

        assert!(query.is_stale());
        assert!(query.needs_fetch(&key(1)));

        query.begin(key(1));
        query.resolve(&key(1), Ok(page(4)));
        assert!(!query.is_stale());
    }

    #[test]
    fn dropping_unsubscribes() {
        let bus = Arc::new(InvalidationBus::new());
        let query = ActiveQuery::watching(Arc::clone(&bus), CONTACTS_NAMESPACE);
        assert_eq!(bus.len(), 1);
        drop(query);
        assert!(bus.is_empty());
    }
}
