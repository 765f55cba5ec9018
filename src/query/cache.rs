use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::query::QueryKey;

/// How long a cached page is served without refetching.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// Most pages kept at once; the least recently stored page goes first.
pub const MAX_CACHED_PAGES: NonZeroUsize = NonZeroUsize::new(256).unwrap();

#[derive(Debug)]
struct Entry<T> {
    value: T,
    fetched_at: Instant,
    invalidated: bool,
}

/// Result of a cache lookup.
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup<T> {
    /// Within the staleness window and not invalidated.
    Fresh(T),
    /// Present but expired or invalidated; must be refetched before use.
    Stale(T),
    Missing,
}

impl<T> Lookup<T> {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Lookup::Fresh(_))
    }
}

/// Keyed store of fetched values with a staleness window.
///
/// Holds at most a fixed number of entries. Entries past the staleness window
/// are dropped whenever a new value is stored.
///
/// Every namespace carries a generation counter bumped by
/// [`QueryCache::invalidate`]; writers pass the generation observed when
/// their fetch started so results of fetches that raced an invalidation are
/// dropped.
#[derive(Debug)]
pub struct QueryCache<T> {
    entries: LruCache<QueryKey, Entry<T>>,
    generations: HashMap<&'static str, u64>,
    stale_time: Duration,
}

impl<T: Clone> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

impl<T: Clone> QueryCache<T> {
    pub fn new(stale_time: Duration) -> Self {
        Self::with_capacity(stale_time, MAX_CACHED_PAGES)
    }

    pub fn with_capacity(stale_time: Duration, capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            generations: HashMap::new(),
            stale_time,
        }
    }

    fn is_expired(&self, entry: &Entry<T>, now: Instant) -> bool {
        now.saturating_duration_since(entry.fetched_at) >= self.stale_time
    }

    pub fn lookup(&self, key: &QueryKey) -> Lookup<T> {
        self.lookup_at(key, Instant::now())
    }

    pub fn lookup_at(&self, key: &QueryKey, now: Instant) -> Lookup<T> {
        match self.entries.peek(key) {
            None => Lookup::Missing,
            Some(entry) => {
                if entry.invalidated || self.is_expired(entry, now) {
                    Lookup::Stale(entry.value.clone())
                } else {
                    Lookup::Fresh(entry.value.clone())
                }
            }
        }
    }

    /// Current generation of `namespace`.
    pub fn generation(&self, namespace: &str) -> u64 {
        self.generations.get(namespace).copied().unwrap_or(0)
    }

    /// Stores `value` unless `namespace` was invalidated after `generation`
    /// was read. Returns whether the value was stored.
    pub fn store(&mut self, key: QueryKey, value: T, generation: u64) -> bool {
        self.store_at(key, value, generation, Instant::now())
    }

    pub fn store_at(&mut self, key: QueryKey, value: T, generation: u64, now: Instant) -> bool {
        if self.generation(key.namespace) != generation {
            return false;
        }
        self.evict_expired(now);
        self.entries.put(
            key,
            Entry {
                value,
                fetched_at: now,
                invalidated: false,
            },
        );
        true
    }

    /// Drops every entry past the staleness window.
    fn evict_expired(&mut self, now: Instant) {
        let expired: Vec<QueryKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            self.entries.pop(&key);
        }
    }

    /// Forgets a single entry so the next read refetches it.
    pub fn remove(&mut self, key: &QueryKey) -> bool {
        self.entries.pop(key).is_some()
    }

    /// Marks every entry of `namespace` stale. Returns the number of entries
    /// affected.
    pub fn invalidate(&mut self, namespace: &'static str) -> usize {
        *self.generations.entry(namespace).or_insert(0) += 1;
        let mut affected = 0;
        for (key, entry) in self.entries.iter_mut() {
            if key.namespace == namespace {
                entry.invalidated = true;
                affected += 1;
            }
        }
        affected
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contact::PageRequest;

    fn key(page: usize) -> QueryKey {
        QueryKey::contacts(&PageRequest::new(page, "", false))
    }

    fn search_key(search: &str) -> QueryKey {
        QueryKey::contacts(&PageRequest::new(1, search, false))
    }

    fn other_namespace_key() -> QueryKey {
        QueryKey {
            namespace: "groups",
            ..key(1)
        }
    }

    #[test]
    fn entries_are_fresh_within_the_window() {
        let mut cache = QueryCache::new(Duration::from_secs(60));
        let start = Instant::now();
        assert!(cache.store_at(key(1), "page-1", 0, start));

        assert_eq!(cache.lookup_at(&key(1), start), Lookup::Fresh("page-1"));
        assert_eq!(
            cache.lookup_at(&key(1), start + Duration::from_secs(59)),
            Lookup::Fresh("page-1")
        );
        assert_eq!(
            cache.lookup_at(&key(1), start + Duration::from_secs(60)),
            Lookup::Stale("page-1")
        );
        assert_eq!(cache.lookup_at(&key(2), start), Lookup::Missing);
    }

    #[test]
    fn invalidate_marks_only_the_namespace() {
        let mut cache = QueryCache::new(Duration::from_secs(60));
        cache.store(key(1), 1, 0);
        cache.store(key(2), 2, 0);
        cache.store(other_namespace_key(), 3, 0);

        assert_eq!(cache.invalidate("contacts"), 2);

        assert_eq!(cache.lookup(&key(1)), Lookup::Stale(1));
        assert_eq!(cache.lookup(&key(2)), Lookup::Stale(2));
        assert!(cache.lookup(&other_namespace_key()).is_fresh());
    }

    #[test]
    fn results_from_before_an_invalidation_are_dropped() {
        let mut cache = QueryCache::new(Duration::from_secs(60));
        let generation = cache.generation("contacts");

        cache.invalidate("contacts");

        assert!(!cache.store(key(1), 1, generation));
        assert_eq!(cache.lookup(&key(1)), Lookup::Missing);
        assert!(cache.store(key(1), 1, cache.generation("contacts")));
        assert!(cache.lookup(&key(1)).is_fresh());
    }

    #[test]
    fn refreshing_an_invalidated_entry_makes_it_fresh_again() {
        let mut cache = QueryCache::default();
        cache.store(key(1), 1, 0);
        cache.invalidate("contacts");
        cache.store(key(1), 10, cache.generation("contacts"));
        assert_eq!(cache.lookup(&key(1)), Lookup::Fresh(10));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_entries_are_dropped_on_store() {
        let mut cache = QueryCache::new(Duration::from_secs(60));
        let start = Instant::now();
        cache.store_at(search_key("a"), 1, 0, start);
        cache.store_at(search_key("b"), 2, 0, start + Duration::from_secs(30));

        cache.store_at(search_key("c"), 3, 0, start + Duration::from_secs(61));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.lookup(&search_key("a")), Lookup::Missing);
    }

    #[test]
    fn capacity_bounds_the_number_of_entries() {
        let capacity = NonZeroUsize::new(3).unwrap();
        let mut cache = QueryCache::with_capacity(Duration::from_secs(60), capacity);

        for n in 0..10 {
            cache.store(search_key(&format!("q{n}")), n, 0);
        }

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.lookup(&search_key("q0")), Lookup::Missing);
        assert!(cache.lookup(&search_key("q9")).is_fresh());
    }
}
