//! Paginated store for asynchronously fetched field values.
//!
//! Entries are keyed by `model.field|search-prefix` and mutated in place
//! as pages arrive. A delivered page must extend the cached sequence by
//! exactly one; anything else is a stale response from an evicted or
//! superseded entry and is discarded rather than merged.

use crate::cache::BoundedLruCache;
use crate::ports::ValuePage;

pub fn cache_key(model: &str, field: &str, search: &str) -> String {
    format!("{model}.{field}|{search}")
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValueCacheEntry {
    pub items: Vec<String>,
    pub page: Option<u32>,
    pub has_next: bool,
    pub loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Applied,
    Stale,
}

pub struct ValueCache {
    inner: BoundedLruCache<String, ValueCacheEntry>,
}

impl ValueCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: BoundedLruCache::new(capacity),
        }
    }

    pub fn get(&mut self, key: &str) -> Option<&ValueCacheEntry> {
        self.inner.get(key)
    }

    pub fn peek(&self, key: &str) -> Option<&ValueCacheEntry> {
        self.inner.peek(key)
    }

    /// First access for a key inserts an empty loading entry and reports
    /// that page 1 must be fetched.
    pub fn begin_first_fetch(&mut self, key: &str) -> bool {
        if self.inner.contains(key) {
            return false;
        }
        self.inner.insert(
            key.to_string(),
            ValueCacheEntry {
                loading: true,
                ..ValueCacheEntry::default()
            },
        );
        true
    }

    /// Marks the next page in flight if one exists and none is already
    /// being fetched. Returns the page number to request, if any.
    pub fn begin_next_fetch(&mut self, key: &str) -> Option<u32> {
        let entry = self.inner.get_mut(key)?;
        if entry.loading || !entry.has_next {
            return None;
        }
        entry.loading = true;
        Some(entry.page.unwrap_or(0) + 1)
    }

    /// Applies a delivered page after the sequence check: the page number
    /// must be exactly one greater than the cached one.
    pub fn apply_page(&mut self, key: &str, delivered: &ValuePage) -> PageOutcome {
        let Some(entry) = self.inner.get_mut(key) else {
            // Entry evicted while the request was in flight.
            return PageOutcome::Stale;
        };
        entry.loading = false;
        if delivered.page != entry.page.unwrap_or(0) + 1 {
            return PageOutcome::Stale;
        }
        entry.items.extend(delivered.items.iter().cloned());
        entry.page = Some(delivered.page);
        entry.has_next = delivered.has_next;
        PageOutcome::Applied
    }

    /// Clears the in-flight flag after a transport failure so the next
    /// keystroke can retry.
    pub fn clear_loading(&mut self, key: &str) {
        if let Some(entry) = self.inner.get_mut(key) {
            entry.loading = false;
        }
    }

    /// Drops an entry whose scheduled fetch was cancelled before it was
    /// dispatched. The key must read as a miss on the next access, not
    /// as a cached empty result.
    pub fn remove(&mut self, key: &str) {
        self.inner.remove(key);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(items: &[&str], page: u32, has_next: bool) -> ValuePage {
        ValuePage {
            items: items.iter().map(ToString::to_string).collect(),
            page,
            has_next,
        }
    }

    #[test]
    fn key_format() {
        assert_eq!(cache_key("auth.user", "email", "jo"), "auth.user.email|jo");
    }

    #[test]
    fn first_fetch_inserts_loading_entry() {
        let mut cache = ValueCache::new(4);

        assert!(cache.begin_first_fetch("k"));
        assert!(!cache.begin_first_fetch("k"));

        let entry = cache.peek("k").unwrap();
        assert!(entry.loading);
        assert!(entry.items.is_empty());
        assert_eq!(entry.page, None);
    }

    #[test]
    fn pages_append_in_sequence() {
        let mut cache = ValueCache::new(4);
        cache.begin_first_fetch("k");

        assert_eq!(cache.apply_page("k", &page(&["a", "b"], 1, true)), PageOutcome::Applied);
        assert_eq!(cache.begin_next_fetch("k"), Some(2));
        assert_eq!(cache.apply_page("k", &page(&["c"], 2, false)), PageOutcome::Applied);

        let entry = cache.peek("k").unwrap();
        assert_eq!(entry.items, vec!["a", "b", "c"]);
        assert_eq!(entry.page, Some(2));
        assert!(!entry.has_next);
        assert!(!entry.loading);
    }

    #[test]
    fn out_of_sequence_page_is_discarded() {
        let mut cache = ValueCache::new(4);
        cache.begin_first_fetch("k");
        cache.apply_page("k", &page(&["a"], 1, true));

        // Page 3 with page 1 cached: stale, items untouched.
        assert_eq!(cache.apply_page("k", &page(&["x"], 3, true)), PageOutcome::Stale);
        assert_eq!(cache.peek("k").unwrap().items, vec!["a"]);
    }

    #[test]
    fn page_for_evicted_entry_is_stale() {
        let mut cache = ValueCache::new(1);
        cache.begin_first_fetch("old");
        cache.begin_first_fetch("new");

        // "old" was evicted by capacity; its late page is dropped.
        assert_eq!(cache.apply_page("old", &page(&["x"], 1, false)), PageOutcome::Stale);
        assert!(cache.peek("old").is_none());
    }

    #[test]
    fn next_fetch_requires_has_next_and_idle() {
        let mut cache = ValueCache::new(4);
        cache.begin_first_fetch("k");

        // Still loading page 1.
        assert_eq!(cache.begin_next_fetch("k"), None);

        cache.apply_page("k", &page(&["a"], 1, true));
        assert_eq!(cache.begin_next_fetch("k"), Some(2));
        // Second trigger while in flight is a no-op.
        assert_eq!(cache.begin_next_fetch("k"), None);

        cache.apply_page("k", &page(&["b"], 2, false));
        // Exhausted: no further pages.
        assert_eq!(cache.begin_next_fetch("k"), None);
    }

    #[test]
    fn lru_eviction_over_capacity() {
        let mut cache = ValueCache::new(2);
        cache.begin_first_fetch("a");
        cache.begin_first_fetch("b");
        cache.begin_first_fetch("c");

        assert_eq!(cache.len(), 2);
        assert!(cache.peek("a").is_none());
        assert!(cache.peek("b").is_some());
        assert!(cache.peek("c").is_some());
    }

    #[test]
    fn removed_key_reads_as_a_miss() {
        let mut cache = ValueCache::new(2);
        cache.begin_first_fetch("k");

        cache.remove("k");

        assert!(cache.peek("k").is_none());
        // The next access starts a fresh fetch cycle.
        assert!(cache.begin_first_fetch("k"));
    }

    #[test]
    fn transport_failure_clears_loading() {
        let mut cache = ValueCache::new(2);
        cache.begin_first_fetch("k");

        cache.clear_loading("k");

        assert!(!cache.peek("k").unwrap().loading);
    }
}
