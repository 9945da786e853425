use crate::error::SyntaxError;
use crate::parser::{parse_filter, FilterNode};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

struct CacheEntry {
    node: Arc<FilterNode>,
    last_used: AtomicU64,
}

/// Process-wide cache of parsed filters keyed by the exact filter text.
///
/// Lookups take only a shard read lock; recency is tracked with an atomic
/// stamp so hits never need exclusive access. Above capacity the least
/// recently used entries are evicted in one batch.
pub struct FilterCache {
    entries: DashMap<String, CacheEntry>,
    capacity: usize,
    eviction_batch_size: usize,
    clock: AtomicU64,
}

impl FilterCache {
    /// A cache holding at most `capacity` filters; `0` disables caching
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
            eviction_batch_size: (capacity / 8).max(1),
            clock: AtomicU64::new(0),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    pub fn get(&self, filter: &str) -> Option<Arc<FilterNode>> {
        let entry = self.entries.get(filter)?;
        entry.last_used.store(self.tick(), Ordering::Relaxed);
        Some(Arc::clone(&entry.node))
    }

    /// Cached tree for `filter`, parsing and caching it on a miss.
    /// Syntax errors are never cached.
    pub fn get_or_parse(&self, filter: &str) -> Result<Arc<FilterNode>, SyntaxError> {
        if let Some(node) = self.get(filter) {
            return Ok(node);
        }

        let node = Arc::new(parse_filter(filter)?);
        if self.capacity == 0 {
            return Ok(node);
        }

        self.evict_if_needed();
        let stamp = self.tick();
        let entry = self
            .entries
            .entry(filter.to_string())
            .or_insert_with(|| CacheEntry {
                node: Arc::clone(&node),
                last_used: AtomicU64::new(stamp),
            });
        Ok(Arc::clone(&entry.node))
    }

    fn evict_if_needed(&self) {
        let current_len = self.entries.len();
        if current_len < self.capacity {
            return;
        }

        let target_size = self.capacity.saturating_sub(self.eviction_batch_size);
        let to_evict = current_len.saturating_sub(target_size);

        // Oldest first
        let mut stamps: Vec<(String, u64)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.last_used.load(Ordering::Relaxed)))
            .collect();
        stamps.sort_by_key(|(_, last_used)| *last_used);

        for (key, _) in stamps.into_iter().take(to_evict) {
            self.entries.remove(&key);
        }
        tracing::trace!(evicted = to_evict, "Evicted parsed filters from cache");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_hit_returns_same_tree() {
        let cache = FilterCache::new(4);
        let first = cache.get_or_parse(r#"userName eq "john""#).unwrap();
        let second = cache.get_or_parse(r#"userName eq "john""#).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_key_is_exact_text() {
        let cache = FilterCache::new(4);
        cache.get_or_parse("a pr").unwrap();
        cache.get_or_parse("a  pr").unwrap();
        cache.get_or_parse("A pr").unwrap();
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = FilterCache::new(4);
        let err = cache.get_or_parse("userName eq").unwrap_err();
        assert_eq!(err.offset, 11);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let cache = FilterCache::new(0);
        let first = cache.get_or_parse("a pr").unwrap();
        let second = cache.get_or_parse("a pr").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first, second);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_least_recently_used_is_evicted() {
        let cache = FilterCache::new(2);
        cache.get_or_parse("a pr").unwrap();
        cache.get_or_parse("b pr").unwrap();
        // Touch "a" so "b" becomes the oldest
        cache.get("a pr").unwrap();
        cache.get_or_parse("c pr").unwrap();

        assert!(cache.get("a pr").is_some());
        assert!(cache.get("b pr").is_none());
        assert!(cache.get("c pr").is_some());
        assert!(cache.len() <= 2);
    }

    #[test]
    fn test_concurrent_lookups() {
        let cache = Arc::new(FilterCache::new(16));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for j in 0..50 {
                        let filter = format!("attr{} eq {}", (i + j) % 4, j % 3);
                        cache.get_or_parse(&filter).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 16);
        assert!(!cache.is_empty());
    }
}
