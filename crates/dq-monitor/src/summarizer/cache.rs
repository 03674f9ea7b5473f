use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// Maximum number of cached summaries.
pub const SUMMARY_CACHE_CAPACITY: usize = 20;

/// Bounded memo of report key -> summary text, least-recently-used eviction.
///
/// Safe to share between concurrent runs. The lock is never held across an
/// await point.
#[derive(Debug)]
pub struct SummaryCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, String>,
    /// Keys from least to most recently used.
    order: VecDeque<String>,
}

impl CacheInner {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }
}

impl Default for SummaryCache {
    fn default() -> Self {
        Self::new(SUMMARY_CACHE_CAPACITY)
    }
}

impl SummaryCache {
    /// A cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.inner.lock();
        let value = inner.entries.get(key).cloned()?;
        inner.touch(key);
        Some(value)
    }

    /// Store `value` under `key`, evicting the least recently used entry
    /// when full.
    pub fn insert(&self, key: String, value: String) {
        let mut inner = self.inner.lock();

        if inner.entries.contains_key(&key) {
            inner.touch(&key);
            inner.entries.insert(key, value);
            return;
        }

        while inner.entries.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_get_after_insert() {
        let cache = SummaryCache::default();
        cache.insert("a".to_string(), "summary a".to_string());

        assert_eq!(cache.get("a"), Some("summary a".to_string()));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.capacity(), 20);
    }

    #[test]
    fn test_bounded_at_capacity() {
        let cache = SummaryCache::default();
        for i in 0..25 {
            cache.insert(format!("k{i}"), format!("v{i}"));
        }

        assert_eq!(cache.len(), SUMMARY_CACHE_CAPACITY);
        assert_eq!(cache.get("k0"), None);
        assert_eq!(cache.get("k4"), None);
        assert_eq!(cache.get("k5"), Some("v5".to_string()));
        assert_eq!(cache.get("k24"), Some("v24".to_string()));
    }

    #[test]
    fn test_recent_hit_survives_eviction() {
        let cache = SummaryCache::new(2);
        cache.insert("a".to_string(), "1".to_string());
        cache.insert("b".to_string(), "2".to_string());

        assert!(cache.get("a").is_some());
        cache.insert("c".to_string(), "3".to_string());

        assert_eq!(cache.get("a"), Some("1".to_string()));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("c"), Some("3".to_string()));
    }

    #[test]
    fn test_reinsert_does_not_grow() {
        let cache = SummaryCache::new(2);
        cache.insert("a".to_string(), "1".to_string());
        cache.insert("a".to_string(), "2".to_string());

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a"), Some("2".to_string()));
    }

    #[test]
    fn test_clear() {
        let cache = SummaryCache::default();
        cache.insert("a".to_string(), "1".to_string());
        cache.clear();

        assert!(cache.is_empty());
    }
}
