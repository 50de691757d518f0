//! Small LRU cache used for per-domain stylesheet/JavaScript assembly
//! results (spec.md §4.8). Adapted down from the teacher's
//! `memory_optimization.rs` `LruCache`, dropping the memory-pressure
//! accounting the original used since no byte-budget is part of this
//! spec — only the fixed-capacity eviction behavior is kept.

use parking_lot::RwLock;
use std::collections::VecDeque;

pub struct DomainCache {
    inner: RwLock<Inner>,
    capacity: usize,
}

struct Inner {
    entries: std::collections::HashMap<String, String>,
    order: VecDeque<String>,
}

impl DomainCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: std::collections::HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.read().entries.get(key).cloned()
    }

    pub fn put(&self, key: String, value: String) {
        let mut inner = self.inner.write();
        if inner.entries.contains_key(&key) {
            inner.order.retain(|k| k != &key);
        } else if inner.entries.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
        inner.order.push_back(key.clone());
        inner.entries.insert(key, value);
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_cached_value() {
        let cache = DomainCache::new(2);
        cache.put("a".to_string(), "1".to_string());
        assert_eq!(cache.get("a"), Some("1".to_string()));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn evicts_oldest_when_over_capacity() {
        let cache = DomainCache::new(2);
        cache.put("a".to_string(), "1".to_string());
        cache.put("b".to_string(), "2".to_string());
        cache.put("c".to_string(), "3".to_string());
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some("2".to_string()));
        assert_eq!(cache.get("c"), Some("3".to_string()));
    }

    #[test]
    fn clear_empties_cache() {
        let cache = DomainCache::new(4);
        cache.put("a".to_string(), "1".to_string());
        cache.clear();
        assert_eq!(cache.get("a"), None);
    }
}
