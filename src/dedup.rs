//! Bounded "already processed" set.
//!
//! The only shared mutable state outside the matching core. Insertion order
//! is tracked so the oldest identifiers are evicted first once the capacity
//! is hit, capping memory over a long season.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

/// Thread-safe membership set with FIFO eviction.
pub struct SeenStore {
    capacity: usize,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    set: HashSet<String>,
    order: VecDeque<String>,
}

impl SeenStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn seen(&self, identifier: &str) -> bool {
        self.lock().set.contains(identifier)
    }

    /// Record an identifier, evicting the oldest entries past capacity.
    /// Marking an already-present identifier is a no-op.
    pub fn mark_seen(&self, identifier: &str) {
        let mut inner = self.lock();
        if !inner.set.insert(identifier.to_string()) {
            return;
        }
        inner.order.push_back(identifier.to_string());
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.set.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means another thread panicked mid-insert;
        // the set stays usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_check() {
        let store = SeenStore::new(10);
        assert!(!store.seen("a"));
        store.mark_seen("a");
        assert!(store.seen("a"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_mark_is_noop() {
        let store = SeenStore::new(10);
        store.mark_seen("a");
        store.mark_seen("a");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_oldest_evicted_first() {
        let store = SeenStore::new(3);
        for id in ["a", "b", "c", "d"] {
            store.mark_seen(id);
        }

        assert_eq!(store.len(), 3);
        assert!(!store.seen("a")); // oldest evicted
        assert!(store.seen("b"));
        assert!(store.seen("d"));
    }

    #[test]
    fn test_concurrent_insertion() {
        use std::sync::Arc;

        let store = Arc::new(SeenStore::new(1000));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        store.mark_seen(&format!("{}_{}", t, i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 800);
    }
}
