//! Per-instance memo of decoded GET responses, keyed by resolved URL.
//!
//! Entries never expire. They go away through `cached: false` on a call,
//! `remove`, `clear`, or when the owning `Http` is unloaded or dropped.
//! Concurrent writers race and the last write wins.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::http::Payload;

#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, Payload>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Payload>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, url: &str) -> Option<Payload> {
        self.entries().get(url).cloned()
    }

    pub fn insert(&self, url: impl Into<String>, payload: Payload) {
        self.entries().insert(url.into(), payload);
    }

    pub fn remove(&self, url: &str) -> Option<Payload> {
        self.entries().remove(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries().contains_key(url)
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_get_remove() {
        let cache = ResponseCache::new();
        assert!(cache.is_empty());
        cache.insert("/a?x=1", Payload::Json(json!({"status": 0})));
        assert!(cache.contains("/a?x=1"));
        assert!(!cache.contains("/a"));
        assert_eq!(cache.get("/a?x=1"), Some(Payload::Json(json!({"status": 0}))));
        assert!(cache.remove("/a?x=1").is_some());
        assert!(cache.get("/a?x=1").is_none());
    }

    #[test]
    fn last_write_wins() {
        let cache = ResponseCache::new();
        cache.insert("/a", Payload::Text("old".to_string()));
        cache.insert("/a", Payload::Text("new".to_string()));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("/a"), Some(Payload::Text("new".to_string())));
    }

    #[test]
    fn clear_empties_everything() {
        let cache = ResponseCache::new();
        cache.insert("/a", Payload::Text("a".to_string()));
        cache.insert("/b", Payload::Text("b".to_string()));
        cache.clear();
        assert!(cache.is_empty());
    }
}
