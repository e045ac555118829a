//! Bounded LRU cache with a per-entry TTL for successful translations,
//! keyed on `(question, ontologyId)` per Open Question (c).

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;
use uuid::Uuid;

struct Entry {
    sparql: String,
    inserted_at: Instant,
}

pub struct QueryCache {
    inner: Mutex<LruCache<(String, Uuid), Entry>>,
    ttl: Duration,
}

impl QueryCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        Self { inner: Mutex::new(LruCache::new(capacity)), ttl }
    }

    /// Returns the cached query, evicting it first if its TTL has expired.
    pub fn get(&self, question: &str, ontology_id: Uuid) -> Option<String> {
        let key = (question.to_string(), ontology_id);
        let mut inner = self.inner.lock().expect("query cache mutex poisoned");
        let expired = matches!(inner.peek(&key), Some(entry) if entry.inserted_at.elapsed() > self.ttl);
        if expired {
            inner.pop(&key);
            return None;
        }
        inner.get(&key).map(|entry| entry.sparql.clone())
    }

    pub fn put(&self, question: &str, ontology_id: Uuid, sparql: String) {
        let key = (question.to_string(), ontology_id);
        let mut inner = self.inner.lock().expect("query cache mutex poisoned");
        inner.put(key, Entry { sparql, inserted_at: Instant::now() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_none_for_an_unseen_key() {
        let cache = QueryCache::new(4, Duration::from_secs(60));
        assert!(cache.get("q", Uuid::nil()).is_none());
    }

    #[test]
    fn round_trips_a_put_value() {
        let cache = QueryCache::new(4, Duration::from_secs(60));
        let id = Uuid::new_v4();
        cache.put("how many widgets", id, "SELECT * WHERE { GRAPH <g> { ?s ?p ?o } }".into());
        assert_eq!(cache.get("how many widgets", id).unwrap(), "SELECT * WHERE { GRAPH <g> { ?s ?p ?o } }");
    }

    #[test]
    fn entries_expire_after_their_ttl() {
        let cache = QueryCache::new(4, Duration::from_millis(0));
        let id = Uuid::new_v4();
        cache.put("q", id, "SELECT * WHERE { GRAPH <g> { ?s ?p ?o } }".into());
        assert!(cache.get("q", id).is_none());
    }

    #[test]
    fn keys_are_scoped_per_ontology() {
        let cache = QueryCache::new(4, Duration::from_secs(60));
        cache.put("q", Uuid::nil(), "SELECT 1".into());
        assert!(cache.get("q", Uuid::new_v4()).is_none());
    }
}
