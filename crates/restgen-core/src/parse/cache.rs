use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use log::debug;
use parking_lot::RwLock;

use super::{ParsedSpec, parse_document};

/// Content-addressed memo of parsed documents.
///
/// The key is the exact document text, so byte-identical files share one
/// `Arc<ParsedSpec>` no matter what they are called. Misses parse outside
/// the lock; when two callers race on the same text, the first insert wins
/// and both receive that instance.
#[derive(Default)]
pub struct ParseCache {
    entries: RwLock<HashMap<Arc<str>, Arc<ParsedSpec>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl std::fmt::Debug for ParseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseCache")
            .field("entries", &self.len())
            .field("hits", &self.hits())
            .field("misses", &self.misses())
            .finish()
    }
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache used by the pipeline and CLI.
    pub fn global() -> &'static ParseCache {
        static GLOBAL: OnceLock<ParseCache> = OnceLock::new();
        GLOBAL.get_or_init(ParseCache::new)
    }

    /// Parse `text`, returning the cached result when the same text was
    /// parsed before.
    pub fn parse(&self, text: &str) -> Arc<ParsedSpec> {
        if let Some(hit) = self.entries.read().get(text) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("parse cache hit ({} bytes)", text.len());
            return Arc::clone(hit);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("parse cache miss ({} bytes)", text.len());
        let parsed = Arc::new(parse_document(text));

        let mut entries = self.entries.write();
        let winner = entries.entry(Arc::from(text)).or_insert(parsed);
        Arc::clone(winner)
    }

    /// Drop every cached entry. Later parses build fresh instances.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        debug!("clearing parse cache ({} entries)", entries.len());
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const DOC: &str = "openapi: 3.0.3\ninfo: { title: Pets, version: '1.0' }\npaths: {}\n";

    #[test]
    fn identical_text_shares_instance() {
        let cache = ParseCache::new();
        let a = cache.parse(DOC);
        let b = cache.parse(DOC);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn clear_forces_fresh_instance() {
        let cache = ParseCache::new();
        let a = cache.parse(DOC);
        cache.clear();
        assert!(cache.is_empty());
        let b = cache.parse(DOC);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a, b);
    }

    #[test]
    fn failures_are_cached_too() {
        let cache = ParseCache::new();
        let a = cache.parse("openapi: 2.0\n");
        let b = cache.parse("openapi: 2.0\n");
        assert!(a.document.is_none());
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn concurrent_misses_converge() {
        let cache = ParseCache::new();
        let results: Vec<Arc<ParsedSpec>> = thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(|| cache.parse(DOC))).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(cache.len(), 1);
        let stored = cache.parse(DOC);
        for r in &results {
            assert!(Arc::ptr_eq(r, &stored));
        }
    }
}
