//! Bounded FIFO cache mapping expression text to its parsed AST and
//! extracted dependency set.
//!
//! The two are cached under the same key and evicted in lockstep: parsing
//! and dependency extraction are both pure functions of the expression
//! text, so there is never a reason to keep one without the other. Eviction
//! is FIFO by insertion order, not LRU by recency: when the cache is full,
//! inserting a new entry evicts the oldest ~10% of entries in one sweep
//! rather than the single oldest entry, to amortize the eviction cost
//! across many insertions.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::ast::Ast;

#[derive(Debug, Clone)]
struct Entry {
    ast: Ast,
    dependencies: HashSet<String>,
}

#[derive(Debug, Clone)]
pub struct AstCache {
    entries: IndexMap<String, Entry>,
    max_size: usize,
    hits: u64,
    misses: u64,
}

/// Snapshot of cache effectiveness for `Engine::cache_stats`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl AstCache {
    pub fn new(max_size: usize) -> Self {
        AstCache {
            entries: IndexMap::new(),
            max_size: max_size.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, expression: &str) -> Option<(Ast, HashSet<String>)> {
        match self.entries.get(expression) {
            Some(entry) => {
                self.hits += 1;
                Some((entry.ast.clone(), entry.dependencies.clone()))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, expression: String, ast: Ast, dependencies: HashSet<String>) {
        if self.entries.contains_key(&expression) {
            self.entries.insert(expression, Entry { ast, dependencies });
            return;
        }
        if self.entries.len() >= self.max_size {
            self.evict_oldest_tenth();
        }
        self.entries.insert(expression, Entry { ast, dependencies });
    }

    /// Evicts at least one entry, and roughly 10% of capacity when the
    /// cache is large enough for that to round to more than zero.
    fn evict_oldest_tenth(&mut self) {
        let to_evict = (self.max_size / 10).max(1);
        for _ in 0..to_evict {
            if self.entries.shift_remove_index(0).is_none() {
                break;
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Ast;

    fn dummy(text: &str) -> (Ast, HashSet<String>) {
        (Ast::StringLiteral { value: text.into() }, HashSet::new())
    }

    #[test]
    fn hit_after_insert() {
        let mut cache = AstCache::new(10);
        let (ast, deps) = dummy("a");
        cache.insert("a".into(), ast, deps);
        assert!(cache.get("a").is_some());
        assert!(cache.get("missing").is_none());
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn eviction_is_fifo_not_lru() {
        let mut cache = AstCache::new(10);
        for i in 0..10 {
            let (ast, deps) = dummy(&i.to_string());
            cache.insert(i.to_string(), ast, deps);
        }
        // Touch "0" so it is most-recently-used; FIFO eviction should still
        // remove it first because insertion order, not access order, governs.
        let _ = cache.get("0");
        let (ast, deps) = dummy("10");
        cache.insert("10".into(), ast, deps);
        assert!(cache.get("0").is_none());
        assert!(cache.get("10").is_some());
    }

    #[test]
    fn reinserting_same_key_does_not_evict() {
        let mut cache = AstCache::new(2);
        let (a, d) = dummy("a");
        cache.insert("a".into(), a, d);
        let (b, d) = dummy("b");
        cache.insert("b".into(), b, d);
        let (a2, d2) = dummy("a-updated");
        cache.insert("a".into(), a2, d2);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_some());
    }
}
