//! Concurrent cache of parsed rule conditions
//!
//! Entries are keyed by rule id and remember the condition text they were
//! parsed from. A lookup whose text differs from the cached text is a miss
//! and replaces the entry, so editing a rule's condition never evaluates a
//! stale tree. Parse failures are not cached.

use crate::ast::Expression;
use crate::parser::{parse_condition, ParseResult};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct CachedCondition {
    text: String,
    expr: Arc<Expression>,
}

/// Cache statistics
#[derive(Debug, Default)]
struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Snapshot of cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug, Default)]
pub struct ConditionCache {
    entries: DashMap<String, CachedCondition>,
    stats: CacheStats,
}

impl ConditionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the parsed condition for a rule, parsing on a miss
    pub fn get_or_parse(&self, rule_id: &str, condition: &str) -> ParseResult<Arc<Expression>> {
        if let Some(entry) = self.entries.get(rule_id) {
            if entry.text == condition {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(&entry.expr));
            }
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        let expr = Arc::new(parse_condition(condition)?);
        self.entries.insert(
            rule_id.to_string(),
            CachedCondition { text: condition.to_string(), expr: Arc::clone(&expr) },
        );
        Ok(expr)
    }

    /// Drop the entry for one rule
    pub fn invalidate(&self, rule_id: &str) -> bool {
        self.entries.remove(rule_id).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStatSnapshot {
        CacheStatSnapshot {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}
