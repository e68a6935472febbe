//! Compiled-expression cache keyed by call-site identity
//!
//! Expression source text is immutable, so successful compilations are kept
//! for the process lifetime. Compilation failures are never cached and will
//! be retried on the next call for the same key.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::context::MethodIdentity;
use crate::ast::ExpressionNode;
use crate::parser::{ParseResult, parse_expression};

/// Cache key: declaring type + method signature + raw expression text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpressionKey {
    /// Declaring type of the intercepted method
    pub declaring_type: String,
    /// Canonical method signature
    pub method_signature: String,
    /// Raw expression source text
    pub expression: String,
}

impl ExpressionKey {
    /// Build the key for a method and expression text
    pub fn new(method: &MethodIdentity, expression: &str) -> Self {
        Self {
            declaring_type: method.declaring_type().to_string(),
            method_signature: method.signature(),
            expression: expression.to_string(),
        }
    }
}

/// Concurrent map from call-site identity to compiled expression handles.
#[derive(Default)]
pub struct ExpressionCache {
    entries: DashMap<ExpressionKey, Arc<ExpressionNode>>,
    compile_count: AtomicU64,
}

impl ExpressionCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the compiled expression for this call site, compiling at most
    /// once per key. A second caller racing on the same key receives the
    /// already-compiled handle.
    pub fn get_or_compile(
        &self,
        method: &MethodIdentity,
        expression: &str,
    ) -> ParseResult<Arc<ExpressionNode>> {
        let key = ExpressionKey::new(method, expression);
        if let Some(existing) = self.entries.get(&key) {
            return Ok(existing.clone());
        }

        // The vacant entry holds the shard lock while compiling, so
        // concurrent callers for the same key wait instead of recompiling.
        match self.entries.entry(key) {
            Entry::Occupied(occupied) => Ok(occupied.get().clone()),
            Entry::Vacant(vacant) => {
                let compiled = Arc::new(parse_expression(expression)?);
                self.compile_count.fetch_add(1, Ordering::Relaxed);
                log::debug!("Compiled expression {expression:?}");
                Ok(vacant.insert(compiled).clone())
            }
        }
    }

    /// Number of cached expressions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total successful compilations, observable for cache-hit assertions
    pub fn compile_count(&self) -> u64 {
        self.compile_count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method() -> MethodIdentity {
        MethodIdentity::new("OrderService", "createOrder", ["request"])
    }

    #[test]
    fn test_second_call_hits_cache() {
        let cache = ExpressionCache::new();
        let first = cache.get_or_compile(&method(), "#request.userId").unwrap();
        let second = cache.get_or_compile(&method(), "#request.userId").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.compile_count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_methods_compile_separately() {
        let cache = ExpressionCache::new();
        let other = MethodIdentity::new("OrderService", "modifyOrder", ["request"]);
        cache.get_or_compile(&method(), "#request.userId").unwrap();
        cache.get_or_compile(&other, "#request.userId").unwrap();

        assert_eq!(cache.compile_count(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failures_not_cached() {
        let cache = ExpressionCache::new();
        assert!(cache.get_or_compile(&method(), "#diff(#a,").is_err());
        assert!(cache.get_or_compile(&method(), "#diff(#a,").is_err());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.compile_count(), 0);
    }

    #[test]
    fn test_concurrent_same_key_compiles_once() {
        let cache = Arc::new(ExpressionCache::new());
        std::thread::scope(|s| {
            for _ in 0..8 {
                let cache = Arc::clone(&cache);
                s.spawn(move || {
                    cache
                        .get_or_compile(&method(), "'order: ' + #request.userId")
                        .unwrap();
                });
            }
        });
        assert_eq!(cache.compile_count(), 1);
    }
}
