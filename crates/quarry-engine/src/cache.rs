//! Query cache keyed by an xxh3 fingerprint of (statement, parameters).
//!
//! A hit returns the stored result without running the fetch. Concurrent
//! misses on the same key may each run the fetch — there is no single-flight
//! de-duplication; results for a key are assumed idempotent. Inserts are
//! atomic per key, so readers see either no entry or a complete one.

use std::sync::Arc;

use moka::sync::Cache;
use quarry_core::errors::AccessError;
use quarry_core::types::{Params, Row};
use xxhash_rust::xxh3::xxh3_128;

/// Deterministic digest of a normalized (statement, parameters) pair.
/// Named parameter sets fingerprint identically regardless of key order.
pub fn fingerprint(statement: &str, params: &Params) -> u128 {
    let mut buf = Vec::with_capacity(statement.len() + 64);
    buf.extend_from_slice(statement.trim().as_bytes());
    buf.push(0xFF);
    params.write_canonical(&mut buf);
    xxh3_128(&buf)
}

/// Materialized query results, shared by fingerprint.
///
/// Unbounded by default; entries leave only through explicit invalidation.
/// [`QueryCache::with_capacity`] adds size-based eviction on top of the base
/// hit/miss behavior.
pub struct QueryCache {
    inner: Cache<u128, Arc<Vec<Row>>>,
}

impl QueryCache {
    /// A cache with no eviction.
    pub fn unbounded() -> Self {
        QueryCache {
            inner: Cache::builder().build(),
        }
    }

    /// A cache that evicts past `capacity` entries (TinyLFU admission).
    pub fn with_capacity(capacity: u64) -> Self {
        QueryCache {
            inner: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// Return the cached result for this (statement, parameters) pair, or
    /// run `fetch` exactly once, store its result, and return it.
    pub fn get_or_fetch<F>(
        &self,
        statement: &str,
        params: &Params,
        fetch: F,
    ) -> Result<Arc<Vec<Row>>, AccessError>
    where
        F: FnOnce() -> Result<Vec<Row>, AccessError>,
    {
        let key = fingerprint(statement, params);
        if let Some(hit) = self.inner.get(&key) {
            tracing::debug!(statement, "query cache hit");
            return Ok(hit);
        }
        tracing::debug!(statement, "query cache miss");
        let rows = fetch()?;
        let entry = Arc::new(rows);
        self.inner.insert(key, Arc::clone(&entry));
        Ok(entry)
    }

    /// Drop the entry for one (statement, parameters) pair.
    pub fn invalidate(&self, statement: &str, params: &Params) {
        self.inner.invalidate(&fingerprint(statement, params));
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Approximate number of cached entries.
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use quarry_core::types::{Params, Value};

    use super::fingerprint;

    #[test]
    fn named_params_fingerprint_is_key_order_insensitive() {
        let a = Params::named([(":min", Value::Integer(25)), (":max", Value::Integer(60))]);
        let b = Params::named([(":max", Value::Integer(60)), (":min", Value::Integer(25))]);
        let sql = "SELECT * FROM users WHERE age BETWEEN :min AND :max";
        assert_eq!(fingerprint(sql, &a), fingerprint(sql, &b));
    }

    #[test]
    fn differing_params_fingerprint_differently() {
        let a = Params::positional([Value::Integer(1)]);
        let b = Params::positional([Value::Integer(2)]);
        let sql = "SELECT * FROM users WHERE id = ?1";
        assert_ne!(fingerprint(sql, &a), fingerprint(sql, &b));
    }

    #[test]
    fn empty_param_shapes_fingerprint_identically() {
        let sql = "SELECT * FROM users";
        assert_eq!(
            fingerprint(sql, &Params::None),
            fingerprint(sql, &Params::Positional(Vec::new()))
        );
        assert_eq!(
            fingerprint(sql, &Params::None),
            fingerprint(sql, &Params::Named(Vec::new()))
        );
    }
}
