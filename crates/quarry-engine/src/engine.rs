//! `AccessEngine` — unified entry point for the data-access layer.
//!
//! Owns the handle factory and the query cache, and exposes the four
//! caller-facing operations: stream rows, stream pages, run-in-transaction,
//! and gather. The web/API layer calls these and nothing else.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use quarry_core::config::AccessConfig;
use quarry_core::errors::AccessError;
use quarry_core::types::{Params, Row};

use crate::cache::QueryCache;
use crate::cancellation::FetchCancellation;
use crate::connection::{Database, Target};
use crate::gather::{gather, gather_bounded, FetchTask, Outcome};
use crate::pages::PageStream;
use crate::session::Session;
use crate::stream::RowStream;

/// The unified data-access engine.
pub struct AccessEngine {
    db: Database,
    cache: QueryCache,
    config: AccessConfig,
}

impl AccessEngine {
    /// Open a file-backed engine with default configuration.
    pub fn open(path: &Path) -> Result<Self, AccessError> {
        Self::with_config(AccessConfig {
            db_path: Some(path.to_string_lossy().into_owned()),
            ..AccessConfig::default()
        })
    }

    /// Open an in-memory engine (for testing).
    pub fn open_in_memory() -> Result<Self, AccessError> {
        Self::with_config(AccessConfig::default())
    }

    /// Open an engine from configuration.
    pub fn with_config(config: AccessConfig) -> Result<Self, AccessError> {
        let timeout = Duration::from_millis(config.effective_busy_timeout_ms());
        let target = match &config.db_path {
            Some(path) => Target::File(path.into()),
            None => Target::memory(),
        };
        let db = Database::new(target, timeout)?;
        let cache = match config.cache_capacity {
            Some(capacity) => QueryCache::with_capacity(capacity),
            None => QueryCache::unbounded(),
        };
        Ok(AccessEngine { db, cache, config })
    }

    /// The underlying handle factory, for callers composing their own scopes.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// The query cache, for explicit maintenance.
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Run `work` as one atomic unit: all statements commit together or the
    /// whole unit rolls back and the original failure propagates unmodified.
    pub fn run_in_transaction<F, T>(&self, work: F) -> Result<T, AccessError>
    where
        F: FnOnce(&Session<'_>) -> Result<T, AccessError>,
    {
        self.db.with_transaction(work)
    }

    /// Stream rows lazily through `consume`; one fetch per advance, cursor
    /// and connection released when the scope exits.
    pub fn stream_rows<T, F>(
        &self,
        statement: &str,
        params: &Params,
        consume: F,
    ) -> Result<T, AccessError>
    where
        F: FnOnce(&mut RowStream<'_>) -> Result<T, AccessError>,
    {
        self.db
            .with_session(|session| session.stream_rows(statement, params, consume))
    }

    /// Open a page stream over its own connection.
    pub fn stream_pages(
        &self,
        statement: &str,
        params: &Params,
        page_size: u64,
    ) -> Result<PageStream, AccessError> {
        self.db.stream_pages(statement, params.clone(), page_size)
    }

    /// Page stream with the configured default page size.
    pub fn stream_pages_default(
        &self,
        statement: &str,
        params: &Params,
    ) -> Result<PageStream, AccessError> {
        self.stream_pages(statement, params, self.config.effective_page_size())
    }

    /// Fetch through the query cache: a repeat of the same (statement,
    /// parameters) pair returns the stored rows without re-running the
    /// query. Connection scoping wraps the cache lookup — a hit still
    /// acquires (and releases) a handle; only the fetch is suppressed.
    pub fn fetch_cached(
        &self,
        statement: &str,
        params: &Params,
    ) -> Result<Arc<Vec<Row>>, AccessError> {
        self.db.with_session(|session| {
            self.cache
                .get_or_fetch(statement, params, || session.fetch_all(statement, params))
        })
    }

    /// Drop the cached entry for one (statement, parameters) pair.
    pub fn invalidate_cached(&self, statement: &str, params: &Params) {
        self.cache.invalidate(statement, params);
    }

    /// Run every query concurrently, one connection per task, and return
    /// outcomes in input order. A failed query becomes a `Failure` outcome
    /// without cancelling the rest.
    pub fn gather_queries(&self, queries: &[(String, Params)]) -> Vec<Outcome> {
        self.gather_queries_with(queries, &FetchCancellation::new())
    }

    /// [`Self::gather_queries`] with an external cancellation token.
    pub fn gather_queries_with(
        &self,
        queries: &[(String, Params)],
        cancel: &FetchCancellation,
    ) -> Vec<Outcome> {
        let db = &self.db;
        let tasks: Vec<FetchTask<'_>> = queries
            .iter()
            .map(|(statement, params)| {
                Box::new(move |token: &FetchCancellation| {
                    if token.is_cancelled() {
                        return Err(AccessError::Cancelled);
                    }
                    db.with_session(|session| session.fetch_all(statement, params))
                }) as FetchTask<'_>
            })
            .collect();

        match self.config.max_concurrent_fetches {
            Some(bound) => gather_bounded(tasks, cancel, bound),
            None => gather(tasks, cancel),
        }
    }
}
