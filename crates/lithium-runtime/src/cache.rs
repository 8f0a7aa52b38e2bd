//! Verdict caching for lithium-runtime.
//!
//! Provides in-memory caching of validation reports so repeated requests
//! with identical inputs skip dispatch. Only successful reports are cached.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use lithium_core::{CacheConfig, ValidationMode, ValidationReport, ValidationRequest};
use moka::future::Cache;

use crate::engine::{ValidationEngine, ValidationError};

/// Cache key for validation reports.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct CacheKey {
    request_hash: u64,
    quick: bool,
}

impl CacheKey {
    /// Key for a full validation of `request`.
    pub fn new(request: &ValidationRequest) -> Self {
        Self {
            request_hash: hash_request(request),
            quick: false,
        }
    }

    /// Key for a quick validation. A blank hint keys the same as no hint.
    pub fn quick(output: &str, topic_hint: Option<&str>) -> Self {
        let topic_hint = topic_hint.filter(|hint| !hint.trim().is_empty());
        let mut hasher = DefaultHasher::new();
        output.hash(&mut hasher);
        topic_hint.hash(&mut hasher);
        ValidationMode::LogicalConsistency.hash(&mut hasher);

        Self {
            request_hash: hasher.finish(),
            quick: true,
        }
    }
}

/// An engine decorated with a report cache.
pub struct CachedEngine {
    engine: Arc<ValidationEngine>,
    cache: Cache<CacheKey, ValidationReport>,
}

impl CachedEngine {
    /// Wrap `engine`, sizing the cache from its config.
    pub fn new(engine: Arc<ValidationEngine>) -> Self {
        let config = engine.config().cache.clone();
        Self::with_config(engine, &config)
    }

    pub fn with_config(engine: Arc<ValidationEngine>, config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();

        Self { engine, cache }
    }

    pub fn engine(&self) -> &Arc<ValidationEngine> {
        &self.engine
    }

    /// [`ValidationEngine::validate`], served from cache when possible.
    pub async fn validate(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationReport, ValidationError> {
        let key = CacheKey::new(request);
        if let Some(report) = self.cache.get(&key).await {
            tracing::debug!(mode = %request.mode(), "Report cache hit");
            return Ok(report);
        }

        let report = self.engine.validate(request).await?;
        self.cache.insert(key, report.clone()).await;
        Ok(report)
    }

    /// [`ValidationEngine::quick_validate`], served from cache when possible.
    pub async fn quick_validate(
        &self,
        output: &str,
        topic_hint: Option<&str>,
    ) -> Result<ValidationReport, ValidationError> {
        let key = CacheKey::quick(output, topic_hint);
        if let Some(report) = self.cache.get(&key).await {
            tracing::debug!("Quick report cache hit");
            return Ok(report);
        }

        let report = self.engine.quick_validate(output, topic_hint).await?;
        self.cache.insert(key, report.clone()).await;
        Ok(report)
    }

    /// Clear the cache.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Approximate number of cached reports.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

fn hash_request(request: &ValidationRequest) -> u64 {
    let mut hasher = DefaultHasher::new();
    request.hash(&mut hasher);
    hasher.finish()
}
