/*!
 * Provider client caching.
 *
 * Building a provider client (HTTP client, model settings) is done once per
 * language pair and the client is reused for every later block of the
 * same pair. The cache is explicit and owned by the orchestrator instead
 * of being a process-wide table.
 */

use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::providers::{ProviderFactory, TranslationProvider};

/// Cache key: one entry per (source, target) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    /// Source language code
    source_language: String,

    /// Target language code
    target_language: String,
}

impl CacheKey {
    fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            source_language: source_language.trim().to_lowercase(),
            target_language: target_language.trim().to_lowercase(),
        }
    }
}

/// Cache of provider clients keyed by language pair
#[derive(Debug, Default)]
pub struct ProviderCache {
    /// Internal cache storage
    clients: RwLock<HashMap<CacheKey, Arc<dyn TranslationProvider>>>,

    /// Cache hit counter
    hits: AtomicUsize,

    /// Cache miss counter
    misses: AtomicUsize,
}

impl ProviderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached client for the pair or build one with `factory`
    ///
    /// A failed build is not cached; the next call tries again.
    pub fn get_or_create(
        &self,
        source_language: &str,
        target_language: &str,
        factory: &dyn ProviderFactory,
    ) -> Result<Arc<dyn TranslationProvider>, ProviderError> {
        let key = CacheKey::new(source_language, target_language);

        if let Some(client) = self.clients.read().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Provider cache hit for {} → {}", source_language, target_language);
            return Ok(Arc::clone(client));
        }

        let mut clients = self.clients.write();
        // Another caller may have inserted while we waited for the write lock
        if let Some(client) = clients.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(client));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Provider cache miss for {} → {}", source_language, target_language);
        let client = factory.create(source_language, target_language)?;
        clients.insert(key, Arc::clone(&client));
        Ok(client)
    }

    /// Get cache statistics as (hits, misses, hit rate)
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Drop every cached client and reset the counters
    pub fn clear(&self) {
        self.clients.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        debug!("Provider cache cleared");
    }

    /// Get the number of cached clients
    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }
}
