//! TTL cache for normalized command catalogs
//!
//! Editor dialogs poll the command list every time they open. Entries are
//! kept per configuration identity and never served once older than
//! [`CATALOG_TTL`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use mini_moka::sync::Cache;

use super::CanonicalCatalog;

/// Freshness window for cached catalogs
pub const CATALOG_TTL: Duration = Duration::from_millis(60_000);

/// Cached catalog with the time it was fetched
#[derive(Clone, Debug)]
pub struct CachedCatalog {
    pub fetched_at: DateTime<Utc>,
    pub catalog: CanonicalCatalog,
}

/// Process-wide catalog store keyed by configuration identity
///
/// Cloning is cheap and clones share entries. Writes overwrite; concurrent
/// misses for one identity may both fetch, the last write wins.
#[derive(Clone, Debug)]
pub struct CatalogCache {
    entries: Cache<String, CachedCatalog>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogCache {
    /// Create a cache with the standard 60 second TTL
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(CATALOG_TTL)
    }

    /// Create a cache with a custom TTL
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Cache::builder().time_to_live(ttl).build(),
        }
    }

    /// Look up a fresh catalog
    #[must_use]
    pub fn get(&self, config_id: &str) -> Option<CanonicalCatalog> {
        self.get_entry(config_id).map(|entry| entry.catalog)
    }

    /// Look up a fresh catalog together with its fetch time
    #[must_use]
    pub fn get_entry(&self, config_id: &str) -> Option<CachedCatalog> {
        self.entries.get(&config_id.to_string())
    }

    /// Store a catalog, replacing any previous entry
    pub fn put(&self, config_id: &str, catalog: CanonicalCatalog) {
        self.entries.insert(
            config_id.to_string(),
            CachedCatalog {
                fetched_at: Utc::now(),
                catalog,
            },
        );
    }
}
