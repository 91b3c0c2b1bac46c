//! Catalog fetch handler: cache check, remote fetch on miss, normalize, store

use chrono::Utc;

use crate::client::RelayClient;
use crate::config::ConfigRegistry;
use crate::{Error, Result};

use super::{CanonicalCatalog, CatalogCache, normalize};

/// Serves normalized catalogs per configuration identity
#[derive(Debug, Clone)]
pub struct CatalogService {
    registry: ConfigRegistry,
    client: RelayClient,
    cache: CatalogCache,
}

impl CatalogService {
    /// Create a service over an injected cache
    #[must_use]
    pub const fn new(registry: ConfigRegistry, client: RelayClient, cache: CatalogCache) -> Self {
        Self {
            registry,
            client,
            cache,
        }
    }

    /// Shared cache
    #[must_use]
    pub const fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    /// Credentials registry
    #[must_use]
    pub const fn registry(&self) -> &ConfigRegistry {
        &self.registry
    }

    /// Catalog for a configuration identity
    ///
    /// Served from cache while fresh; otherwise fetched, normalized and
    /// stored before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity is unknown, the remote call fails or
    /// answers with a non-success status, or the body is not JSON
    pub async fn command_list(&self, config_id: &str) -> Result<CanonicalCatalog> {
        if let Some(entry) = self.cache.get_entry(config_id) {
            let age_ms = (Utc::now() - entry.fetched_at).num_milliseconds();
            tracing::debug!(config_id, age_ms, "catalog cache hit");
            return Ok(entry.catalog);
        }

        let credentials = self
            .registry
            .get(config_id)
            .ok_or_else(|| Error::Config("Invalid TRIGGERcmd config".to_string()))?;

        tracing::debug!(config_id, "catalog cache miss, fetching");
        let raw = self.client.list_commands(credentials.as_ref()).await?;
        let catalog = normalize(&raw);

        tracing::info!(
            config_id,
            computers = catalog.computers.len(),
            "refreshed command catalog"
        );

        self.cache.put(config_id, catalog.clone());
        Ok(catalog)
    }
}
