//! HTTP admin API for the TRIGGERcmd gateway

mod auth;
pub mod health;
pub mod triggercmd;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::catalog::{CatalogCache, CatalogService};
use crate::client::RelayClient;
use crate::config::{ConfigRegistry, DEFAULT_API_PORT};

/// Shared state for API handlers
#[derive(Debug, Clone)]
pub struct ApiState {
    pub catalog: CatalogService,
    pub client: RelayClient,
    pub api_key: Option<String>,
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    registry: ConfigRegistry,
    port: u16,
    api_key: Option<String>,
    client: Option<RelayClient>,
    cache: Option<CatalogCache>,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub fn new(registry: ConfigRegistry) -> Self {
        Self {
            registry,
            port: DEFAULT_API_PORT,
            api_key: None,
            client: None,
            cache: None,
        }
    }

    /// Set the port to listen on
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the API key for admin endpoints
    #[must_use]
    pub fn api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    /// Use an existing remote client
    #[must_use]
    pub fn client(mut self, client: RelayClient) -> Self {
        self.client = Some(client);
        self
    }

    /// Share a catalog cache with other components
    #[must_use]
    pub fn cache(mut self, cache: CatalogCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        let client = self.client.unwrap_or_default();
        let cache = self.cache.unwrap_or_default();

        if self.registry.is_empty() {
            tracing::warn!("no TRIGGERcmd credentials configured, command lists will fail");
        }

        let state = Arc::new(ApiState {
            catalog: CatalogService::new(self.registry, client.clone(), cache),
            client,
            api_key: self.api_key,
        });

        ApiServer {
            state,
            port: self.port,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Shared handler state
    #[must_use]
    pub fn state(&self) -> Arc<ApiState> {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let router = Router::new()
            .nest("/triggercmd", triggercmd::router(self.state.clone()))
            .merge(health::router())
            .merge(health::ready_router(self.state.clone()));

        // CORS layer for the flow editor running on another origin
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        if self.state.api_key.is_none() {
            tracing::warn!("API key not configured - admin routes are unauthenticated");
        }

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
