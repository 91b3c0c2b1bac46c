//! TRIGGERcmd Gateway - Flow adapter for the TRIGGERcmd remote-command service
//!
//! This library provides the core functionality for the gateway:
//! - Command catalog normalization and per-configuration caching
//! - Trigger and list flow nodes with status signalling
//! - Typed parameter resolution against message, flow and global context
//! - Admin HTTP endpoints for the flow editor
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Interfaces                       │
//! │   Flow nodes   │   Admin HTTP API   │      CLI      │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                TRIGGERcmd Gateway                   │
//! │  Params  │  Catalog (normalize + cache)  │  Config  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              TRIGGERcmd remote API                  │
//! │      /api/command/list   │   /api/run/trigger       │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod nodes;
pub mod params;

pub use api::{ApiServer, ApiServerBuilder, ApiState};
pub use catalog::{CanonicalCatalog, CatalogCache, CatalogService, normalize};
pub use client::{DispatchOutcome, ProbeReport, RelayClient, TriggerRequest};
pub use config::{Config, ConfigRegistry, RelayConfig, RelayCredentials};
pub use error::{Error, Result};
pub use nodes::{
    ListNode, ListNodeConfig, NodeRuntime, NodeStatus, StatusSink, TriggerNode, TriggerNodeConfig,
};
pub use params::{
    ContextEvaluator, ContextStore, PropertyEvaluator, PropertyType, resolve_params,
};
