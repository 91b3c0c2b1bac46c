//! Flow nodes
//!
//! - [`TriggerNode`]: runs a trigger for every inbound message
//! - [`ListNode`]: emits the raw command list for every inbound message
//!
//! Nodes share a [`NodeRuntime`] holding the host collaborators: the
//! credentials registry, the remote client, the property evaluator and the
//! status sink.

mod list;
mod status;
mod trigger;

use std::sync::Arc;

use serde_json::{Map, Value};

pub use list::{ListNode, ListNodeConfig};
pub use status::{NodeStatus, StatusFill, StatusShape, StatusSink, TracingStatus};
pub use trigger::{DispatchPhase, TriggerNode, TriggerNodeConfig, build_request};

use crate::catalog::name_value;
use crate::client::RelayClient;
use crate::config::{ConfigRegistry, RelayCredentials};
use crate::params::{ContextEvaluator, PropertyEvaluator};
use crate::{Error, Result};

/// Host collaborators shared by all nodes
#[derive(Clone)]
pub struct NodeRuntime {
    pub registry: ConfigRegistry,
    pub client: RelayClient,
    pub evaluator: Arc<dyn PropertyEvaluator>,
    pub status: Arc<dyn StatusSink>,
}

impl NodeRuntime {
    /// Runtime with the built-in evaluator and a tracing status sink
    #[must_use]
    pub fn new(registry: ConfigRegistry, client: RelayClient) -> Self {
        Self {
            registry,
            client,
            evaluator: Arc::new(ContextEvaluator::default()),
            status: Arc::new(TracingStatus),
        }
    }

    /// Replace the property evaluator
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Arc<dyn PropertyEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Replace the status sink
    #[must_use]
    pub fn with_status(mut self, status: Arc<dyn StatusSink>) -> Self {
        self.status = status;
        self
    }

    /// Credentials attached to a node
    ///
    /// Shows a `no credentials` badge when none are usable.
    fn credentials(
        &self,
        node_id: &str,
        config_id: Option<&str>,
    ) -> Result<Arc<dyn RelayCredentials>> {
        if let Some(credentials) = config_id.and_then(|id| self.registry.get(id)) {
            return Ok(credentials);
        }

        tracing::warn!(node_id, config_id, "node has no usable credentials");
        self.status
            .status(node_id, NodeStatus::failed("no credentials"));
        Err(Error::Config("TRIGGERcmd config not set".to_string()))
    }
}

/// Name-valued field of the inbound message, rendered like catalog names
fn message_name(message: &Value, key: &str) -> Option<String> {
    message.get(key).and_then(name_value)
}

/// Replace the message's `payload`
///
/// A non-object message is wrapped in a fresh object.
fn with_payload(message: Value, payload: Value) -> Value {
    let mut object = match message {
        Value::Object(object) => object,
        _ => Map::new(),
    };
    object.insert("payload".to_string(), payload);
    Value::Object(object)
}
