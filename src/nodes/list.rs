//! List node: emits the raw command list for every inbound message

use serde::Deserialize;
use serde_json::Value;

use super::{NodeRuntime, NodeStatus, with_payload};
use crate::Result;

/// List node definition as stored in a flow
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListNodeConfig {
    /// Node identifier
    #[serde(default)]
    pub id: String,

    /// Configuration identity of the credentials to use
    #[serde(default)]
    pub config: Option<String>,
}

/// Node that fetches the command list per inbound message
pub struct ListNode {
    config: ListNodeConfig,
    runtime: NodeRuntime,
}

impl ListNode {
    /// Create a list node
    #[must_use]
    pub const fn new(config: ListNodeConfig, runtime: NodeRuntime) -> Self {
        Self { config, runtime }
    }

    /// Handle an inbound message
    ///
    /// The outgoing message carries the list response body as `payload`,
    /// `{}` when the body was not JSON. A non-success status is shown on the
    /// badge but is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if no credentials are attached or the request cannot
    /// be sent
    pub async fn on_input(&self, message: Value) -> Result<Value> {
        let node_id = self.config.id.as_str();

        let result = async {
            let credentials = self
                .runtime
                .credentials(node_id, self.config.config.as_deref())?;

            self.runtime
                .status
                .status(node_id, NodeStatus::busy("listing..."));

            self.runtime
                .client
                .fetch_command_list(credentials.as_ref())
                .await
        }
        .await;

        match result {
            Ok(response) => {
                self.runtime.status.status(
                    node_id,
                    NodeStatus::http_result(response.ok, response.status),
                );
                Ok(with_payload(message, response.body))
            }
            Err(e) => {
                tracing::warn!(node_id, error = %e, "command list failed");
                self.runtime
                    .status
                    .status(node_id, NodeStatus::failed(e.to_string()));
                Err(e)
            }
        }
    }
}
