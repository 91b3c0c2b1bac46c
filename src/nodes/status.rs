//! Node status badges

use std::fmt;

use serde::Serialize;

/// Badge colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFill {
    Red,
    Green,
    Yellow,
    Blue,
    Grey,
}

/// Badge shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusShape {
    /// Solid dot, used for activity and results
    Dot,
    /// Hollow ring, used for failures before a request was made
    Ring,
}

/// Status shown under a node in the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub fill: StatusFill,
    pub shape: StatusShape,
    pub text: String,
}

impl NodeStatus {
    /// Request in flight
    #[must_use]
    pub fn busy(text: impl Into<String>) -> Self {
        Self {
            fill: StatusFill::Blue,
            shape: StatusShape::Dot,
            text: text.into(),
        }
    }

    /// Request finished with the given HTTP status
    #[must_use]
    pub fn http_result(ok: bool, status: u16) -> Self {
        if ok {
            Self {
                fill: StatusFill::Green,
                shape: StatusShape::Dot,
                text: "ok".to_string(),
            }
        } else {
            Self {
                fill: StatusFill::Red,
                shape: StatusShape::Dot,
                text: format!("err {status}"),
            }
        }
    }

    /// Failure before or instead of a response
    #[must_use]
    pub fn failed(text: impl Into<String>) -> Self {
        Self {
            fill: StatusFill::Red,
            shape: StatusShape::Ring,
            text: text.into(),
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}: {}", self.fill, self.shape, self.text)
    }
}

/// Receiver of node status updates
///
/// Status is advisory and never part of a node's data contract.
pub trait StatusSink: Send + Sync {
    /// Publish a status for a node
    fn status(&self, node_id: &str, status: NodeStatus);
}

/// Status sink that logs through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingStatus;

impl StatusSink for TracingStatus {
    fn status(&self, node_id: &str, status: NodeStatus) {
        match status.fill {
            StatusFill::Red => tracing::warn!(node_id, status = %status.text, "node status"),
            _ => tracing::debug!(node_id, status = %status.text, "node status"),
        }
    }
}
