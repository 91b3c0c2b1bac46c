//! Trigger node: runs a TRIGGERcmd trigger for every inbound message

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use super::{NodeRuntime, NodeStatus, message_name, with_payload};
use crate::client::{DispatchOutcome, TriggerRequest};
use crate::params::{ContextOwner, resolve_params};
use crate::{Error, Result};

/// Trigger node definition as stored in a flow
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerNodeConfig {
    /// Node identifier
    #[serde(default)]
    pub id: String,

    /// Identifier of the flow the node lives in
    #[serde(default, rename = "z")]
    pub flow_id: String,

    /// Configuration identity of the credentials to use
    #[serde(default)]
    pub config: Option<String>,

    /// Default computer, overridden by `msg.computer`
    #[serde(default)]
    pub computer: String,

    /// Default trigger, overridden by `msg.trigger`
    #[serde(default)]
    pub trigger: String,

    /// Static params value, or the spec of a typed reference
    #[serde(default)]
    pub params: Option<Value>,

    /// Type tag of `params`; unset for legacy nodes
    #[serde(default)]
    pub params_type: Option<String>,
}

/// Progress of a single dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPhase {
    Idle,
    ResolvingParams,
    Validating,
    Requesting,
    Completed { ok: bool },
    FailedValidation,
    FailedConfig,
}

impl fmt::Display for DispatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::ResolvingParams => f.write_str("resolving-params"),
            Self::Validating => f.write_str("validating"),
            Self::Requesting => f.write_str("requesting"),
            Self::Completed { ok: true } => f.write_str("completed(ok)"),
            Self::Completed { ok: false } => f.write_str("completed(error)"),
            Self::FailedValidation => f.write_str("failed(validation)"),
            Self::FailedConfig => f.write_str("failed(config)"),
        }
    }
}

/// Assemble a trigger request
///
/// Message-level `computer`/`trigger` win when present and non-empty;
/// numbers are rendered the way the catalog renders them. Absent, null,
/// empty or zero values fall back to the node defaults.
///
/// # Errors
///
/// Returns [`Error::Validation`] if either name is still empty
pub fn build_request(
    message: &Value,
    default_computer: &str,
    default_trigger: &str,
    params: Option<Value>,
) -> Result<TriggerRequest> {
    let computer =
        message_name(message, "computer").unwrap_or_else(|| default_computer.to_string());
    let trigger =
        message_name(message, "trigger").unwrap_or_else(|| default_trigger.to_string());

    if computer.is_empty() || trigger.is_empty() {
        return Err(Error::Validation("computer & trigger required".to_string()));
    }

    Ok(TriggerRequest {
        computer,
        trigger,
        params,
    })
}

/// Node that runs a trigger per inbound message
pub struct TriggerNode {
    config: TriggerNodeConfig,
    runtime: NodeRuntime,
}

impl TriggerNode {
    /// Create a trigger node
    #[must_use]
    pub const fn new(config: TriggerNodeConfig, runtime: NodeRuntime) -> Self {
        Self { config, runtime }
    }

    /// Node definition
    #[must_use]
    pub const fn config(&self) -> &TriggerNodeConfig {
        &self.config
    }

    fn enter(&self, phase: DispatchPhase) {
        tracing::debug!(node_id = %self.config.id, %phase, "dispatch phase");
    }

    /// Handle an inbound message
    ///
    /// Returns the outgoing message: the inbound one with `payload` replaced
    /// by the [`DispatchOutcome`]. A single attempt is made.
    ///
    /// # Errors
    ///
    /// Returns an error if no credentials are attached, params evaluation
    /// fails, `computer`/`trigger` are missing, or the request cannot be sent
    pub async fn on_input(&self, message: Value) -> Result<Value> {
        match self.dispatch(&message).await {
            Ok(outcome) => Ok(with_payload(message, serde_json::to_value(outcome)?)),
            Err(e) => {
                tracing::warn!(node_id = %self.config.id, error = %e, kind = e.kind(), "trigger failed");
                self.runtime
                    .status
                    .status(&self.config.id, NodeStatus::failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Resolve, validate and send the trigger request for a message
    ///
    /// # Errors
    ///
    /// See [`TriggerNode::on_input`]
    pub async fn dispatch(&self, message: &Value) -> Result<DispatchOutcome> {
        let node_id = self.config.id.as_str();
        self.enter(DispatchPhase::Idle);

        let credentials = self
            .runtime
            .credentials(node_id, self.config.config.as_deref())
            .inspect_err(|_| self.enter(DispatchPhase::FailedConfig))?;

        self.enter(DispatchPhase::ResolvingParams);
        let owner = ContextOwner::new(&self.config.id, &self.config.flow_id);
        let params = resolve_params(
            self.config.params.as_ref(),
            self.config.params_type.as_deref(),
            message,
            &owner,
            self.runtime.evaluator.as_ref(),
        )
        .await?;

        self.enter(DispatchPhase::Validating);
        let request = build_request(message, &self.config.computer, &self.config.trigger, params)
            .inspect_err(|_| self.enter(DispatchPhase::FailedValidation))?;

        self.enter(DispatchPhase::Requesting);
        self.runtime
            .status
            .status(node_id, NodeStatus::busy("triggering..."));

        let outcome = self
            .runtime
            .client
            .trigger(credentials.as_ref(), &request)
            .await?;

        self.enter(DispatchPhase::Completed { ok: outcome.ok });
        tracing::info!(
            node_id,
            computer = %request.computer,
            trigger = %request.trigger,
            status = outcome.status,
            "trigger dispatched"
        );
        self.runtime.status.status(
            node_id,
            NodeStatus::http_result(outcome.ok, outcome.status),
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn message_overrides_node_defaults() {
        let request = build_request(&json!({"computer": "C"}), "A", "B", None).unwrap();
        assert_eq!(request.computer, "C");
        assert_eq!(request.trigger, "B");
    }

    #[test]
    fn empty_message_values_fall_back() {
        let request = build_request(&json!({"computer": "", "trigger": null}), "A", "B", None).unwrap();
        assert_eq!((request.computer.as_str(), request.trigger.as_str()), ("A", "B"));
    }

    #[test]
    fn missing_names_fail_validation() {
        let err = build_request(&json!({}), "", "B", None).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(err.to_string(), "computer & trigger required");

        assert!(build_request(&json!({"computer": "A"}), "", "", None).is_err());
    }

    #[test]
    fn message_trigger_overrides_node_default() {
        let request = build_request(&json!({"trigger": "T"}), "A", "B", None).unwrap();
        assert_eq!((request.computer.as_str(), request.trigger.as_str()), ("A", "T"));
    }

    #[test]
    fn numeric_overrides_are_rendered() {
        let request =
            build_request(&json!({"computer": 7, "trigger": "go"}), "A", "B", None).unwrap();
        assert_eq!(request.computer, "7");
        assert_eq!(request.trigger, "go");

        let request = build_request(&json!({"trigger": 2.5}), "A", "B", None).unwrap();
        assert_eq!(request.trigger, "2.5");
    }

    #[test]
    fn unusable_trigger_overrides_fall_back() {
        for trigger in [json!(""), json!(null), json!(0), json!(false), json!(["x"]), json!({})] {
            let request = build_request(&json!({"trigger": trigger.clone()}), "A", "B", None).unwrap();
            assert_eq!(request.trigger, "B", "override {trigger} should fall back");
        }
    }

    #[test]
    fn params_pass_through() {
        let request = build_request(&json!({}), "A", "B", Some(json!([1, 2]))).unwrap();
        assert_eq!(request.params, Some(json!([1, 2])));
    }

    #[test]
    fn node_config_from_flow_json() {
        let config: TriggerNodeConfig = serde_json::from_value(json!({
            "id": "n1",
            "z": "flow1",
            "type": "triggercmd out",
            "config": "home",
            "computer": "pc",
            "trigger": "calc",
            "params": "payload",
            "paramsType": "msg"
        }))
        .unwrap();

        assert_eq!(config.flow_id, "flow1");
        assert_eq!(config.config.as_deref(), Some("home"));
        assert_eq!(config.params_type.as_deref(), Some("msg"));
    }

    #[test]
    fn phase_names() {
        assert_eq!(DispatchPhase::ResolvingParams.to_string(), "resolving-params");
        assert_eq!(DispatchPhase::Completed { ok: false }.to_string(), "completed(error)");
        assert_eq!(DispatchPhase::FailedConfig.to_string(), "failed(config)");
    }
}
