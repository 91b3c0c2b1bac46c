//! Trigger parameter resolution
//!
//! A trigger node either carries a static `params` value (legacy nodes, where
//! an inbound `msg.params` takes precedence) or a typed reference such as
//! `msg.payload.args` or `flow.lastScene`. Typed references are evaluated by
//! the host's [`PropertyEvaluator`].

mod context;
mod evaluator;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

pub use context::{ContextStore, PathSegment, lookup_path, parse_path};
pub use evaluator::ContextEvaluator;

use crate::Result;

/// Type tag of a typed property
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyType {
    /// Literal string
    Str,
    /// Number literal
    Num,
    /// Boolean literal
    Bool,
    /// JSON literal
    Json,
    /// Byte buffer literal
    Bin,
    /// Regular expression literal
    Re,
    /// Current timestamp
    Date,
    /// Path into the inbound message
    Msg,
    /// Path into flow context
    Flow,
    /// Path into global context
    Global,
    /// Environment variable
    Env,
    /// `JSONata` expression
    Jsonata,
    /// Any other host-specific tag
    Other(String),
}

impl PropertyType {
    /// Parse a type tag such as `"msg"` or `"str"`
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "str" => Self::Str,
            "num" => Self::Num,
            "bool" => Self::Bool,
            "json" => Self::Json,
            "bin" => Self::Bin,
            "re" => Self::Re,
            "date" => Self::Date,
            "msg" => Self::Msg,
            "flow" => Self::Flow,
            "global" => Self::Global,
            "env" => Self::Env,
            "jsonata" => Self::Jsonata,
            other => Self::Other(other.to_string()),
        }
    }

    /// Tag string
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Str => "str",
            Self::Num => "num",
            Self::Bool => "bool",
            Self::Json => "json",
            Self::Bin => "bin",
            Self::Re => "re",
            Self::Date => "date",
            Self::Msg => "msg",
            Self::Flow => "flow",
            Self::Global => "global",
            Self::Env => "env",
            Self::Jsonata => "jsonata",
            Self::Other(tag) => tag,
        }
    }

    /// Type the evaluator is asked for
    ///
    /// Regular expressions are not meaningful trigger parameters and are
    /// evaluated as plain strings.
    #[must_use]
    pub fn for_params(self) -> Self {
        match self {
            Self::Re => Self::Str,
            other => other,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node on whose behalf a property is evaluated, for context lookups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextOwner {
    /// Node identifier
    pub node_id: String,
    /// Identifier of the flow the node lives in
    pub flow_id: String,
}

impl ContextOwner {
    /// Create an owner
    #[must_use]
    pub fn new(node_id: impl Into<String>, flow_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            flow_id: flow_id.into(),
        }
    }
}

/// Host facility evaluating typed properties
#[async_trait]
pub trait PropertyEvaluator: Send + Sync {
    /// Evaluate `spec` as a property of type `kind`
    ///
    /// # Errors
    ///
    /// Returns an error if the reference cannot be resolved or the literal is
    /// malformed
    async fn evaluate(
        &self,
        spec: &str,
        kind: &PropertyType,
        owner: &ContextOwner,
        message: &Value,
    ) -> Result<Value>;
}

/// Render a configured static value as a property spec string
fn spec_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Compute the `params` value of a trigger request
///
/// With no `params_type`, the inbound message's `params` wins when present
/// and not null, else the static value is used. With a `params_type`, the
/// static value is evaluated through `evaluator`.
///
/// # Errors
///
/// Evaluation errors are returned unchanged
pub async fn resolve_params(
    spec: Option<&Value>,
    params_type: Option<&str>,
    message: &Value,
    owner: &ContextOwner,
    evaluator: &dyn PropertyEvaluator,
) -> Result<Option<Value>> {
    let Some(tag) = params_type.filter(|t| !t.is_empty()) else {
        let from_message = message.get("params").filter(|v| !v.is_null());
        return Ok(from_message.or(spec).cloned());
    };

    let kind = PropertyType::from_tag(tag).for_params();
    let value = evaluator
        .evaluate(&spec_string(spec), &kind, owner, message)
        .await?;

    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::Error;

    /// Records the arguments it was called with
    #[derive(Default)]
    struct RecordingEvaluator {
        calls: Mutex<Vec<(String, PropertyType)>>,
    }

    #[async_trait]
    impl PropertyEvaluator for RecordingEvaluator {
        async fn evaluate(
            &self,
            spec: &str,
            kind: &PropertyType,
            _owner: &ContextOwner,
            _message: &Value,
        ) -> Result<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((spec.to_string(), kind.clone()));
            Ok(json!("evaluated"))
        }
    }

    struct FailingEvaluator;

    #[async_trait]
    impl PropertyEvaluator for FailingEvaluator {
        async fn evaluate(
            &self,
            spec: &str,
            _kind: &PropertyType,
            _owner: &ContextOwner,
            _message: &Value,
        ) -> Result<Value> {
            Err(Error::Evaluation(format!("msg.{spec} is not defined")))
        }
    }

    #[test]
    fn type_tags_round_trip() {
        for tag in ["str", "num", "bool", "json", "bin", "re", "date", "msg", "flow", "global", "env", "jsonata", "cred"] {
            assert_eq!(PropertyType::from_tag(tag).as_str(), tag);
        }
        assert_eq!(PropertyType::Re.for_params(), PropertyType::Str);
        assert_eq!(PropertyType::Msg.for_params(), PropertyType::Msg);
    }

    #[tokio::test]
    async fn legacy_prefers_message_params() {
        let evaluator = RecordingEvaluator::default();
        let owner = ContextOwner::default();
        let spec = json!("static");

        let resolved = resolve_params(Some(&spec), None, &json!({"params": "dynamic"}), &owner, &evaluator)
            .await
            .unwrap();
        assert_eq!(resolved, Some(json!("dynamic")));

        // falsy but present values still win
        let resolved = resolve_params(Some(&spec), None, &json!({"params": ""}), &owner, &evaluator)
            .await
            .unwrap();
        assert_eq!(resolved, Some(json!("")));

        assert!(evaluator.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn legacy_falls_back_to_static_value() {
        let evaluator = RecordingEvaluator::default();
        let owner = ContextOwner::default();
        let spec = json!({"level": 3});

        let resolved = resolve_params(Some(&spec), Some(""), &json!({"params": null}), &owner, &evaluator)
            .await
            .unwrap();
        assert_eq!(resolved, Some(json!({"level": 3})));

        let resolved = resolve_params(None, None, &json!({}), &owner, &evaluator)
            .await
            .unwrap();
        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn typed_delegates_to_evaluator() {
        let evaluator = RecordingEvaluator::default();
        let owner = ContextOwner::default();
        let spec = json!("payload.args");

        let resolved = resolve_params(Some(&spec), Some("msg"), &json!({"params": "ignored"}), &owner, &evaluator)
            .await
            .unwrap();

        assert_eq!(resolved, Some(json!("evaluated")));
        assert_eq!(
            evaluator.calls.lock().unwrap().as_slice(),
            &[("payload.args".to_string(), PropertyType::Msg)]
        );
    }

    #[tokio::test]
    async fn regex_type_is_evaluated_as_string() {
        let evaluator = RecordingEvaluator::default();
        let spec = json!("^on$");

        resolve_params(Some(&spec), Some("re"), &json!({}), &ContextOwner::default(), &evaluator)
            .await
            .unwrap();

        assert_eq!(evaluator.calls.lock().unwrap()[0].1, PropertyType::Str);
    }

    #[tokio::test]
    async fn non_string_spec_is_rendered_as_json() {
        let evaluator = RecordingEvaluator::default();
        let spec = json!({"a": 1});

        resolve_params(Some(&spec), Some("json"), &json!({}), &ContextOwner::default(), &evaluator)
            .await
            .unwrap();

        assert_eq!(evaluator.calls.lock().unwrap()[0].0, r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn evaluation_errors_propagate() {
        let spec = json!("missing");
        let err = resolve_params(Some(&spec), Some("msg"), &json!({}), &ContextOwner::default(), &FailingEvaluator)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Evaluation(_)));
        assert_eq!(err.to_string(), "msg.missing is not defined");
    }
}
