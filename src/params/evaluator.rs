//! Built-in property evaluator backed by a [`ContextStore`]

use async_trait::async_trait;
use serde_json::{Number, Value};

use super::context::{ContextStore, lookup_path, parse_path};
use super::{ContextOwner, PropertyEvaluator, PropertyType};
use crate::{Error, Result};

/// Evaluates typed properties against the message, a [`ContextStore`] and the
/// process environment
#[derive(Debug, Clone, Default)]
pub struct ContextEvaluator {
    context: ContextStore,
}

impl ContextEvaluator {
    /// Create an evaluator over a context store
    #[must_use]
    pub const fn new(context: ContextStore) -> Self {
        Self { context }
    }

    /// Context store used for `flow` and `global` lookups
    #[must_use]
    pub const fn context(&self) -> &ContextStore {
        &self.context
    }
}

fn parse_number(spec: &str) -> Result<Value> {
    let trimmed = spec.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Ok(Value::from(int));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| Error::Evaluation(format!("invalid number: {spec}")))
}

fn parse_bin(spec: &str) -> Result<Value> {
    let invalid = || Error::Evaluation(format!("invalid binary value: {spec}"));

    let items: Vec<Value> = serde_json::from_str(spec).map_err(|_| invalid())?;
    let bytes = items
        .iter()
        .map(|v| v.as_u64().filter(|b| *b <= 255).map(Value::from))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(invalid)?;

    Ok(Value::Array(bytes))
}

#[async_trait]
impl PropertyEvaluator for ContextEvaluator {
    async fn evaluate(
        &self,
        spec: &str,
        kind: &PropertyType,
        owner: &ContextOwner,
        message: &Value,
    ) -> Result<Value> {
        match kind {
            PropertyType::Str | PropertyType::Re => Ok(Value::String(spec.to_string())),
            PropertyType::Num => parse_number(spec),
            PropertyType::Bool => Ok(Value::Bool(spec.trim().eq_ignore_ascii_case("true"))),
            PropertyType::Json => serde_json::from_str(spec)
                .map_err(|e| Error::Evaluation(format!("invalid JSON property: {e}"))),
            PropertyType::Bin => parse_bin(spec),
            PropertyType::Date => Ok(Value::from(chrono::Utc::now().timestamp_millis())),
            PropertyType::Env => Ok(std::env::var(spec.trim()).map_or(Value::Null, Value::String)),
            PropertyType::Msg => {
                let path = spec.trim();
                let path = path.strip_prefix("msg.").unwrap_or(path);
                let segments = parse_path(path)?;
                lookup_path(message, &segments)
                    .cloned()
                    .ok_or_else(|| Error::Evaluation(format!("msg.{path} is not defined")))
            }
            PropertyType::Flow => {
                let segments = parse_path(spec)?;
                self.context
                    .get_flow(&owner.flow_id, &segments)
                    .await
                    .ok_or_else(|| Error::Evaluation(format!("flow.{} is not defined", spec.trim())))
            }
            PropertyType::Global => {
                let segments = parse_path(spec)?;
                self.context
                    .get_global(&segments)
                    .await
                    .ok_or_else(|| {
                        Error::Evaluation(format!("global.{} is not defined", spec.trim()))
                    })
            }
            PropertyType::Jsonata | PropertyType::Other(_) => Err(Error::Evaluation(format!(
                "unsupported property type: {kind}"
            ))),
        }
    }
}
