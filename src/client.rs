//! TRIGGERcmd remote API client
//!
//! Issues the two outbound calls the gateway makes (command list, trigger run)
//! against the API root of a [`RelayCredentials`] value, plus the credential
//! probe used by setup screens.

use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::command_items;
use crate::config::{RelayConfig, RelayCredentials};
use crate::{Error, Result};

/// Path of the command list endpoint
pub const LIST_PATH: &str = "/api/command/list";

/// Path of the trigger endpoint
pub const TRIGGER_PATH: &str = "/api/run/trigger";

/// Body of a trigger run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRequest {
    /// Computer name as registered with TRIGGERcmd
    pub computer: String,
    /// Trigger name on that computer
    pub trigger: String,
    /// Trigger parameters, omitted when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Uniform result of a trigger run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    /// HTTP status was in the success range
    pub ok: bool,
    /// HTTP status code
    pub status: u16,
    /// Parsed response body, or `{}` when the body was not JSON
    pub data: Value,
}

/// Raw list response, status and body kept as received
#[derive(Debug, Clone)]
pub struct ListResponse {
    /// HTTP status was in the success range
    pub ok: bool,
    /// HTTP status code
    pub status: u16,
    /// Parsed response body, or `{}` when the body was not JSON
    pub body: Value,
}

/// Result of a credential probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    /// HTTP status was in the success range
    pub ok: bool,
    /// HTTP status code
    pub status: u16,
    /// Number of commands in the list response
    pub sample: usize,
}

/// Client for the TRIGGERcmd API
#[derive(Debug, Clone, Default)]
pub struct RelayClient {
    client: Client,
}

impl RelayClient {
    /// Create a client with a default HTTP connection pool
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client over an existing HTTP client
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Build a POST to `path` under the credentials' API root
    fn post(&self, credentials: &dyn RelayCredentials, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", credentials.base_url().trim_end_matches('/'));

        let mut req = self.client.post(&url);
        for (name, value) in credentials.headers() {
            req = req.header(name, value);
        }
        req
    }

    /// Fetch the command list, failing on a non-success status or a
    /// non-JSON body
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the remote answers with a
    /// non-success status, or the body is not JSON
    pub async fn list_commands(&self, credentials: &dyn RelayCredentials) -> Result<Value> {
        let response = self
            .post(credentials, LIST_PATH)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "command list failed");
            return Err(Error::Remote {
                status: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }

    /// Fetch the command list, keeping whatever status and body came back
    ///
    /// # Errors
    ///
    /// Returns an error only if the request could not be sent
    pub async fn fetch_command_list(
        &self,
        credentials: &dyn RelayCredentials,
    ) -> Result<ListResponse> {
        let response = self
            .post(credentials, LIST_PATH)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let status = response.status();
        let body = read_json_lenient(response).await;

        Ok(ListResponse {
            ok: status.is_success(),
            status: status.as_u16(),
            body,
        })
    }

    /// Run a trigger
    ///
    /// Non-success statuses are reported in the outcome, not as errors.
    ///
    /// # Errors
    ///
    /// Returns an error only if the request could not be sent
    pub async fn trigger(
        &self,
        credentials: &dyn RelayCredentials,
        request: &TriggerRequest,
    ) -> Result<DispatchOutcome> {
        let response = self
            .post(credentials, TRIGGER_PATH)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let data = read_json_lenient(response).await;

        Ok(DispatchOutcome {
            ok: status.is_success(),
            status: status.as_u16(),
            data,
        })
    }

    /// Check a token by listing commands with explicitly supplied credentials
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingToken`] without any network call when `token`
    /// is absent or empty, or an error if the request could not be sent
    pub async fn probe(&self, base_url: Option<&str>, token: Option<&str>) -> Result<ProbeReport> {
        let token = token.filter(|t| !t.is_empty()).ok_or(Error::MissingToken)?;

        let credentials = RelayConfig::new(
            "probe",
            base_url.map(ToString::to_string),
            Some(token.to_string()),
        );
        let response = self.fetch_command_list(&credentials).await?;

        tracing::debug!(
            base_url = %credentials.base_url(),
            status = response.status,
            "probe completed"
        );

        Ok(ProbeReport {
            ok: response.ok,
            status: response.status,
            sample: command_items(&response.body).len(),
        })
    }
}

/// Read a response body as JSON, substituting `{}` on any failure
async fn read_json_lenient(response: Response) -> Value {
    match response.bytes().await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "response body is not JSON, using empty object");
            Value::Object(serde_json::Map::new())
        }),
        Err(e) => {
            tracing::debug!(error = %e, "failed to read response body, using empty object");
            Value::Object(serde_json::Map::new())
        }
    }
}
