//! Shared test utilities

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::Value;
use triggercmd_gateway::nodes::{NodeStatus, StatusSink};
use triggercmd_gateway::{ConfigRegistry, RelayConfig};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_TOKEN: &str = "test-token";
pub const TEST_CONFIG_ID: &str = "home";

/// Registry with a single configuration pointing at a mock server
#[must_use]
pub fn registry_for(server: &MockServer) -> ConfigRegistry {
    let relay = RelayConfig::new(
        TEST_CONFIG_ID,
        Some(server.uri()),
        Some(TEST_TOKEN.to_string()),
    );
    ConfigRegistry::from_relays(&[relay])
}

/// Mount a command list response, expected `times` times
pub async fn mount_list(server: &MockServer, body: Value, times: u64) {
    Mock::given(method("POST"))
        .and(path("/api/command/list"))
        .and(header("authorization", format!("Bearer {TEST_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

/// Mount a trigger response, expected `times` times
pub async fn mount_trigger(server: &MockServer, response: ResponseTemplate, times: u64) {
    Mock::given(method("POST"))
        .and(path("/api/run/trigger"))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

/// Sample raw command list with mixed field spellings
#[must_use]
pub fn sample_list() -> Value {
    serde_json::json!({
        "commands": [
            {"computer": "PC1", "trigger": "A"},
            {"computerName": "PC2", "name": "B"},
            {"Computer": "PC1", "Trigger": "C"},
            {"computer": "PC3"}
        ]
    })
}

/// Status sink that records every published status
#[derive(Default)]
pub struct RecordingStatus {
    seen: Mutex<Vec<(String, NodeStatus)>>,
}

impl RecordingStatus {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Status texts in publication order
    pub fn texts(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|(_, s)| s.text.clone())
            .collect()
    }

    /// Most recent status
    pub fn last(&self) -> Option<NodeStatus> {
        self.seen.lock().unwrap().last().map(|(_, s)| s.clone())
    }
}

impl StatusSink for RecordingStatus {
    fn status(&self, node_id: &str, status: NodeStatus) {
        self.seen
            .lock()
            .unwrap()
            .push((node_id.to_string(), status));
    }
}
