//! Command catalog
//!
//! The TRIGGERcmd list endpoint returns loosely shaped JSON: the command array
//! may be bare or wrapped in `commands`/`data`, and the computer and trigger
//! names appear under several spellings. [`normalize`] turns that into a
//! [`CanonicalCatalog`] for editor dropdowns.

pub mod cache;
pub mod service;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use cache::{CATALOG_TTL, CatalogCache};
pub use service::CatalogService;

/// Field names tried, in order, for the computer name
const COMPUTER_FIELDS: [&str; 3] = ["computer", "computerName", "Computer"];

/// Field names tried, in order, for the trigger name
const TRIGGER_FIELDS: [&str; 3] = ["trigger", "name", "Trigger"];

/// Normalized command catalog
///
/// Every key of `triggers_by_computer` appears exactly once in `computers`
/// and vice versa.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalCatalog {
    /// Computer names, unique, in first-seen order
    pub computers: Vec<String>,
    /// Trigger names per computer, in insertion order
    pub triggers_by_computer: IndexMap<String, Vec<String>>,
}

impl CanonicalCatalog {
    /// Whether no computers were found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.computers.is_empty()
    }

    /// Triggers registered for a computer
    #[must_use]
    pub fn triggers(&self, computer: &str) -> &[String] {
        self.triggers_by_computer
            .get(computer)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Locate the command array in a list response
///
/// Checks `commands`, then `data`, then a bare array. Any other shape has no
/// commands.
#[must_use]
pub fn command_items(raw: &Value) -> &[Value] {
    if let Some(items) = raw.get("commands").and_then(Value::as_array) {
        return items;
    }
    if let Some(items) = raw.get("data").and_then(Value::as_array) {
        return items;
    }
    raw.as_array().map(Vec::as_slice).unwrap_or_default()
}

/// Render a computer or trigger name
///
/// Non-empty strings are taken as-is and non-zero numbers are rendered.
/// Empty strings, zero, null, booleans and containers are not names.
#[must_use]
pub fn name_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f.abs() > 0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// First usable name among `fields`
fn first_name(entry: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .find_map(|field| entry.get(field).and_then(name_value))
}

/// Normalize a raw list response into a canonical catalog
///
/// Never fails. Entries without a computer name are skipped, entries without
/// a trigger name still register their computer, and duplicate trigger names
/// are kept.
#[must_use]
pub fn normalize(raw: &Value) -> CanonicalCatalog {
    let mut catalog = CanonicalCatalog::default();

    for entry in command_items(raw) {
        if !entry.is_object() {
            continue;
        }

        let Some(computer) = first_name(entry, &COMPUTER_FIELDS) else {
            continue;
        };

        let triggers = catalog
            .triggers_by_computer
            .entry(computer.clone())
            .or_insert_with(|| {
                catalog.computers.push(computer);
                Vec::new()
            });

        if let Some(trigger) = first_name(entry, &TRIGGER_FIELDS) {
            triggers.push(trigger);
        }
    }

    catalog
}
