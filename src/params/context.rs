//! Flow and global context storage, and property path lookup

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::{Error, Result};

/// One step of a property path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object key
    Key(String),
    /// Array index
    Index(usize),
}

/// Parse a property path like `payload.items[0]["display name"]`
///
/// # Errors
///
/// Returns an error for empty paths, empty segments, or unbalanced brackets
pub fn parse_path(path: &str) -> Result<Vec<PathSegment>> {
    let malformed = || Error::Evaluation(format!("invalid property expression: {path}"));

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.trim().chars();
    let mut after_bracket = false;

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if current.is_empty() && !after_bracket {
                    return Err(malformed());
                }
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }
                after_bracket = false;
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }
                let mut inner = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    inner.push(c);
                }
                if !closed {
                    return Err(malformed());
                }
                segments.push(bracket_segment(inner.trim()).ok_or_else(malformed)?);
                after_bracket = true;
            }
            _ => {
                if after_bracket {
                    return Err(malformed());
                }
                current.push(c);
            }
        }
    }

    if !current.is_empty() {
        segments.push(PathSegment::Key(current));
    } else if !after_bracket {
        return Err(malformed());
    }

    Ok(segments)
}

/// Interpret the contents of `[...]`
fn bracket_segment(inner: &str) -> Option<PathSegment> {
    let quoted = inner
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| inner.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')));

    match quoted {
        Some(key) => Some(PathSegment::Key(key.to_string())),
        None => inner.parse().ok().map(PathSegment::Index),
    }
}

/// Follow a parsed path into a value
#[must_use]
pub fn lookup_path<'a>(root: &'a Value, segments: &[PathSegment]) -> Option<&'a Value> {
    segments.iter().try_fold(root, |value, segment| match segment {
        PathSegment::Key(key) => value.get(key.as_str()),
        PathSegment::Index(index) => value.get(*index),
    })
}

/// Flow-scoped and global key/value context
///
/// Cloning is cheap and clones share state.
#[derive(Debug, Clone, Default)]
pub struct ContextStore {
    flows: Arc<RwLock<HashMap<String, Map<String, Value>>>>,
    global: Arc<RwLock<Map<String, Value>>>,
}

impl ContextStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a top-level key in a flow's context
    pub async fn set_flow(&self, flow_id: &str, key: &str, value: Value) {
        self.flows
            .write()
            .await
            .entry(flow_id.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Set a top-level key in the global context
    pub async fn set_global(&self, key: &str, value: Value) {
        self.global.write().await.insert(key.to_string(), value);
    }

    /// Read a path from a flow's context
    pub async fn get_flow(&self, flow_id: &str, segments: &[PathSegment]) -> Option<Value> {
        let flows = self.flows.read().await;
        lookup_in(flows.get(flow_id)?, segments)
    }

    /// Read a path from the global context
    pub async fn get_global(&self, segments: &[PathSegment]) -> Option<Value> {
        lookup_in(&*self.global.read().await, segments)
    }
}

/// Follow a path whose first segment is a top-level context key
fn lookup_in(context: &Map<String, Value>, segments: &[PathSegment]) -> Option<Value> {
    let (PathSegment::Key(key), rest) = segments.split_first()? else {
        return None;
    };
    lookup_path(context.get(key)?, rest).cloned()
}
