//! `ResourceInfo`: what a plugin publishes so the lifecycle manager can
//! report and verify release of resources it holds.

use serde::Serialize;
use serde_json::{Map, Value};
use std::time::SystemTime;

/// A single resource a plugin has acquired (a connection, a file handle, a
/// background task, ...).
#[derive(Debug, Clone, Serialize)]
pub struct ResourceInfo {
    /// Category of resource, e.g. `"connection"`, `"file"`, `"task"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Identifier unique within the plugin.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// When the resource was acquired.
    pub acquired_at: SystemTime,
    /// Size in bytes, if meaningful for this resource kind.
    pub size: Option<u64>,
    /// Additional plugin-defined metadata.
    pub metadata: Option<Map<String, Value>>,
}

impl ResourceInfo {
    /// Build a minimal resource record.
    pub fn new(kind: impl Into<String>, id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            description: description.into(),
            acquired_at: SystemTime::now(),
            size: None,
            metadata: None,
        }
    }
}
