//! Resource usage aggregation.

use proxy_core::ResourceInfo;
use serde::Serialize;

/// A synthetic resource entry representing the plugin instance itself,
/// alongside whatever the plugin declares via `get_resources()`.
#[derive(Debug, Clone, Serialize)]
pub struct PluginResourceUsage {
    /// Plugin name.
    pub plugin_name: String,
    /// Resources declared by the plugin, plus a synthetic `"plugin"` entry.
    pub resources: Vec<ResourceInfo>,
    /// Whether this plugin's disposal leaked (see `PluginEntry::is_leaked`).
    pub leaked: bool,
}
