//! Records every completed call for later inspection.

use std::time::SystemTime;

use async_trait::async_trait;
use plugin_registry::{HookOutcome, Plugin};
use proxy_core::{ProxyError, ToolCallContext, ToolCallResult};
use tokio::sync::RwLock;

/// One recorded call.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    /// The call's request id.
    pub request_id: String,
    /// Name of the tool called.
    pub tool_name: String,
    /// Wall-clock time the entry was recorded.
    pub timestamp: SystemTime,
    /// How long the call took.
    pub duration_ms: u64,
    /// Whether the call resulted in an error.
    pub is_error: bool,
}

/// Appends an [`AuditEntry`] for every completed call. Entries are
/// retrievable via `entries()`; nothing is ever logged out-of-process.
#[derive(Default)]
pub struct AuditPlugin {
    entries: RwLock<Vec<AuditEntry>>,
}

impl AuditPlugin {
    /// An empty audit log.
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of every entry recorded so far.
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    /// Discard all recorded entries.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait]
impl Plugin for AuditPlugin {
    fn name(&self) -> &str {
        "audit"
    }

    fn version(&self) -> &str {
        "0.1.0"
    }

    async fn before_tool_call(&self, _ctx: &ToolCallContext) -> Result<HookOutcome, ProxyError> {
        Ok(HookOutcome::Continue)
    }

    async fn after_tool_call(&self, ctx: &ToolCallContext, result: ToolCallResult) -> Result<ToolCallResult, ProxyError> {
        let entry = AuditEntry {
            request_id: ctx.request_id.clone(),
            tool_name: ctx.tool_name.clone(),
            timestamp: SystemTime::now(),
            duration_ms: ctx.elapsed().as_millis() as u64,
            is_error: result.is_error,
        };
        self.entries.write().await.push(entry);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[tokio::test]
    async fn after_tool_call_appends_one_entry() {
        let plugin = AuditPlugin::new();
        let ctx = ToolCallContext::new("greet", Map::new(), Map::new());
        plugin.after_tool_call(&ctx, ToolCallResult::text("hi")).await.unwrap();
        let entries = plugin.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tool_name, "greet");
        assert!(!entries[0].is_error);
    }

    #[tokio::test]
    async fn clear_empties_the_log() {
        let plugin = AuditPlugin::new();
        let ctx = ToolCallContext::new("greet", Map::new(), Map::new());
        plugin.after_tool_call(&ctx, ToolCallResult::text("hi")).await.unwrap();
        plugin.clear().await;
        assert!(plugin.entries().await.is_empty());
    }
}
