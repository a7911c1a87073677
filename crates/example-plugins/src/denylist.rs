//! Blocks a fixed set of tool names; everything else passes through.

use std::collections::HashSet;

use async_trait::async_trait;
use plugin_registry::{HookOutcome, Plugin};
use proxy_core::{ProxyError, ToolCallContext, ToolCallResult};

/// Short-circuits any call whose tool name is in the denied set.
pub struct DenylistPlugin {
    denied: HashSet<String>,
}

impl DenylistPlugin {
    /// Build a denylist from the given tool names.
    pub fn new(denied: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            denied: denied.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Plugin for DenylistPlugin {
    fn name(&self) -> &str {
        "denylist"
    }

    fn version(&self) -> &str {
        "0.1.0"
    }

    async fn before_tool_call(&self, ctx: &ToolCallContext) -> Result<HookOutcome, ProxyError> {
        if self.denied.contains(&ctx.tool_name) {
            Ok(HookOutcome::ShortCircuit(ToolCallResult::error(format!(
                "tool `{}` is blocked",
                ctx.tool_name
            ))))
        } else {
            Ok(HookOutcome::Continue)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[tokio::test]
    async fn denied_tools_are_blocked() {
        let plugin = DenylistPlugin::new(["rm_rf"]);
        let ctx = ToolCallContext::new("rm_rf", Map::new(), Map::new());
        let outcome = plugin.before_tool_call(&ctx).await.unwrap();
        assert!(matches!(outcome, HookOutcome::ShortCircuit(r) if r.is_error));
    }

    #[tokio::test]
    async fn other_tools_pass_through() {
        let plugin = DenylistPlugin::new(["rm_rf"]);
        let ctx = ToolCallContext::new("greet", Map::new(), Map::new());
        assert!(matches!(plugin.before_tool_call(&ctx).await.unwrap(), HookOutcome::Continue));
    }
}
