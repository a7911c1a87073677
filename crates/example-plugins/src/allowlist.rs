//! Blocks every tool call except those named in an allowlist.

use std::collections::HashSet;

use async_trait::async_trait;
use plugin_registry::{HookOutcome, Plugin};
use proxy_core::{ProxyError, ToolCallContext, ToolCallResult};

/// Short-circuits any call whose tool name is not in the allowed set.
pub struct AllowlistPlugin {
    allowed: HashSet<String>,
}

impl AllowlistPlugin {
    /// Build an allowlist from the given tool names.
    pub fn new(allowed: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Plugin for AllowlistPlugin {
    fn name(&self) -> &str {
        "allowlist"
    }

    fn version(&self) -> &str {
        "0.1.0"
    }

    async fn before_tool_call(&self, ctx: &ToolCallContext) -> Result<HookOutcome, ProxyError> {
        if self.allowed.contains(&ctx.tool_name) {
            Ok(HookOutcome::Continue)
        } else {
            Ok(HookOutcome::ShortCircuit(ToolCallResult::error(format!(
                "tool `{}` is not in the allowlist",
                ctx.tool_name
            ))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[tokio::test]
    async fn allowed_tools_pass_through() {
        let plugin = AllowlistPlugin::new(["greet"]);
        let ctx = ToolCallContext::new("greet", Map::new(), Map::new());
        assert!(matches!(plugin.before_tool_call(&ctx).await.unwrap(), HookOutcome::Continue));
    }

    #[tokio::test]
    async fn other_tools_are_blocked() {
        let plugin = AllowlistPlugin::new(["greet"]);
        let ctx = ToolCallContext::new("delete_everything", Map::new(), Map::new());
        let outcome = plugin.before_tool_call(&ctx).await.unwrap();
        assert!(matches!(outcome, HookOutcome::ShortCircuit(r) if r.is_error));
    }
}
