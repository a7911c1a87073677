//! Logs every call's start and completion.

use async_trait::async_trait;
use plugin_registry::{HookOutcome, Plugin};
use proxy_core::{ProxyError, ToolCallContext, ToolCallResult};
use tracing::Level;

/// Logs a line before and after every call, at a configurable level.
pub struct LoggingPlugin {
    level: Level,
}

impl Default for LoggingPlugin {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingPlugin {
    /// Build a logging plugin at the given level.
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

#[async_trait]
impl Plugin for LoggingPlugin {
    fn name(&self) -> &str {
        "logging"
    }

    fn version(&self) -> &str {
        "0.1.0"
    }

    async fn before_tool_call(&self, ctx: &ToolCallContext) -> Result<HookOutcome, ProxyError> {
        match self.level {
            Level::TRACE => tracing::trace!(tool = %ctx.tool_name, request_id = %ctx.request_id, "tool call started"),
            Level::DEBUG => tracing::debug!(tool = %ctx.tool_name, request_id = %ctx.request_id, "tool call started"),
            Level::WARN => tracing::warn!(tool = %ctx.tool_name, request_id = %ctx.request_id, "tool call started"),
            Level::ERROR => tracing::error!(tool = %ctx.tool_name, request_id = %ctx.request_id, "tool call started"),
            Level::INFO => tracing::info!(tool = %ctx.tool_name, request_id = %ctx.request_id, "tool call started"),
        }
        Ok(HookOutcome::Continue)
    }

    async fn after_tool_call(&self, ctx: &ToolCallContext, result: ToolCallResult) -> Result<ToolCallResult, ProxyError> {
        tracing::info!(
            tool = %ctx.tool_name,
            request_id = %ctx.request_id,
            duration_ms = %ctx.elapsed().as_millis(),
            is_error = result.is_error,
            "tool call completed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[tokio::test]
    async fn before_and_after_both_run_without_affecting_the_result() {
        let plugin = LoggingPlugin::default();
        let ctx = ToolCallContext::new("greet", Map::new(), Map::new());
        assert!(matches!(plugin.before_tool_call(&ctx).await.unwrap(), HookOutcome::Continue));
        let result = plugin.after_tool_call(&ctx, ToolCallResult::text("hi")).await.unwrap();
        assert_eq!(result, ToolCallResult::text("hi"));
    }
}
