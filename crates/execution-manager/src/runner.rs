//! `HookRunner`: orchestrates a full before/handler/after call.

use std::future::Future;
use std::sync::Arc;

use observability::{log_call_end, log_call_start};
use plugin_registry::PluginRegistry;
use proxy_core::{ProxyError, ToolCallContext, ToolCallResult};
use tracing::{info, Instrument};

use crate::mode::ExecutionMode;
use crate::scheduler::{run_after_phase, run_before_phase, BeforeBatchOutcome};

/// Configuration a `HookRunner` needs beyond what's on the registry/context.
#[derive(Debug, Clone, Copy)]
pub struct RunnerConfig {
    /// Scheduling mode for both phases.
    pub mode: ExecutionMode,
    /// Whether a before-hook failure aborts the remaining before-hooks
    /// (true) or is isolated and the batch continues (false, the default;
    /// see DESIGN.md for why Serial's "abort" wording is scoped this way).
    pub fail_fast: bool,
    /// Consecutive hook failures before a plugin is marked Degraded.
    pub degraded_threshold: u32,
    /// Optional wall-clock cap for the original handler invocation, in ms.
    /// `None` means no cap.
    pub max_execution_time_ms: Option<u64>,
    /// Whether an error converted to a client-facing `ToolCallResult` inside
    /// this runner includes internal detail (see `ProxyError::to_client_message`).
    pub debug: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Serial,
            fail_fast: false,
            degraded_threshold: 3,
            max_execution_time_ms: None,
            debug: false,
        }
    }
}

/// Drives one tool call through the before phase, the original handler, and
/// the after phase, against a shared registry.
pub struct HookRunner {
    registry: Arc<PluginRegistry>,
    config: RunnerConfig,
}

impl HookRunner {
    /// Build a runner over `registry` with the given configuration.
    pub fn new(registry: Arc<PluginRegistry>, config: RunnerConfig) -> Self {
        Self { registry, config }
    }

    /// Run the full pipeline for one call. `handler` is the original tool
    /// implementation; it only runs if no before-hook short-circuits.
    ///
    /// `max_execution_time_ms`, when set, bounds the whole before+handler+
    /// after sequence: on expiry, the call's cancellation
    /// signal fires and a `CallCapExceeded` error is returned regardless of
    /// which phase was in flight.
    pub async fn run<F, Fut>(&self, ctx: ToolCallContext, handler: F) -> Result<ToolCallResult, ProxyError>
    where
        F: FnOnce(ToolCallContext) -> Fut,
        Fut: Future<Output = Result<ToolCallResult, ProxyError>>,
    {
        let span = ctx.span.clone();
        let cancellation = ctx.cancellation.clone();
        let tool_name = ctx.tool_name.clone();
        let ctx_for_cap = ctx.clone();
        let body = self.run_inner(ctx, handler).instrument(span);

        match self.config.max_execution_time_ms {
            None => body.await,
            Some(cap_ms) => {
                let cap = std::time::Duration::from_millis(cap_ms);
                tokio::select! {
                    res = body => res,
                    _ = tokio::time::sleep(cap) => {
                        cancellation.cancel();
                        self.record_cancelled_stats(&ctx_for_cap, cap);
                        Err(ProxyError::CallCapExceeded { tool_name, cap_ms })
                    }
                }
            }
        }
    }

    /// A call hitting `max_execution_time_ms` abandons its in-flight hooks
    /// without knowing which phase they were in; record the cancellation
    /// against every hook that was eligible to run for this call so
    /// `getPerformanceStats()` reflects it.
    fn record_cancelled_stats(&self, ctx: &ToolCallContext, elapsed: std::time::Duration) {
        let Ok(order) = self.registry.resolve_order() else {
            return;
        };
        for name in order.iter() {
            let Some(entry) = self.registry.get(name) else {
                continue;
            };
            if !entry.is_active() || !entry.plugin.config().applies_to(&ctx.tool_name) {
                continue;
            }
            entry.before_stats.record_cancelled(elapsed);
            entry.after_stats.record_cancelled(elapsed);
        }
    }

    async fn run_inner<F, Fut>(&self, ctx: ToolCallContext, handler: F) -> Result<ToolCallResult, ProxyError>
    where
        F: FnOnce(ToolCallContext) -> Fut,
        Fut: Future<Output = Result<ToolCallResult, ProxyError>>,
    {
        log_call_start(&ctx.request_id, &ctx.tool_name);

        let order = self.registry.resolve_order().map_err(|e| ProxyError::Dependency(e.to_string()))?;

        let before_outcome = run_before_phase(
            &order,
            &self.registry,
            &ctx,
            self.config.mode,
            self.config.fail_fast,
            self.config.degraded_threshold,
        )
        .await;

        ctx.freeze_args();

        let mut short_circuited = false;
        let mut result = match before_outcome {
            BeforeBatchOutcome::ShortCircuit(result) => {
                short_circuited = true;
                info!(tool = %ctx.tool_name, "call.short_circuit");
                result
            }
            BeforeBatchOutcome::Aborted(err) => {
                info!(tool = %ctx.tool_name, error = %err, "call.aborted");
                ToolCallResult::error(err.to_client_message(self.config.debug))
            }
            BeforeBatchOutcome::Continue => {
                if ctx.cancellation.is_cancelled() {
                    ToolCallResult::error("call cancelled before handler invocation")
                } else {
                    match self.invoke_handler(&ctx, handler).await {
                        Ok(result) => result,
                        Err(err) => {
                            info!(tool = %ctx.tool_name, error = %err, "call.handler_error");
                            ToolCallResult::error(err.to_client_message(self.config.debug))
                        }
                    }
                }
            }
        };

        result = run_after_phase(
            &order,
            &self.registry,
            &ctx,
            self.config.mode,
            self.config.degraded_threshold,
            result,
        )
        .await;

        log_call_end(
            &ctx.request_id,
            ctx.elapsed().as_millis() as u64,
            result.is_error,
            short_circuited,
        );
        Ok(result)
    }

    async fn invoke_handler<F, Fut>(&self, ctx: &ToolCallContext, handler: F) -> Result<ToolCallResult, ProxyError>
    where
        F: FnOnce(ToolCallContext) -> Fut,
        Fut: Future<Output = Result<ToolCallResult, ProxyError>>,
    {
        handler(ctx.clone()).await
    }
}
