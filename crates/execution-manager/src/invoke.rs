//! Single-hook invocation: timeout, retry, and stats bookkeeping shared by
//! every scheduling mode.

use std::sync::Arc;
use std::time::Instant;

use observability::{log_hook_exec, HookOutcomeLabel};
use plugin_registry::{HookOutcome, Plugin, PluginEntry};
use proxy_core::{ProxyError, ToolCallContext, ToolCallResult};
use tracing::warn;

/// Outcome of running one plugin's before-hook.
pub enum BeforeHookResult {
    /// The hook ran (successfully or not) and did not short-circuit.
    Ran(Result<(), ProxyError>),
    /// The hook short-circuited the call.
    ShortCircuit(ToolCallResult),
}

/// Run one plugin's before-hook with timeout + retry, updating its stats.
pub async fn invoke_before(entry: &Arc<PluginEntry>, ctx: &ToolCallContext, degraded_threshold: u32) -> BeforeHookResult {
    let timing = entry.plugin.timing();
    let mut attempt = 0u32;
    loop {
        if attempt > 0 {
            ctx.set_metadata("isRetry", serde_json::json!(true));
            ctx.set_metadata("retryAttempt", serde_json::json!(attempt));
        }
        let start = Instant::now();
        let fut = entry.plugin.before_tool_call(ctx);
        let outcome = tokio::time::timeout(timing.timeout, fut).await;
        let elapsed = start.elapsed();

        let duration_ms = elapsed.as_millis() as u64;
        match outcome {
            Ok(Ok(HookOutcome::Continue)) => {
                entry.before_stats.record_success(elapsed);
                entry.record_hook_result(true, degraded_threshold);
                log_hook_exec(&ctx.request_id, entry.plugin.name(), "before", duration_ms, HookOutcomeLabel::Success);
                return BeforeHookResult::Ran(Ok(()));
            }
            Ok(Ok(HookOutcome::ShortCircuit(result))) => {
                entry.before_stats.record_success(elapsed);
                entry.record_hook_result(true, degraded_threshold);
                log_hook_exec(&ctx.request_id, entry.plugin.name(), "before", duration_ms, HookOutcomeLabel::ShortCircuit);
                return BeforeHookResult::ShortCircuit(result);
            }
            Ok(Err(err)) => {
                entry.before_stats.record_failure(elapsed, err.to_string());
                entry.record_hook_result(false, degraded_threshold);
                log_hook_exec(&ctx.request_id, entry.plugin.name(), "before", duration_ms, HookOutcomeLabel::Failure);
                entry.plugin.on_error(&err).await;
                if entry.plugin.retryable(&err) && attempt < timing.max_retries {
                    attempt += 1;
                    continue;
                }
                return BeforeHookResult::Ran(Err(err));
            }
            Err(_elapsed) => {
                let err = ProxyError::HookTimeout {
                    plugin_name: entry.plugin.name().to_string(),
                    timeout_ms: timing.timeout.as_millis() as u64,
                };
                entry.before_stats.record_failure(elapsed, "timeout");
                entry.record_hook_result(false, degraded_threshold);
                log_hook_exec(&ctx.request_id, entry.plugin.name(), "before", duration_ms, HookOutcomeLabel::Timeout);
                ctx.cancellation.cancel();
                entry.plugin.on_error(&err).await;
                if attempt < timing.max_retries {
                    attempt += 1;
                    continue;
                }
                warn!(plugin = %entry.plugin.name(), "before-hook timed out and will not be retried further");
                return BeforeHookResult::Ran(Err(err));
            }
        }
    }
}

/// Run one plugin's after-hook with timeout + retry, updating its stats.
/// Returns the (possibly unchanged) result; a malformed hook return
/// (missing content,  step 5) is rejected and the prior result
/// kept, logged at warn.
pub async fn invoke_after(
    entry: &Arc<PluginEntry>,
    ctx: &ToolCallContext,
    current: ToolCallResult,
    degraded_threshold: u32,
) -> ToolCallResult {
    let timing = entry.plugin.timing();
    let mut attempt = 0u32;
    loop {
        let start = Instant::now();
        let fut = entry.plugin.after_tool_call(ctx, current.clone());
        let outcome = tokio::time::timeout(timing.timeout, fut).await;
        let elapsed = start.elapsed();
        let duration_ms = elapsed.as_millis() as u64;

        match outcome {
            Ok(Ok(next)) => {
                if !next.is_well_formed() {
                    warn!(
                        plugin = %entry.plugin.name(),
                        "after-hook returned a result missing content and not marked is_error; keeping prior result"
                    );
                    entry.after_stats.record_failure(elapsed, "malformed result");
                    entry.record_hook_result(false, degraded_threshold);
                    log_hook_exec(&ctx.request_id, entry.plugin.name(), "after", duration_ms, HookOutcomeLabel::Failure);
                    return current;
                }
                entry.after_stats.record_success(elapsed);
                entry.record_hook_result(true, degraded_threshold);
                log_hook_exec(&ctx.request_id, entry.plugin.name(), "after", duration_ms, HookOutcomeLabel::Success);
                return next;
            }
            Ok(Err(err)) => {
                entry.after_stats.record_failure(elapsed, err.to_string());
                entry.record_hook_result(false, degraded_threshold);
                log_hook_exec(&ctx.request_id, entry.plugin.name(), "after", duration_ms, HookOutcomeLabel::Failure);
                entry.plugin.on_error(&err).await;
                if entry.plugin.retryable(&err) && attempt < timing.max_retries {
                    attempt += 1;
                    continue;
                }
                warn!(plugin = %entry.plugin.name(), error = %err, "after-hook failed; isolating and keeping prior result");
                return current;
            }
            Err(_elapsed) => {
                let err = ProxyError::HookTimeout {
                    plugin_name: entry.plugin.name().to_string(),
                    timeout_ms: timing.timeout.as_millis() as u64,
                };
                entry.after_stats.record_failure(elapsed, "timeout");
                entry.record_hook_result(false, degraded_threshold);
                log_hook_exec(&ctx.request_id, entry.plugin.name(), "after", duration_ms, HookOutcomeLabel::Timeout);
                entry.plugin.on_error(&err).await;
                if attempt < timing.max_retries {
                    attempt += 1;
                    continue;
                }
                warn!(plugin = %entry.plugin.name(), "after-hook timed out; isolating and keeping prior result");
                return current;
            }
        }
    }
}
