//! `wrap(server, options)`: builds the plugin runtime around a
//! [`ToolServer`] and returns the controlling [`WrapperHandle`].

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use execution_manager::{ExecutionMode, HookRunner, RunnerConfig};
use observability::{PerformanceReport, PerformanceStats, PluginPerformance};
use plugin_lifecycle::{LifecycleConfig, LifecycleManager};
use plugin_registry::{PluginHealth, PluginRegistry};
use proxy_core::{ProxyError, ToolCallContext, ToolCallResult};
use proxy_security::{run_gate, SecurityConfig};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::events::{LifecycleEvent, LifecycleEventSource};
use crate::global_hooks::GlobalHookPlugin;
use crate::options::WrapOptions;
use crate::target::{tool_handler, ToolHandler, ToolServer};
use crate::wrapper_registry;

/// The controlling object for a wrapped server: `dispose()`, `getHealthStatus()`, `getResourceUsage()`,
/// `getPerformanceStats()`, and a lifecycle-event stream.
pub struct WrapperHandle<S: ToolServer + 'static> {
    inner: Arc<S>,
    registry: Arc<PluginRegistry>,
    lifecycle: LifecycleManager,
    runner: HookRunner,
    security: SecurityConfig,
    performance: Arc<PerformanceStats>,
    metadata: serde_json::Map<String, Value>,
    events: LifecycleEventSource,
    debug: bool,
    auto_dispose: bool,
    disposed: AtomicBool,
}

impl<S: ToolServer + 'static> WrapperHandle<S> {
    /// The underlying server this handle wraps.
    pub fn inner(&self) -> &Arc<S> {
        &self.inner
    }

    /// Subscribe to this wrapper's lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    /// `getHealthStatus()`: each plugin's last-known health classification.
    pub async fn get_health_status(&self) -> Vec<(String, PluginHealth)> {
        self.lifecycle.health_check_all().await
    }

    /// `getResourceUsage()`: every plugin's declared resources plus a
    /// synthetic entry for the plugin itself.
    pub fn get_resource_usage(&self) -> Vec<plugin_lifecycle::PluginResourceUsage> {
        self.lifecycle.resource_usage()
    }

    /// `getPerformanceStats()`: per-plugin before/after hook statistics.
    pub fn get_performance_stats(&self) -> PerformanceReport {
        let plugins = self
            .registry
            .all()
            .into_iter()
            .map(|entry| PluginPerformance {
                name: entry.plugin.name().to_string(),
                before: entry.before_stats.snapshot(),
                after: entry.after_stats.snapshot(),
            })
            .collect();
        PerformanceReport { plugins }
    }

    /// `dispose()`: tear down every plugin. A second call is a no-op.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.events.publish(LifecycleEvent::Stopping);
        self.lifecycle.dispose_all().await;
        self.events.publish(LifecycleEvent::Stopped);
    }

    /// Invoke the pipeline for one call: security gate, then the hook
    /// runner, against `original` (the tool's real implementation).
    pub async fn invoke(
        &self,
        tool_name: &str,
        args: serde_json::Map<String, Value>,
        extra: serde_json::Map<String, Value>,
        schema: &Value,
        original: ToolHandler,
    ) -> ToolCallResult {
        let gate_outcome = match run_gate(tool_name, args, schema, &self.security) {
            Ok(outcome) => outcome,
            Err(err) => return ToolCallResult::error(err.to_client_message(self.debug)),
        };

        let ctx = ToolCallContext::new(tool_name, gate_outcome.redacted_args, extra)
            .with_global_metadata(self.metadata.clone());
        let seal = gate_outcome.seal;
        let started_at = std::time::Instant::now();

        let outcome = match self.runner.run(ctx, move |call_ctx| {
            let unsealed_args = seal.unseal(call_ctx.snapshot_args());
            let handler_ctx = ToolCallContext::new(call_ctx.tool_name.clone(), unsealed_args, call_ctx.extra.clone());
            async move { original(handler_ctx).await }
        }).await {
            Ok(result) => result,
            Err(err) => ToolCallResult::error(err.to_client_message(self.debug)),
        };

        if self.performance.enabled() {
            let duration_ms = started_at.elapsed().as_millis() as u64;
            if self.performance.exceeds_threshold("call", duration_ms) {
                warn!(tool = %tool_name, duration_ms, "call exceeded its configured performance threshold");
            }
            if self.performance.should_sample() {
                tracing::debug!(tool = %tool_name, duration_ms, is_error = outcome.is_error, "sampled call detail");
            }
        }

        outcome
    }
}

impl<S: ToolServer + 'static> Drop for WrapperHandle<S> {
    /// If `options.lifecycle.auto_dispose` was set and no one called
    /// `dispose()` explicitly, dispose every plugin as the last reference
    /// to this handle goes away. Best-effort: only runs inside a tokio
    /// runtime, since `Drop` can't itself `.await`.
    fn drop(&mut self) {
        if !self.auto_dispose || *self.disposed.get_mut() {
            return;
        }
        let lifecycle = self.lifecycle.clone();
        let events = self.events.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                events.publish(LifecycleEvent::Stopping);
                lifecycle.dispose_all().await;
                events.publish(LifecycleEvent::Stopped);
            });
        } else {
            warn!("WrapperHandle dropped outside a tokio runtime; auto_dispose could not run");
        }
    }
}

/// `wrap(server, options) -> server`.
///
/// Idempotent: re-wrapping an already-wrapped server (by `Arc` identity)
/// returns the existing [`WrapperHandle`] and ignores the new `options`.
pub async fn wrap<S: ToolServer + 'static>(server: Arc<S>, options: WrapOptions) -> Result<Arc<WrapperHandle<S>>, ProxyError> {
    let key = wrapper_registry::identity_of(&server);
    if let Some(existing) = wrapper_registry::lookup(key) {
        if let Ok(handle) = existing.downcast::<WrapperHandle<S>>() {
            info!("server already wrapped; returning the existing wrapper instance");
            return Ok(handle);
        }
    }

    let registry = Arc::new(PluginRegistry::new());
    for plugin in &options.plugins {
        registry
            .register(plugin.clone())
            .map_err(|e| ProxyError::Dependency(e.to_string()))?;
    }
    if let Some(global) = GlobalHookPlugin::from_hooks(options.hooks.clone()) {
        registry
            .register(Arc::new(global))
            .map_err(|e| ProxyError::Dependency(e.to_string()))?;
    }

    let events = LifecycleEventSource::new();
    events.publish(LifecycleEvent::Starting);

    let lifecycle_config = LifecycleConfig {
        disposal_timeout: std::time::Duration::from_millis(options.lifecycle.disposal_timeout_ms),
        ..LifecycleConfig::default()
    };
    let lifecycle = LifecycleManager::new(registry.clone(), lifecycle_config);
    if let Err(err) = lifecycle.initialize_all(options.metadata.clone()).await {
        events.publish(LifecycleEvent::Error(err.to_string()));
        return Err(err);
    }

    let runner_config = RunnerConfig {
        mode: ExecutionMode::Serial,
        fail_fast: false,
        degraded_threshold: 3,
        max_execution_time_ms: options.security.max_execution_time_ms,
        debug: options.debug,
    };
    let runner = HookRunner::new(registry.clone(), runner_config);
    let performance = Arc::new(PerformanceStats::new(options.performance.clone()));

    let handle = Arc::new(WrapperHandle {
        inner: server.clone(),
        registry,
        lifecycle,
        runner,
        security: options.security.clone(),
        performance,
        metadata: options.metadata.clone(),
        events,
        debug: options.debug,
        auto_dispose: options.lifecycle.auto_dispose,
        disposed: AtomicBool::new(false),
    });

    wrapper_registry::register(key, handle.clone() as Arc<dyn Any + Send + Sync>);
    handle.events.publish(LifecycleEvent::Started);

    if let Some(names) = server.registered_tool_names() {
        for name in names {
            let handle_for_rewrap = handle.clone();
            let name_for_rewrap = name.clone();
            let rewrapped = server.wrap_existing_handler(&name, &move |original: ToolHandler| {
                wrap_handler(handle_for_rewrap.clone(), name_for_rewrap.clone(), original)
            });
            if !rewrapped {
                warn!(tool = %name, "could not retrofit interception onto a pre-wrap tool registration");
            }
        }
    } else {
        warn!("underlying server's tool registry is encapsulated; only tools registered after wrap() will be intercepted");
    }

    Ok(handle)
}

/// Build the replacement handler installed for a given tool name: runs the
/// security gate and hook pipeline, then calls `original`.
fn wrap_handler<S: ToolServer + 'static>(handle: Arc<WrapperHandle<S>>, tool_name: String, original: ToolHandler) -> ToolHandler {
    tool_handler(move |ctx: ToolCallContext| {
        let handle = handle.clone();
        let tool_name = tool_name.clone();
        let original = original.clone();
        async move {
            let args = ctx.snapshot_args();
            let extra = ctx.extra.clone();
            // The schema was validated by the underlying server already;
            // the gate's own schema check runs against an unconstrained
            // shape here since register_tool's schema isn't threaded
            // through this path, only through `wrap_tool` below.
            let result = handle.invoke(&tool_name, args, extra, &Value::Null, original).await;
            Ok(result)
        }
    })
}

/// The intercepting `register_tool`: wraps `handler` before handing it to
/// the underlying server, so every subsequent call for `name` passes
/// through the pipeline.
pub fn wrap_tool<S: ToolServer + 'static>(handle: &Arc<WrapperHandle<S>>, name: &str, schema: Value, handler: ToolHandler) {
    let handle = handle.clone();
    let name_owned = name.to_string();
    let wrapped = tool_handler(move |ctx: ToolCallContext| {
        let handle = handle.clone();
        let name = name_owned.clone();
        let handler = handler.clone();
        let schema = schema.clone();
        async move {
            let args = ctx.snapshot_args();
            let extra = ctx.extra.clone();
            let result = handle.invoke(&name, args, extra, &schema, handler).await;
            Ok(result)
        }
    });
    handle.inner.register_tool(name, Value::Null, wrapped);
}
