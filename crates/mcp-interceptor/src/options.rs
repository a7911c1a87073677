//! `WrapOptions`: the recognized keys accepted by `wrap()`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use observability::PerformanceConfig;
use plugin_registry::Plugin;
use proxy_core::{ProxyError, ToolCallContext, ToolCallResult};
use proxy_security::SecurityConfig;
use serde_json::{Map, Value};

/// A user-supplied global before-hook: `(ctx) -> Continue | ShortCircuit`.
/// Modeled the same as a plugin's `before_tool_call`, so it can be adapted
/// into a synthetic plugin without a parallel code path.
pub type GlobalBeforeHook = Arc<
    dyn Fn(ToolCallContext) -> Pin<Box<dyn Future<Output = Result<Option<ToolCallResult>, ProxyError>> + Send>>
        + Send
        + Sync,
>;

/// A user-supplied global after-hook: `(ctx, result) -> result`.
pub type GlobalAfterHook = Arc<
    dyn Fn(ToolCallContext, ToolCallResult) -> Pin<Box<dyn Future<Output = Result<ToolCallResult, ProxyError>> + Send>>
        + Send
        + Sync,
>;

/// A user-supplied global error hook: `(err) -> ()`.
pub type GlobalErrorHook = Arc<dyn Fn(&ProxyError) + Send + Sync>;

/// `options.hooks`: `{beforeToolCall?, afterToolCall?, errorHook?}`.
#[derive(Clone, Default)]
pub struct GlobalHooks {
    /// Runs before every plugin's before-hook (default: highest priority).
    pub before_tool_call: Option<GlobalBeforeHook>,
    /// Runs after every plugin's after-hook (default: lowest priority, i.e.
    /// last in the reversed after order... see `GlobalHookPlugin` doc).
    pub after_tool_call: Option<GlobalAfterHook>,
    /// Notified whenever any hook (plugin or global) fails.
    pub error_hook: Option<GlobalErrorHook>,
}

/// `options.lifecycle`.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleOptions {
    /// Whether the wrapper disposes all plugins automatically when the
    /// underlying server itself is dropped/disposed.
    pub auto_dispose: bool,
    /// Per-plugin disposal timeout.
    pub disposal_timeout_ms: u64,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            auto_dispose: true,
            disposal_timeout_ms: 5_000,
        }
    }
}

/// The options mapping accepted by `wrap()`.
#[derive(Clone, Default)]
pub struct WrapOptions {
    /// Global hooks applied around every plugin's hooks.
    pub hooks: GlobalHooks,
    /// Plugins to register, in the order they should be added.
    pub plugins: Vec<Arc<dyn Plugin>>,
    /// Merged into every call's context metadata.
    pub metadata: Map<String, Value>,
    /// Verbose logs and un-redacted client error messages.
    pub debug: bool,
    /// Plugin lifecycle configuration.
    pub lifecycle: LifecycleOptions,
    /// Performance instrumentation configuration.
    pub performance: PerformanceConfig,
    /// Input validation / redaction / execution-cap configuration.
    pub security: SecurityConfig,
}
