//! The plugin contract and its configuration/state types.

use std::collections::HashSet;

use async_trait::async_trait;
use proxy_core::{HookTiming, ProxyError, ResourceInfo, ToolCallContext, ToolCallResult};
use serde_json::{Map, Value};

/// What a before-hook can decide: let the call proceed, or short-circuit it
/// with a final result.
#[derive(Debug)]
pub enum HookOutcome {
    /// Continue to the next before-hook (or the original handler).
    Continue,
    /// Short-circuit: skip remaining before-hooks and the original handler.
    ShortCircuit(ToolCallResult),
}

/// Per-plugin configuration.
#[derive(Debug, Clone)]
pub struct PluginConfig {
    /// Whether the plugin participates in hook execution at all.
    pub enabled: bool,
    /// If set, the plugin only runs for these tool names.
    pub include_tools: Option<HashSet<String>>,
    /// Tool names the plugin never runs for, regardless of `include_tools`.
    pub exclude_tools: Option<HashSet<String>>,
    /// Plugin-specific options, opaque to the registry.
    pub options: Map<String, Value>,
    /// Whether after-hooks run in reverse resolved order (the default) or
    /// in forward order, step 5 ("plugins may opt out").
    pub reverse_after: bool,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include_tools: None,
            exclude_tools: None,
            options: Map::new(),
            reverse_after: true,
        }
    }
}

impl PluginConfig {
    /// Whether this plugin's hooks should run for `tool_name`, per the
    /// filtering rules in  (enabled flag, include/exclude lists).
    /// This is purely a participation filter — it never affects the
    /// registry's resolved ordering.
    pub fn applies_to(&self, tool_name: &str) -> bool {
        if !self.enabled {
            return false;
        }
        if let Some(include) = &self.include_tools {
            if !include.contains(tool_name) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude_tools {
            if exclude.contains(tool_name) {
                return false;
            }
        }
        true
    }
}

/// Lifecycle state of a registered plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginState {
    /// Created but not yet handed to a registry.
    Unregistered,
    /// Accepted by the registry; not yet initialized.
    Registered,
    /// `initialize()` is in flight.
    Initializing,
    /// Initialized and eligible to run hooks.
    Ready,
    /// Registered, initialized, but excluded from hook execution due to
    /// repeated health-check failures.
    Degraded,
    /// `dispose()` is in flight.
    Disposing,
    /// Disposed; will never run a hook again.
    Disposed,
}

/// Health classification of a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginHealth {
    /// Last health check succeeded.
    Healthy,
    /// Health checks are starting to fail, but under the Degraded threshold.
    Degraded,
    /// Health checks have failed enough to suppress participation.
    Unhealthy,
    /// Never checked, or the last check did not complete in its window.
    Unknown,
}

/// Context passed to a plugin's `initialize()`.
#[derive(Debug, Clone, Default)]
pub struct PluginInitContext {
    /// Wrapper-global metadata (`WrapOptions::metadata`), available to every
    /// plugin at startup.
    pub global_metadata: Map<String, Value>,
}

/// A named, versioned bundle of hooks with lifecycle and configuration.
///
/// All methods besides `name`/`version` have no-op defaults so a plugin can
/// implement only what it needs.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Unique name within a registry.
    fn name(&self) -> &str;

    /// Plugin version, informational.
    fn version(&self) -> &str;

    /// Higher runs earlier in before-hooks, later in after-hooks. Default 0.
    fn priority(&self) -> i32 {
        0
    }

    /// Names of plugins this one depends on; all must be registered, and
    /// cycles are rejected at `resolve_order` time.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// This plugin's configuration.
    fn config(&self) -> PluginConfig {
        PluginConfig::default()
    }

    /// An extra, arbitrary condition evaluated per-call in addition to the
    /// `include_tools`/`exclude_tools` filter in `config()`. Defaults to always running.
    fn should_run(&self, _ctx: &ToolCallContext) -> bool {
        true
    }

    /// Timeout/retry policy for this plugin's hooks. Defaults to a 5s
    /// timeout with no retries.
    fn timing(&self) -> HookTiming {
        HookTiming::default()
    }

    /// Whether a failed hook execution should be retried (subject to
    /// `timing().max_retries`). A `HookTimeout` is always retryable;
    /// plugins may also mark their own thrown errors retryable.
    fn retryable(&self, err: &ProxyError) -> bool {
        matches!(err, ProxyError::HookTimeout { .. })
    }

    /// Called exactly once before the first hook execution.
    async fn initialize(&self, _ctx: &PluginInitContext) -> Result<(), ProxyError> {
        Ok(())
    }

    /// Called before the original handler. May short-circuit the call.
    async fn before_tool_call(&self, _ctx: &ToolCallContext) -> Result<HookOutcome, ProxyError> {
        Ok(HookOutcome::Continue)
    }

    /// Called after the original handler (or after a short-circuit).
    async fn after_tool_call(
        &self,
        _ctx: &ToolCallContext,
        result: ToolCallResult,
    ) -> Result<ToolCallResult, ProxyError> {
        Ok(result)
    }

    /// Notified when any hook in this plugin fails.
    async fn on_error(&self, _err: &ProxyError) {}

    /// On-demand health probe; must return within a bounded window or is
    /// treated as `Unknown` by the lifecycle manager.
    async fn health_check(&self) -> bool {
        true
    }

    /// Resources currently held by this plugin.
    fn get_resources(&self) -> Vec<ResourceInfo> {
        Vec::new()
    }

    /// Called exactly once after the last hook (or never, if never
    /// initialized). Should release every resource from `get_resources`.
    async fn dispose(&self) -> Result<(), ProxyError> {
        Ok(())
    }

    /// Best-effort forced disposal, used when `dispose()` does not return
    /// within its budget. Defaults to doing nothing further.
    async fn force_dispose(&self) {}
}
