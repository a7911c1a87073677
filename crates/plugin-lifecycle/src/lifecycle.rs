//! `LifecycleManager`: initializes, health-checks, and disposes plugins.

use std::sync::Arc;
use std::time::Instant;

use plugin_registry::{PluginEntry, PluginHealth, PluginInitContext, PluginRegistry, PluginState};
use proxy_core::{ProxyError, ResourceInfo};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::config::LifecycleConfig;
use crate::resources::PluginResourceUsage;

/// Manages `initialize`/`health_check`/`dispose` across every plugin in a
/// [`PluginRegistry`]. Borrows the registry's plugin references and must
/// never outlive it.
#[derive(Clone)]
pub struct LifecycleManager {
    registry: Arc<PluginRegistry>,
    config: LifecycleConfig,
}

impl LifecycleManager {
    /// Create a manager over `registry` with the given tuning.
    pub fn new(registry: Arc<PluginRegistry>, config: LifecycleConfig) -> Self {
        Self { registry, config }
    }

    /// Initialize every plugin serially in resolved order. If any plugin's
    /// `initialize` fails, previously-initialized plugins are disposed in
    /// reverse order before the error is returned (rollback semantics).
    pub async fn initialize_all(&self, global_metadata: Map<String, Value>) -> Result<(), ProxyError> {
        let order = self
            .registry
            .resolve_order()
            .map_err(|e| ProxyError::Dependency(e.to_string()))?;

        let init_ctx = PluginInitContext {
            global_metadata: global_metadata.clone(),
        };

        let mut initialized: Vec<Arc<PluginEntry>> = Vec::new();
        for name in order.iter() {
            let Some(entry) = self.registry.get(name) else {
                continue;
            };
            entry.set_state(PluginState::Initializing);
            info!(plugin = %name, "initializing plugin");
            match entry.plugin.initialize(&init_ctx).await {
                Ok(()) => {
                    entry.set_state(PluginState::Ready);
                    entry.set_health(PluginHealth::Healthy);
                    initialized.push(entry);
                }
                Err(err) => {
                    error!(plugin = %name, error = %err, "plugin failed to initialize; rolling back");
                    for prior in initialized.iter().rev() {
                        self.dispose_one(prior).await;
                    }
                    return Err(ProxyError::PluginFatal {
                        plugin_name: name.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Run `health_check()` on every plugin, bounded by
    /// `config.health_check_timeout`. Updates each plugin's health and,
    /// once `config.degraded_threshold` consecutive `Unhealthy` results are
    /// seen, moves a Ready plugin to Degraded.
    pub async fn health_check_all(&self) -> Vec<(String, PluginHealth)> {
        let mut results = Vec::new();
        for entry in self.registry.all() {
            let name = entry.plugin.name().to_string();
            let health = self.health_check_one(&entry).await;
            results.push((name, health));
        }
        results
    }

    async fn health_check_one(&self, entry: &Arc<PluginEntry>) -> PluginHealth {
        let outcome = tokio::time::timeout(self.config.health_check_timeout, entry.plugin.health_check()).await;
        let health = match outcome {
            Ok(true) => PluginHealth::Healthy,
            Ok(false) => PluginHealth::Unhealthy,
            Err(_) => PluginHealth::Unknown,
        };
        entry.set_health(health);
        entry.record_hook_result(health == PluginHealth::Healthy, self.config.degraded_threshold);
        health
    }

    /// Dispose every plugin in reverse resolved order. Each plugin gets
    /// `config.disposal_timeout`; on timeout, `force_dispose` is invoked as
    /// a best-effort fallback, and the plugin is marked Leaked if even that
    /// doesn't land. One plugin's disposal failure never prevents the rest
    /// from being disposed. Bounded overall by
    /// `config.disposal_budget`.
    pub async fn dispose_all(&self) {
        let order = match self.registry.resolve_order() {
            Ok(order) => order,
            Err(err) => {
                warn!(error = %err, "could not resolve order for disposal; disposing in registration order");
                Arc::new(self.registry.all().iter().map(|e| e.plugin.name().to_string()).collect())
            }
        };

        let deadline = Instant::now() + self.config.disposal_budget;
        for name in order.iter().rev() {
            if Instant::now() >= deadline {
                warn!("disposal budget exhausted; remaining plugins will not be disposed this pass");
                break;
            }
            let Some(entry) = self.registry.get(name) else {
                continue;
            };
            if entry.state() == PluginState::Disposed {
                continue;
            }
            self.dispose_one(&entry).await;
        }
    }

    async fn dispose_one(&self, entry: &Arc<PluginEntry>) {
        let name = entry.plugin.name().to_string();
        entry.set_state(PluginState::Disposing);
        match tokio::time::timeout(self.config.disposal_timeout, entry.plugin.dispose()).await {
            Ok(Ok(())) => {
                entry.set_state(PluginState::Disposed);
                debug!(plugin = %name, "plugin disposed");
            }
            Ok(Err(err)) => {
                warn!(plugin = %name, error = %err, "plugin dispose() returned an error");
                entry.set_state(PluginState::Disposed);
            }
            Err(_) => {
                warn!(plugin = %name, timeout_ms = %self.config.disposal_timeout.as_millis(), "dispose() timed out; forcing");
                entry.plugin.force_dispose().await;
                if !entry.plugin.get_resources().is_empty() {
                    error!(plugin = %name, "plugin leaked resources after force_dispose");
                    entry.mark_leaked();
                }
                entry.set_state(PluginState::Disposed);
            }
        }
    }

    /// Aggregate every plugin's declared resources plus a synthetic
    /// `"plugin"`-typed entry per plugin.
    pub fn resource_usage(&self) -> Vec<PluginResourceUsage> {
        self.registry
            .all()
            .into_iter()
            .map(|entry| {
                let name = entry.plugin.name().to_string();
                let mut resources = entry.plugin.get_resources();
                resources.push(ResourceInfo::new("plugin", name.clone(), format!("plugin instance `{name}`")));
                PluginResourceUsage {
                    plugin_name: name,
                    resources,
                    leaked: entry.is_leaked(),
                }
            })
            .collect()
    }
}
