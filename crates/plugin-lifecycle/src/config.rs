//! Lifecycle manager tuning knobs.

use std::time::Duration;

/// Configuration for [`crate::LifecycleManager`].
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Per-plugin budget for `dispose()` before `force_dispose` is invoked
    /// and the plugin is marked Leaked if that doesn't finish either.
    /// Default 5s,.
    pub disposal_timeout: Duration,
    /// Overall wall-clock budget for disposing every plugin.
    pub disposal_budget: Duration,
    /// Window a single `health_check()` call gets before being classified
    /// `Unknown`.
    pub health_check_timeout: Duration,
    /// Consecutive `Unhealthy` health checks before a plugin is moved to
    /// Degraded.
    pub degraded_threshold: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            disposal_timeout: Duration::from_secs(5),
            disposal_budget: Duration::from_secs(30),
            health_check_timeout: Duration::from_secs(2),
            degraded_threshold: 3,
        }
    }
}
