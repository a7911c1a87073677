//! `PerformanceStats`: sampling policy plus the aggregated report a
//! wrapper instance accessor's `getPerformanceStats()` returns.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use proxy_core::ExecutionStatsSnapshot;
use serde::Serialize;

/// Derived from `WrapOptions.performance`.
#[derive(Debug, Clone)]
pub struct PerformanceConfig {
    /// Whether performance instrumentation runs at all.
    pub enabled: bool,
    /// Fraction (0.0..=1.0) of calls whose detailed payload is logged.
    /// Counters are always updated regardless of this setting.
    pub sampling_rate: f64,
    /// Whether to include resource/memory figures in the report.
    pub track_memory: bool,
    /// Whether to enforce `thresholds` and warn on overruns.
    pub track_execution_time: bool,
    /// Per-named-threshold latency budgets in ms (e.g. "before_hook" -> 200).
    pub thresholds: HashMap<String, u64>,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sampling_rate: 1.0,
            track_memory: false,
            track_execution_time: true,
            thresholds: HashMap::new(),
        }
    }
}

/// Tracks which calls get detailed payload logging, deterministically
/// spaced rather than by rolling dice, so the same config always samples
/// the same proportion without needing a random source.
#[derive(Debug)]
pub struct PerformanceStats {
    config: PerformanceConfig,
    calls_seen: AtomicU64,
}

impl PerformanceStats {
    /// Build a new aggregator from a resolved config.
    pub fn new(config: PerformanceConfig) -> Self {
        Self {
            config,
            calls_seen: AtomicU64::new(0),
        }
    }

    /// Whether instrumentation is enabled at all.
    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Whether the *next* call should have its detailed payload logged.
    /// Always-on counters (`ExecutionStats`) are unaffected by this.
    pub fn should_sample(&self) -> bool {
        if !self.config.enabled {
            return false;
        }
        let rate = self.config.sampling_rate.clamp(0.0, 1.0);
        if rate <= 0.0 {
            return false;
        }
        if rate >= 1.0 {
            return true;
        }
        let rate_per_mille = (rate * 1000.0).round() as u64;
        let n = self.calls_seen.fetch_add(1, Ordering::Relaxed) + 1;
        (n.wrapping_mul(rate_per_mille)) % 1000 < rate_per_mille
    }

    /// Whether `duration_ms` exceeds the configured threshold for `key`,
    /// only meaningful when `track_execution_time` is set.
    pub fn exceeds_threshold(&self, key: &str, duration_ms: u64) -> bool {
        self.config.track_execution_time
            && self
                .config
                .thresholds
                .get(key)
                .is_some_and(|&budget| duration_ms > budget)
    }
}

/// One plugin's before/after hook statistics, as reported by
/// `getPerformanceStats()`.
#[derive(Debug, Clone, Serialize)]
pub struct PluginPerformance {
    /// The plugin's name.
    pub name: String,
    /// Before-hook execution statistics.
    pub before: ExecutionStatsSnapshot,
    /// After-hook execution statistics.
    pub after: ExecutionStatsSnapshot,
}

/// The full report a wrapper instance's `getPerformanceStats()` returns.
#[derive(Debug, Clone, Serialize, Default)]
pub struct PerformanceReport {
    /// Per-plugin breakdown, in registration order.
    pub plugins: Vec<PluginPerformance>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_rate_always_samples() {
        let stats = PerformanceStats::new(PerformanceConfig {
            sampling_rate: 1.0,
            ..PerformanceConfig::default()
        });
        for _ in 0..10 {
            assert!(stats.should_sample());
        }
    }

    #[test]
    fn zero_rate_never_samples() {
        let stats = PerformanceStats::new(PerformanceConfig {
            sampling_rate: 0.0,
            ..PerformanceConfig::default()
        });
        for _ in 0..10 {
            assert!(!stats.should_sample());
        }
    }

    #[test]
    fn half_rate_samples_roughly_half() {
        let stats = PerformanceStats::new(PerformanceConfig {
            sampling_rate: 0.5,
            ..PerformanceConfig::default()
        });
        let sampled = (0..100).filter(|_| stats.should_sample()).count();
        assert!((40..=60).contains(&sampled), "sampled {sampled} of 100");
    }

    #[test]
    fn disabled_config_never_samples_regardless_of_rate() {
        let stats = PerformanceStats::new(PerformanceConfig {
            enabled: false,
            sampling_rate: 1.0,
            ..PerformanceConfig::default()
        });
        assert!(!stats.should_sample());
    }

    #[test]
    fn threshold_check_respects_track_execution_time_flag() {
        let mut thresholds = HashMap::new();
        thresholds.insert("before_hook".to_string(), 100);
        let stats = PerformanceStats::new(PerformanceConfig {
            track_execution_time: false,
            thresholds: thresholds.clone(),
            ..PerformanceConfig::default()
        });
        assert!(!stats.exceeds_threshold("before_hook", 500));

        let stats = PerformanceStats::new(PerformanceConfig {
            track_execution_time: true,
            thresholds,
            ..PerformanceConfig::default()
        });
        assert!(stats.exceeds_threshold("before_hook", 500));
        assert!(!stats.exceeds_threshold("before_hook", 50));
    }
}
