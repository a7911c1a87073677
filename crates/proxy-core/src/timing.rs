//! `HookTiming`: the per-hook slice of `HookExecutionConfig`
//! that a plugin can override — timeout and retry policy. The execution
//! *mode* (Serial/Parallel/Hybrid) and cross-hook *dependencies* are
//! scheduling concerns owned by the execution manager, not an individual
//! plugin; see `DESIGN.md` for why this split was made.

use std::time::Duration;

/// Timeout and retry policy for one plugin's hook.
#[derive(Debug, Clone, Copy)]
pub struct HookTiming {
    /// Wall-clock budget for a single attempt.
    pub timeout: Duration,
    /// Maximum number of retries after the first attempt, for retryable
    /// failures.
    pub max_retries: u32,
}

impl Default for HookTiming {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_retries: 0,
        }
    }
}
