//! `ExecutionStats`: per hook-plugin pair counters, updated atomically at
//! each hook's completion with no locks in the hot path.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, SystemTime};

const RELAXED: Ordering = Ordering::Relaxed;

/// A small fixed-capacity reservoir used to estimate p95 execution time
/// without keeping an unbounded history.
const RESERVOIR_CAPACITY: usize = 128;

/// Execution statistics for one (hook, plugin) pair.
#[derive(Debug, Default)]
pub struct ExecutionStats {
    total_executions: AtomicU64,
    successful_executions: AtomicU64,
    failed_executions: AtomicU64,
    cancelled_executions: AtomicU64,
    total_duration_micros: AtomicU64,
    has_run: AtomicBool,
    reservoir: RwLock<Vec<u64>>,
    last_error: RwLock<Option<String>>,
    last_executed_at: RwLock<Option<SystemTime>>,
}

/// A point-in-time snapshot of [`ExecutionStats`], safe to serialize or log.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExecutionStatsSnapshot {
    /// Total number of executions recorded.
    pub total_executions: u64,
    /// Executions that completed successfully.
    pub successful_executions: u64,
    /// Executions that failed (including timeouts).
    pub failed_executions: u64,
    /// Executions cancelled before they could complete.
    pub cancelled_executions: u64,
    /// Mean execution time across all recorded executions, in milliseconds.
    pub average_execution_time_ms: f64,
    /// 95th percentile execution time estimate, in milliseconds.
    pub p95_execution_time_ms: f64,
    /// The most recent error message, if any execution has failed.
    pub last_error: Option<String>,
    /// When the most recent execution completed.
    pub last_execution_at: Option<SystemTime>,
}

impl ExecutionStats {
    /// Record a successful execution.
    pub fn record_success(&self, duration: Duration) {
        self.record(duration, true, None);
    }

    /// Record a failed execution with a human-readable reason
    /// (e.g. `"timeout"` for a `HookTimeout`).
    pub fn record_failure(&self, duration: Duration, reason: impl Into<String>) {
        self.failed_executions.fetch_add(1, RELAXED);
        *self.last_error.write().expect("last_error lock poisoned") = Some(reason.into());
        self.record(duration, false, None);
    }

    /// Record a cancelled execution (its result, if any, is discarded).
    pub fn record_cancelled(&self, duration: Duration) {
        self.cancelled_executions.fetch_add(1, RELAXED);
        self.record(duration, false, Some(()));
    }

    fn record(&self, duration: Duration, success: bool, _cancelled_marker: Option<()>) {
        self.total_executions.fetch_add(1, RELAXED);
        if success {
            self.successful_executions.fetch_add(1, RELAXED);
        }
        let micros = duration.as_micros().min(u64::MAX as u128) as u64;
        self.total_duration_micros.fetch_add(micros, RELAXED);
        self.has_run.store(true, RELAXED);
        *self
            .last_executed_at
            .write()
            .expect("last_executed_at lock poisoned") = Some(SystemTime::now());

        let mut reservoir = self.reservoir.write().expect("reservoir lock poisoned");
        if reservoir.len() >= RESERVOIR_CAPACITY {
            reservoir.remove(0);
        }
        reservoir.push(micros);
    }

    /// Take a consistent snapshot of the current counters.
    pub fn snapshot(&self) -> ExecutionStatsSnapshot {
        let total = self.total_executions.load(RELAXED);
        let total_micros = self.total_duration_micros.load(RELAXED);
        let average_ms = if total > 0 {
            (total_micros as f64 / total as f64) / 1000.0
        } else {
            0.0
        };

        let p95_ms = {
            let mut samples = self.reservoir.read().expect("reservoir lock poisoned").clone();
            if samples.is_empty() {
                0.0
            } else {
                samples.sort_unstable();
                let idx = ((samples.len() as f64) * 0.95).ceil() as usize;
                let idx = idx.saturating_sub(1).min(samples.len() - 1);
                samples[idx] as f64 / 1000.0
            }
        };

        ExecutionStatsSnapshot {
            total_executions: total,
            successful_executions: self.successful_executions.load(RELAXED),
            failed_executions: self.failed_executions.load(RELAXED),
            cancelled_executions: self.cancelled_executions.load(RELAXED),
            average_execution_time_ms: average_ms,
            p95_execution_time_ms: p95_ms,
            last_error: self.last_error.read().expect("last_error lock poisoned").clone(),
            last_execution_at: *self
                .last_executed_at
                .read()
                .expect("last_executed_at lock poisoned"),
        }
    }
}
