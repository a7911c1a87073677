//! Structured logging and performance-statistics aggregation.

mod events;
mod logging;
mod stats;

pub use events::{log_call_end, log_call_start, log_hook_exec, HookOutcomeLabel};
pub use logging::init_subscriber;
pub use stats::{PerformanceConfig, PerformanceReport, PerformanceStats, PluginPerformance};
