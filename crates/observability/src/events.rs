//! The three structured events every call emits: `call.start`,
//! `hook.exec`, `call.end`.

/// Outcome classification for a single hook execution, used as the
/// `outcome` field on `hook.exec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcomeLabel {
    /// The hook ran and returned normally.
    Success,
    /// The hook returned an error.
    Failure,
    /// The hook exceeded its timeout.
    Timeout,
    /// The hook short-circuited the call.
    ShortCircuit,
}

impl HookOutcomeLabel {
    fn as_str(self) -> &'static str {
        match self {
            HookOutcomeLabel::Success => "success",
            HookOutcomeLabel::Failure => "failure",
            HookOutcomeLabel::Timeout => "timeout",
            HookOutcomeLabel::ShortCircuit => "short_circuit",
        }
    }
}

/// Emit `call.start {requestId, toolName}`.
pub fn log_call_start(request_id: &str, tool_name: &str) {
    tracing::info!(request_id, tool_name, "call.start");
}

/// Emit `hook.exec {requestId, pluginName, phase, durationMs, outcome}`.
pub fn log_hook_exec(request_id: &str, plugin_name: &str, phase: &str, duration_ms: u64, outcome: HookOutcomeLabel) {
    tracing::debug!(
        request_id,
        plugin_name,
        phase,
        duration_ms,
        outcome = outcome.as_str(),
        "hook.exec"
    );
}

/// Emit `call.end {requestId, durationMs, isError, shortCircuited}`.
pub fn log_call_end(request_id: &str, duration_ms: u64, is_error: bool, short_circuited: bool) {
    tracing::info!(
        request_id,
        duration_ms,
        is_error,
        short_circuited,
        "call.end"
    );
}
