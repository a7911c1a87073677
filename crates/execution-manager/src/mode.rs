//! Execution mode: how a batch of hooks in one phase is dispatched.

/// Scheduling strategy for a phase's hook batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Hooks run one at a time, in resolved/priority order. A failure in a
    /// non-optional hook aborts the remaining hooks in the phase.
    #[default]
    Serial,
    /// Independent hooks (no mutual dependency) dispatch concurrently.
    /// Completes when all finish or any short-circuits.
    Parallel,
    /// Strongly-connected components of the dependency graph run serially
    /// internally, and independent SCCs run in parallel with each other.
    Hybrid,
}
