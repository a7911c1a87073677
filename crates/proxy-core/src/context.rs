//! `ToolCallContext`: the immutable-per-call bundle threaded through the pipeline.

use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use serde_json::{Map, Value};

use crate::cancellation::CancellationSignal;

/// Raised when a hook attempts to mutate `args` after the freeze point
/// (after the before phase) or from a Parallel-mode hook.
///
/// Mutating arguments past the freeze point is rejected unconditionally;
/// this crate leaves the decision of how loudly to report it (panic vs.
/// log) to the caller, since that's a scheduling concern owned by the
/// execution manager, not the context itself.
#[derive(Debug, Clone)]
pub struct ArgsFrozenError;

impl fmt::Display for ArgsFrozenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempted to mutate frozen tool call arguments")
    }
}

impl std::error::Error for ArgsFrozenError {}

struct ArgsSlot {
    values: Map<String, Value>,
    frozen: bool,
}

/// The per-call context passed to every hook and the original handler.
///
/// `request_id` is unique within the lifetime of a wrapper instance,
/// generated as a v4 UUID at construction time.
#[derive(Clone)]
pub struct ToolCallContext {
    /// Name of the tool being called.
    pub tool_name: String,
    args: Arc<RwLock<ArgsSlot>>,
    /// Transport-supplied, read-only extras (e.g. auth headers).
    pub extra: Map<String, Value>,
    metadata: Arc<RwLock<Map<String, Value>>>,
    /// Unique id for this call.
    pub request_id: String,
    /// Monotonic start time, used for duration accounting.
    pub started_at: Instant,
    /// Cooperative cancellation signal for this call.
    pub cancellation: CancellationSignal,
    /// Request-scoped tracing span; hook execution happens inside it so
    /// structured fields (`request_id`, `tool_name`) attach automatically.
    pub span: tracing::Span,
}

impl ToolCallContext {
    /// Construct a new context for an incoming call.
    pub fn new(tool_name: impl Into<String>, args: Map<String, Value>, extra: Map<String, Value>) -> Self {
        let tool_name = tool_name.into();
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("tool_call", tool = %tool_name, request_id = %request_id);
        Self {
            tool_name,
            args: Arc::new(RwLock::new(ArgsSlot {
                values: args,
                frozen: false,
            })),
            extra,
            metadata: Arc::new(RwLock::new(Map::new())),
            request_id,
            started_at: Instant::now(),
            cancellation: CancellationSignal::new(),
            span,
        }
    }

    /// Merge wrapper-global metadata in at construction time (from
    /// `WrapOptions::metadata`), before any plugin hook runs.
    pub fn with_global_metadata(self, global: Map<String, Value>) -> Self {
        {
            let mut guard = self.metadata.write().expect("metadata lock poisoned");
            for (k, v) in global {
                guard.insert(k, v);
            }
        }
        self
    }

    /// A clone of the current arguments. Used as the input each hook
    /// operates on; in Parallel mode each hook gets an independent clone so
    /// concurrent writes can never interleave.
    pub fn snapshot_args(&self) -> Map<String, Value> {
        self.args.read().expect("args lock poisoned").values.clone()
    }

    /// Write a possibly-modified copy of the arguments back into the
    /// context. Fails if the arguments are already frozen.
    pub fn apply_args(&self, new_values: Map<String, Value>) -> Result<(), ArgsFrozenError> {
        let mut guard = self.args.write().expect("args lock poisoned");
        if guard.frozen {
            return Err(ArgsFrozenError);
        }
        guard.values = new_values;
        Ok(())
    }

    /// Freeze the arguments; all subsequent `apply_args` calls fail. Called
    /// once the before phase completes.
    pub fn freeze_args(&self) {
        self.args.write().expect("args lock poisoned").frozen = true;
    }

    /// Whether the arguments are frozen.
    pub fn is_frozen(&self) -> bool {
        self.args.read().expect("args lock poisoned").frozen
    }

    /// Read a metadata value.
    pub fn get_metadata(&self, key: &str) -> Option<Value> {
        self.metadata.read().expect("metadata lock poisoned").get(key).cloned()
    }

    /// Insert a metadata value. Safe to call concurrently from Parallel-mode
    /// hooks: metadata, unlike `args`, is not subject to the parallel-write
    /// restriction that applies to argument mutation.
    pub fn set_metadata(&self, key: impl Into<String>, value: Value) {
        self.metadata
            .write()
            .expect("metadata lock poisoned")
            .insert(key.into(), value);
    }

    /// A context clone whose `args` is an independent copy, seeded with the
    /// current values. Used to run a Parallel-mode before-hook against a
    /// private view: writes the hook makes never reach the shared context,
    /// so they can be diffed and discarded afterward instead of racing
    /// with sibling hooks.
    pub fn scoped_for_parallel_hook(&self) -> Self {
        let values = self.snapshot_args();
        let frozen = self.is_frozen();
        Self {
            tool_name: self.tool_name.clone(),
            args: Arc::new(RwLock::new(ArgsSlot { values, frozen })),
            extra: self.extra.clone(),
            metadata: self.metadata.clone(),
            request_id: self.request_id.clone(),
            started_at: self.started_at,
            cancellation: self.cancellation.clone(),
            span: self.span.clone(),
        }
    }

    /// A clone of the full metadata map, e.g. for logging.
    pub fn metadata_snapshot(&self) -> Map<String, Value> {
        self.metadata.read().expect("metadata lock poisoned").clone()
    }

    /// Elapsed time since the call started.
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

impl fmt::Debug for ToolCallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolCallContext")
            .field("tool_name", &self.tool_name)
            .field("request_id", &self.request_id)
            .field("frozen", &self.is_frozen())
            .finish()
    }
}
