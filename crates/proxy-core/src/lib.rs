//! Shared types for the MCP interception pipeline: the per-call context
//! (`ToolCallContext`), the result it produces (`ToolCallResult`), the
//! error taxonomy plugins and hooks fail with, and the cooperative
//! cancellation signal attached to every call.

mod cancellation;
mod context;
mod error;
mod resource;
mod result;
mod stats;
mod timing;

pub use cancellation::CancellationSignal;
pub use context::{ArgsFrozenError, ToolCallContext};
pub use error::ProxyError;
pub use resource::ResourceInfo;
pub use result::{ContentPart, ToolCallResult};
pub use stats::{ExecutionStats, ExecutionStatsSnapshot};
pub use timing::HookTiming;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_ids_are_unique() {
        let mut ids = std::collections::HashSet::new();
        for _ in 0..1000 {
            let ctx = ToolCallContext::new("echo", Default::default(), Default::default());
            assert!(ids.insert(ctx.request_id.clone()));
        }
    }

    #[test]
    fn args_mutation_rejected_after_freeze() {
        let ctx = ToolCallContext::new("echo", Default::default(), Default::default());
        ctx.freeze_args();
        let mut next = ctx.snapshot_args();
        next.insert("x".into(), json!(1));
        assert!(ctx.apply_args(next).is_err());
    }

    #[test]
    fn args_mutation_allowed_before_freeze() {
        let ctx = ToolCallContext::new("echo", Default::default(), Default::default());
        let mut next = ctx.snapshot_args();
        next.insert("x".into(), json!(1));
        assert!(ctx.apply_args(next).is_ok());
        assert_eq!(ctx.snapshot_args().get("x"), Some(&json!(1)));
    }

    #[test]
    fn well_formed_result_invariant() {
        assert!(!ToolCallResult::default().is_well_formed());
        assert!(ToolCallResult::text("hi").is_well_formed());
        assert!(ToolCallResult::error("oops").is_well_formed());
    }
}
