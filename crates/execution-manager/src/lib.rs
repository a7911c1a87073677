//! Drives one tool call's hooks against a [`plugin_registry::PluginRegistry`]:
//! ordering, scheduling mode, timeouts/retries, and dependency validation.

mod invoke;
mod mode;
mod runner;
mod scheduler;
mod validate;

pub use mode::ExecutionMode;
pub use runner::{HookRunner, RunnerConfig};
pub use scheduler::{layer_names, run_after_phase, run_before_phase, BeforeBatchOutcome};
pub use validate::{validate_dependencies, DependencyValidation};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use plugin_registry::{HookOutcome, Plugin, PluginRegistry};
    use proxy_core::{HookTiming, ProxyError, ToolCallContext, ToolCallResult};

    struct RecordingPlugin {
        name: &'static str,
        priority: i32,
        deps: Vec<String>,
        calls: Arc<std::sync::Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Plugin for RecordingPlugin {
        fn name(&self) -> &str {
            self.name
        }
        fn version(&self) -> &str {
            "0.1.0"
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn dependencies(&self) -> Vec<String> {
            self.deps.clone()
        }
        async fn before_tool_call(&self, _ctx: &ToolCallContext) -> Result<HookOutcome, ProxyError> {
            self.calls.lock().unwrap().push(self.name.to_string());
            Ok(HookOutcome::Continue)
        }
    }

    fn registry_with(names: &[(&'static str, i32, Vec<&'static str>)], calls: Arc<std::sync::Mutex<Vec<String>>>) -> PluginRegistry {
        let registry = PluginRegistry::new();
        for (name, priority, deps) in names {
            registry
                .register(Arc::new(RecordingPlugin {
                    name,
                    priority: *priority,
                    deps: deps.iter().map(|s| s.to_string()).collect(),
                    calls: calls.clone(),
                }))
                .unwrap();
        }
        registry
    }

    #[tokio::test]
    async fn serial_runs_in_priority_order() {
        let calls = Arc::new(std::sync::Mutex::new(Vec::new()));
        let registry = Arc::new(registry_with(
            &[("a", 10, vec![]), ("b", 5, vec![]), ("c", 5, vec!["b"])],
            calls.clone(),
        ));
        let runner = HookRunner::new(registry, RunnerConfig::default());
        let ctx = ToolCallContext::new("echo", Default::default(), Default::default());
        let result = runner.run(ctx, |_ctx| async { Ok(ToolCallResult::text("ok")) }).await.unwrap();
        assert!(!result.is_error);
        assert_eq!(*calls.lock().unwrap(), vec!["a", "b", "c"]);
    }

    struct ShortCircuiter;

    #[async_trait]
    impl Plugin for ShortCircuiter {
        fn name(&self) -> &str {
            "short-circuiter"
        }
        fn version(&self) -> &str {
            "0.1.0"
        }
        async fn before_tool_call(&self, _ctx: &ToolCallContext) -> Result<HookOutcome, ProxyError> {
            Ok(HookOutcome::ShortCircuit(ToolCallResult::text("blocked")))
        }
    }

    struct HandlerCalled(Arc<AtomicU32>);

    #[tokio::test]
    async fn short_circuit_skips_the_handler() {
        let registry = Arc::new(PluginRegistry::new());
        registry.register(Arc::new(ShortCircuiter)).unwrap();
        let runner = HookRunner::new(registry, RunnerConfig::default());
        let ctx = ToolCallContext::new("echo", Default::default(), Default::default());
        let handler_calls = Arc::new(AtomicU32::new(0));
        let marker = HandlerCalled(handler_calls.clone());
        let result = runner
            .run(ctx, move |_ctx| {
                let HandlerCalled(counter) = &marker;
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(ToolCallResult::text("should not run")) }
            })
            .await
            .unwrap();
        assert_eq!(result.content[0].as_text(), Some("blocked"));
        assert_eq!(handler_calls.load(Ordering::SeqCst), 0);
    }

    struct AlwaysFails;

    #[async_trait]
    impl Plugin for AlwaysFails {
        fn name(&self) -> &str {
            "always-fails"
        }
        fn version(&self) -> &str {
            "0.1.0"
        }
        async fn before_tool_call(&self, _ctx: &ToolCallContext) -> Result<HookOutcome, ProxyError> {
            Err(ProxyError::Hook {
                plugin_name: self.name().to_string(),
                phase: "before",
                message: "boom".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn failing_before_hook_is_isolated_by_default() {
        let registry = Arc::new(PluginRegistry::new());
        registry.register(Arc::new(AlwaysFails)).unwrap();
        let runner = HookRunner::new(registry, RunnerConfig::default());
        let ctx = ToolCallContext::new("echo", Default::default(), Default::default());
        let result = runner.run(ctx, |_ctx| async { Ok(ToolCallResult::text("handled")) }).await.unwrap();
        assert_eq!(result.content[0].as_text(), Some("handled"));
    }

    #[tokio::test]
    async fn failing_before_hook_aborts_when_fail_fast() {
        let registry = Arc::new(PluginRegistry::new());
        registry.register(Arc::new(AlwaysFails)).unwrap();
        let config = RunnerConfig {
            fail_fast: true,
            ..RunnerConfig::default()
        };
        let runner = HookRunner::new(registry, config);
        let ctx = ToolCallContext::new("echo", Default::default(), Default::default());
        // Aborting still runs the after phase and reports completion; the
        // failure surfaces as an error result, not a propagated `Err`.
        let result = runner.run(ctx, |_ctx| async { Ok(ToolCallResult::text("handled")) }).await.unwrap();
        assert!(result.is_error);
    }

    struct SlowPlugin;

    #[async_trait]
    impl Plugin for SlowPlugin {
        fn name(&self) -> &str {
            "slow"
        }
        fn version(&self) -> &str {
            "0.1.0"
        }
        fn timing(&self) -> HookTiming {
            HookTiming {
                timeout: Duration::from_millis(10),
                max_retries: 0,
            }
        }
        async fn before_tool_call(&self, _ctx: &ToolCallContext) -> Result<HookOutcome, ProxyError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(HookOutcome::Continue)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn call_cap_exceeded_records_cancelled_stats() {
        let calls = Arc::new(std::sync::Mutex::new(Vec::new()));
        let registry = Arc::new(registry_with(&[("a", 10, vec![])], calls.clone()));
        let entry = registry.get("a").unwrap();
        let config = RunnerConfig {
            max_execution_time_ms: Some(10),
            ..RunnerConfig::default()
        };
        let runner = HookRunner::new(registry, config);
        let ctx = ToolCallContext::new("echo", Default::default(), Default::default());
        let handle = tokio::spawn(async move {
            runner
                .run(ctx, |_ctx| async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok(ToolCallResult::text("too slow"))
                })
                .await
        });
        tokio::time::advance(Duration::from_millis(50)).await;
        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, ProxyError::CallCapExceeded { .. }));
        assert_eq!(entry.before_stats.snapshot().cancelled_executions, 1);
        assert_eq!(entry.after_stats.snapshot().cancelled_executions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn before_hook_timeout_is_isolated_and_logged() {
        let registry = Arc::new(PluginRegistry::new());
        registry.register(Arc::new(SlowPlugin)).unwrap();
        let runner = HookRunner::new(registry, RunnerConfig::default());
        let ctx = ToolCallContext::new("echo", Default::default(), Default::default());
        let handle = tokio::spawn(async move {
            runner.run(ctx, |_ctx| async { Ok(ToolCallResult::text("handled")) }).await
        });
        tokio::time::advance(Duration::from_millis(250)).await;
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.content[0].as_text(), Some("handled"));
    }

    struct MutatingPlugin {
        name: &'static str,
    }

    #[async_trait]
    impl Plugin for MutatingPlugin {
        fn name(&self) -> &str {
            self.name
        }
        fn version(&self) -> &str {
            "0.1.0"
        }
        async fn before_tool_call(&self, ctx: &ToolCallContext) -> Result<HookOutcome, ProxyError> {
            let mut args = ctx.snapshot_args();
            args.insert(self.name.to_string(), serde_json::json!(true));
            let _ = ctx.apply_args(args);
            Ok(HookOutcome::Continue)
        }
    }

    #[tokio::test]
    async fn parallel_mode_discards_sibling_arg_mutations() {
        let registry = Arc::new(PluginRegistry::new());
        registry.register(Arc::new(MutatingPlugin { name: "m1" })).unwrap();
        registry.register(Arc::new(MutatingPlugin { name: "m2" })).unwrap();
        let config = RunnerConfig {
            mode: ExecutionMode::Parallel,
            ..RunnerConfig::default()
        };
        let runner = HookRunner::new(registry, config);
        let ctx = ToolCallContext::new("echo", Default::default(), Default::default());
        let ctx_for_handler = ctx.clone();
        runner
            .run(ctx, move |_ctx| {
                let seen = ctx_for_handler.snapshot_args();
                async move {
                    assert!(seen.get("m1").is_none());
                    assert!(seen.get("m2").is_none());
                    Ok(ToolCallResult::text("ok"))
                }
            })
            .await
            .unwrap();
    }

    #[test]
    fn layering_groups_independent_plugins_together() {
        let calls = Arc::new(std::sync::Mutex::new(Vec::new()));
        let registry = registry_with(&[("a", 0, vec![]), ("b", 0, vec![]), ("c", 0, vec!["a", "b"])], calls);
        let order = registry.resolve_order().unwrap();
        let layers = layer_names(&order, &registry);
        assert_eq!(layers.len(), 2);
        let mut first_layer = layers[0].clone();
        first_layer.sort();
        assert_eq!(first_layer, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(layers[1], vec!["c".to_string()]);
    }

    struct AfterRecordingPlugin {
        name: &'static str,
        priority: i32,
        reverse_after: bool,
        calls: Arc<std::sync::Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Plugin for AfterRecordingPlugin {
        fn name(&self) -> &str {
            self.name
        }
        fn version(&self) -> &str {
            "0.1.0"
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn config(&self) -> plugin_registry::PluginConfig {
            plugin_registry::PluginConfig {
                reverse_after: self.reverse_after,
                ..Default::default()
            }
        }
        async fn after_tool_call(&self, _ctx: &ToolCallContext, result: ToolCallResult) -> Result<ToolCallResult, ProxyError> {
            self.calls.lock().unwrap().push(self.name.to_string());
            Ok(result)
        }
    }

    #[tokio::test]
    async fn after_phase_runs_in_reverse_of_before_order_by_default() {
        let calls = Arc::new(std::sync::Mutex::new(Vec::new()));
        let registry = Arc::new(PluginRegistry::new());
        registry
            .register(Arc::new(AfterRecordingPlugin { name: "a", priority: 10, reverse_after: true, calls: calls.clone() }))
            .unwrap();
        registry
            .register(Arc::new(AfterRecordingPlugin { name: "b", priority: 5, reverse_after: true, calls: calls.clone() }))
            .unwrap();
        registry
            .register(Arc::new(AfterRecordingPlugin { name: "c", priority: 0, reverse_after: true, calls: calls.clone() }))
            .unwrap();
        let runner = HookRunner::new(registry, RunnerConfig::default());
        let ctx = ToolCallContext::new("echo", Default::default(), Default::default());
        runner.run(ctx, |_ctx| async { Ok(ToolCallResult::text("ok")) }).await.unwrap();
        // before order is a, b, c (priority descending); after must be reversed.
        assert_eq!(*calls.lock().unwrap(), vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn reverse_after_false_keeps_a_plugin_in_its_forward_slot() {
        let calls = Arc::new(std::sync::Mutex::new(Vec::new()));
        let registry = Arc::new(PluginRegistry::new());
        registry
            .register(Arc::new(AfterRecordingPlugin { name: "a", priority: 10, reverse_after: true, calls: calls.clone() }))
            .unwrap();
        registry
            .register(Arc::new(AfterRecordingPlugin { name: "b", priority: 7, reverse_after: false, calls: calls.clone() }))
            .unwrap();
        registry
            .register(Arc::new(AfterRecordingPlugin { name: "c", priority: 5, reverse_after: true, calls: calls.clone() }))
            .unwrap();
        registry
            .register(Arc::new(AfterRecordingPlugin { name: "d", priority: 0, reverse_after: true, calls: calls.clone() }))
            .unwrap();
        let runner = HookRunner::new(registry, RunnerConfig::default());
        let ctx = ToolCallContext::new("echo", Default::default(), Default::default());
        runner.run(ctx, |_ctx| async { Ok(ToolCallResult::text("ok")) }).await.unwrap();
        // before order is a, b, c, d. b opts out of reversal and stays in
        // slot 1; a, c, d (the reversible ones) reverse among themselves,
        // so the result is NOT the naive full reversal (d, c, b, a).
        assert_eq!(*calls.lock().unwrap(), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn validate_dependencies_reports_missing_and_cycles() {
        let registry = PluginRegistry::new();
        registry
            .register(Arc::new(RecordingPlugin {
                name: "a",
                priority: 0,
                deps: vec![],
                calls: Arc::new(std::sync::Mutex::new(Vec::new())),
            }))
            .unwrap();
        let report = validate_dependencies(&registry);
        assert!(report.is_ok());
    }
}
