//! Dispatch a phase's hook batch under Serial/Parallel/Hybrid.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use plugin_registry::{PluginEntry, PluginRegistry};
use proxy_core::{ProxyError, ToolCallContext, ToolCallResult};
use tracing::warn;

use crate::invoke::{invoke_after, invoke_before, BeforeHookResult};
use crate::mode::ExecutionMode;

/// Group `names` into dependency layers: layer 0 has no dependencies
/// (within this set), layer N's members depend only on layers `< N`.
/// Independent SCCs/nodes within a layer may run concurrently; since the
/// registry rejects cyclic dependencies at registration time, every SCC in
/// practice is a single node, so this layering already realizes "Hybrid"
/// (SCC-serial-internally is a no-op on a singleton, and independent SCCs
/// are exactly the members of a layer).
pub fn layer_names(names: &[String], registry: &PluginRegistry) -> Vec<Vec<String>> {
    let name_set: HashSet<&str> = names.iter().map(|s| s.as_str()).collect();
    let mut placed: HashSet<String> = HashSet::new();
    let mut remaining: Vec<String> = names.to_vec();
    let mut layers = Vec::new();

    while !remaining.is_empty() {
        let mut layer = Vec::new();
        for name in &remaining {
            let Some(entry) = registry.get(name) else { continue };
            let ready = entry
                .plugin
                .dependencies()
                .iter()
                .filter(|d| name_set.contains(d.as_str()))
                .all(|d| placed.contains(d.as_str()));
            if ready {
                layer.push(name.clone());
            }
        }
        if layer.is_empty() {
            // Shouldn't happen for an acyclic graph; avoid an infinite loop.
            layer = remaining.clone();
        }
        for n in &layer {
            placed.insert(n.clone());
        }
        let layer_set: HashSet<&str> = layer.iter().map(|s| s.as_str()).collect();
        remaining.retain(|n| !layer_set.contains(n.as_str()));
        layers.push(layer);
    }
    layers
}

/// What running a before-phase batch produced.
pub enum BeforeBatchOutcome {
    /// Every hook ran (or was skipped by filtering); the call proceeds.
    Continue,
    /// A hook short-circuited; carries the winning result.
    ShortCircuit(ToolCallResult),
    /// A non-optional hook failed and `fail_fast` is set.
    Aborted(ProxyError),
}

fn active_entries(names: &[String], registry: &PluginRegistry, ctx: &ToolCallContext) -> Vec<Arc<PluginEntry>> {
    names
        .iter()
        .filter_map(|n| registry.get(n))
        .filter(|e| e.is_active())
        .filter(|e| e.plugin.config().applies_to(&ctx.tool_name))
        .filter(|e| e.plugin.should_run(ctx))
        .collect()
}

/// The after-phase's execution order: the resolved (before-phase) order,
/// reversed — except a plugin whose `config().reverse_after` is `false`
/// keeps its original slot instead of being reversed into it. Plugins that
/// opt out are left untouched; the rest are reversed only among themselves.
fn after_order(names: &[String], registry: &PluginRegistry) -> Vec<String> {
    let mut order = names.to_vec();
    let reversible: Vec<usize> = names
        .iter()
        .enumerate()
        .filter(|(_, name)| {
            registry
                .get(name)
                .map(|e| e.plugin.config().reverse_after)
                .unwrap_or(true)
        })
        .map(|(i, _)| i)
        .collect();
    let reversed_values: Vec<String> = reversible.iter().rev().map(|&i| names[i].clone()).collect();
    for (slot, value) in reversible.into_iter().zip(reversed_values) {
        order[slot] = value;
    }
    order
}

/// Run the before phase over `names` (already resolved order) under `mode`.
pub async fn run_before_phase(
    names: &[String],
    registry: &PluginRegistry,
    ctx: &ToolCallContext,
    mode: ExecutionMode,
    fail_fast: bool,
    degraded_threshold: u32,
) -> BeforeBatchOutcome {
    match mode {
        ExecutionMode::Serial => run_before_serial(names, registry, ctx, fail_fast, degraded_threshold).await,
        ExecutionMode::Parallel | ExecutionMode::Hybrid => {
            run_before_layered(names, registry, ctx, fail_fast, degraded_threshold).await
        }
    }
}

async fn run_before_serial(
    names: &[String],
    registry: &PluginRegistry,
    ctx: &ToolCallContext,
    fail_fast: bool,
    degraded_threshold: u32,
) -> BeforeBatchOutcome {
    for entry in active_entries(names, registry, ctx) {
        match invoke_before(&entry, ctx, degraded_threshold).await {
            BeforeHookResult::Ran(Ok(())) => {}
            BeforeHookResult::Ran(Err(err)) => {
                if fail_fast {
                    return BeforeBatchOutcome::Aborted(err);
                }
                warn!(plugin = %entry.plugin.name(), error = %err, "before-hook failed; isolating");
            }
            BeforeHookResult::ShortCircuit(result) => {
                return BeforeBatchOutcome::ShortCircuit(result);
            }
        }
    }
    BeforeBatchOutcome::Continue
}

async fn run_before_layered(
    names: &[String],
    registry: &PluginRegistry,
    ctx: &ToolCallContext,
    fail_fast: bool,
    degraded_threshold: u32,
) -> BeforeBatchOutcome {
    let layers = layer_names(names, registry);
    let pre_snapshot = ctx.snapshot_args();

    for layer in layers {
        let entries = active_entries(&layer, registry, ctx);
        if entries.is_empty() {
            continue;
        }

        let scoped_ctx = ctx.scoped_for_parallel_hook();
        let futures = entries.iter().map(|entry| {
            let scoped_ctx = scoped_ctx.clone();
            let entry = entry.clone();
            async move {
                let result = invoke_before(&entry, &scoped_ctx, degraded_threshold).await;
                (entry, result)
            }
        });
        let results = join_all(futures).await;

        // Detect and discard any attempted arg mutation from this layer.
        if scoped_ctx.snapshot_args() != pre_snapshot {
            warn!("a Parallel-mode before-hook mutated context.args; discarding the write");
        }

        let mut short_circuits: Vec<(i32, String, ToolCallResult)> = Vec::new();
        let mut first_error: Option<ProxyError> = None;
        for (entry, result) in results {
            match result {
                BeforeHookResult::Ran(Ok(())) => {}
                BeforeHookResult::Ran(Err(err)) => {
                    warn!(plugin = %entry.plugin.name(), error = %err, "before-hook failed");
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
                BeforeHookResult::ShortCircuit(result) => {
                    short_circuits.push((entry.plugin.priority(), entry.plugin.name().to_string(), result));
                }
            }
        }

        if !short_circuits.is_empty() {
            short_circuits.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
            return BeforeBatchOutcome::ShortCircuit(short_circuits.into_iter().next().unwrap().2);
        }
        if let Some(err) = first_error {
            if fail_fast {
                return BeforeBatchOutcome::Aborted(err);
            }
        }
    }
    BeforeBatchOutcome::Continue
}

/// Run the after phase over `names` in the configured order: the reverse of
/// the before-phase's resolved order by default, honoring each plugin's
/// `reverse_after` opt-out (see [`after_order`]). After-hook failures are
/// always isolated: the prior result is kept and the next hook still runs.
pub async fn run_after_phase(
    names: &[String],
    registry: &PluginRegistry,
    ctx: &ToolCallContext,
    mode: ExecutionMode,
    degraded_threshold: u32,
    mut result: ToolCallResult,
) -> ToolCallResult {
    match mode {
        ExecutionMode::Serial => {
            for entry in active_entries(&after_order(names, registry), registry, ctx) {
                result = invoke_after(&entry, ctx, result, degraded_threshold).await;
            }
            result
        }
        ExecutionMode::Parallel | ExecutionMode::Hybrid => {
            // After-hooks mutate a shared result sequentially even under
            // Parallel/Hybrid: each hook's transformation composes with the
            // last, which only makes sense run one at a time. Parallelism
            // in this phase instead overlaps hooks that don't depend on one
            // another by still walking layers — in reverse layer order, to
            // mirror the before-phase's dependency-first ordering — while
            // applying each layer's hooks serially within the layer to
            // avoid racing result writes.
            let layers = layer_names(names, registry);
            for layer in layers.into_iter().rev() {
                for entry in active_entries(&after_order(&layer, registry), registry, ctx) {
                    result = invoke_after(&entry, ctx, result, degraded_threshold).await;
                }
            }
            result
        }
    }
}
