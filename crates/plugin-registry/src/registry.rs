//! `PluginRegistry`: holds plugins and resolves execution order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use proxy_core::ExecutionStats;

use crate::plugin::{Plugin, PluginHealth, PluginState};

/// Failure modes for registry mutation / resolution.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A plugin with this name is already registered.
    #[error("plugin `{0}` is already registered")]
    DuplicateName(String),
    /// A plugin declared a dependency that is not registered.
    #[error("plugin `{plugin}` depends on unregistered plugin `{dependency}`")]
    InvalidDependency {
        /// The dependent plugin.
        plugin: String,
        /// The missing dependency.
        dependency: String,
    },
    /// The dependency graph contains a cycle.
    #[error("dependency cycle detected among plugins: {0:?}")]
    Cycle(Vec<String>),
}

/// A registered plugin plus the runtime state the registry/lifecycle
/// manager/execution manager track for it.
pub struct PluginEntry {
    /// The plugin instance.
    pub plugin: Arc<dyn Plugin>,
    state: RwLock<PluginState>,
    health: RwLock<PluginHealth>,
    pub(crate) consecutive_unhealthy: AtomicU32,
    leaked: AtomicBool,
    /// Execution statistics for this plugin's before-hook.
    pub before_stats: ExecutionStats,
    /// Execution statistics for this plugin's after-hook.
    pub after_stats: ExecutionStats,
}

impl PluginEntry {
    fn new(plugin: Arc<dyn Plugin>) -> Self {
        Self {
            plugin,
            state: RwLock::new(PluginState::Registered),
            health: RwLock::new(PluginHealth::Unknown),
            consecutive_unhealthy: AtomicU32::new(0),
            leaked: AtomicBool::new(false),
            before_stats: ExecutionStats::default(),
            after_stats: ExecutionStats::default(),
        }
    }

    /// Mark this plugin as having leaked: its disposal did not complete
    /// within budget.
    pub fn mark_leaked(&self) {
        self.leaked.store(true, Ordering::Relaxed);
    }

    /// Whether this plugin's disposal leaked.
    pub fn is_leaked(&self) -> bool {
        self.leaked.load(Ordering::Relaxed)
    }

    /// Fold a hook execution's outcome into health/state tracking.
    ///
    /// A success resets the consecutive-failure counter and, if the plugin
    /// was Degraded, returns it to Ready on the next successful call. A
    /// failure increments the counter and, once it reaches
    /// `degraded_threshold`, moves a Ready plugin to Degraded.
    pub fn record_hook_result(&self, success: bool, degraded_threshold: u32) {
        if success {
            self.consecutive_unhealthy.store(0, Ordering::Relaxed);
            if self.state() == PluginState::Degraded {
                self.set_state(PluginState::Ready);
                self.set_health(PluginHealth::Healthy);
            }
        } else {
            let n = self.consecutive_unhealthy.fetch_add(1, Ordering::Relaxed) + 1;
            if n >= degraded_threshold && self.state() == PluginState::Ready {
                self.set_state(PluginState::Degraded);
            }
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PluginState {
        *self.state.read().expect("state lock poisoned")
    }

    /// Transition to a new lifecycle state.
    pub fn set_state(&self, state: PluginState) {
        *self.state.write().expect("state lock poisoned") = state;
    }

    /// Current health classification.
    pub fn health(&self) -> PluginHealth {
        *self.health.read().expect("health lock poisoned")
    }

    /// Set the health classification directly.
    pub fn set_health(&self, health: PluginHealth) {
        *self.health.write().expect("health lock poisoned") = health;
    }

    /// Whether this plugin currently participates in hook execution:
    /// initialized and not Degraded/Disposing/Disposed.
    pub fn is_active(&self) -> bool {
        matches!(self.state(), PluginState::Ready)
    }
}

/// Holds plugins and resolves their before/after execution order.
///
/// The resolved order is cached and invalidated on any `register`/
/// `unregister`; reads during a call use a snapshot taken at
/// call start, so mutation mid-call never affects in-flight calls.
pub struct PluginRegistry {
    entries: RwLock<HashMap<String, Arc<PluginEntry>>>,
    cached_order: RwLock<Option<Arc<Vec<String>>>>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            cached_order: RwLock::new(None),
        }
    }

    /// Register a plugin. Dependencies are validated eagerly against the
    /// set of already-registered names; cycle detection happens lazily at
    /// `resolve_order` time since a cycle can only be introduced once all
    /// its members exist.
    pub fn register(&self, plugin: Arc<dyn Plugin>) -> Result<(), RegistryError> {
        let name = plugin.name().to_string();
        let mut entries = self.entries.write().expect("entries lock poisoned");
        if entries.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        for dep in plugin.dependencies() {
            if !entries.contains_key(&dep) {
                return Err(RegistryError::InvalidDependency {
                    plugin: name,
                    dependency: dep,
                });
            }
        }
        entries.insert(name, Arc::new(PluginEntry::new(plugin)));
        drop(entries);
        self.invalidate_cache();
        Ok(())
    }

    /// Remove a plugin by name. Returns whether it was present.
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self
            .entries
            .write()
            .expect("entries lock poisoned")
            .remove(name)
            .is_some();
        if removed {
            self.invalidate_cache();
        }
        removed
    }

    /// Look up a plugin's registry entry by name.
    pub fn get(&self, name: &str) -> Option<Arc<PluginEntry>> {
        self.entries.read().expect("entries lock poisoned").get(name).cloned()
    }

    /// All registered entries, unordered.
    pub fn all(&self) -> Vec<Arc<PluginEntry>> {
        self.entries.read().expect("entries lock poisoned").values().cloned().collect()
    }

    fn invalidate_cache(&self) {
        *self.cached_order.write().expect("cache lock poisoned") = None;
    }

    /// Resolve (and cache) the topological execution order: a topological
    /// sort of the dependency graph (dependent -> dependency edges),
    /// breaking ties within a topological layer by priority descending,
    /// then name ascending.
    pub fn resolve_order(&self) -> Result<Arc<Vec<String>>, RegistryError> {
        if let Some(cached) = self.cached_order.read().expect("cache lock poisoned").clone() {
            return Ok(cached);
        }

        let entries = self.entries.read().expect("entries lock poisoned");
        let mut graph = DiGraph::<String, ()>::new();
        let mut node_of = HashMap::<String, NodeIndex>::new();
        for name in entries.keys() {
            let idx = graph.add_node(name.clone());
            node_of.insert(name.clone(), idx);
        }
        for (name, entry) in entries.iter() {
            let dependent_idx = node_of[name];
            for dep in entry.plugin.dependencies() {
                if let Some(&dep_idx) = node_of.get(&dep) {
                    // dependent -> dependency edge: dependency must sort
                    // before dependent in topological order.
                    graph.add_edge(dependent_idx, dep_idx, ());
                } else {
                    return Err(RegistryError::InvalidDependency {
                        plugin: name.clone(),
                        dependency: dep,
                    });
                }
            }
        }

        // toposort only detects cycles here; the actual order is computed
        // below by a layered pass so priority/name tie-breaks apply within
        // each "ready set" (every plugin whose dependencies already ran).
        toposort(&graph, None).map_err(|cycle| {
            let node = cycle.node_id();
            RegistryError::Cycle(vec![graph[node].clone()])
        })?;

        let priority_of = |n: &str| -> i32 { entries[n].plugin.priority() };
        let mut placed: Vec<String> = Vec::with_capacity(entries.len());
        let mut remaining: Vec<String> = entries.keys().cloned().collect();
        while !remaining.is_empty() {
            let placed_set: std::collections::HashSet<&str> =
                placed.iter().map(|s| s.as_str()).collect();
            let mut ready_idx = Vec::new();
            for (i, name) in remaining.iter().enumerate() {
                let deps_satisfied = entries[name]
                    .plugin
                    .dependencies()
                    .iter()
                    .all(|d| placed_set.contains(d.as_str()));
                if deps_satisfied {
                    ready_idx.push(i);
                }
            }
            let mut ready: Vec<String> = ready_idx.iter().map(|&i| remaining[i].clone()).collect();
            ready.sort_by(|a, b| priority_of(b).cmp(&priority_of(a)).then_with(|| a.cmp(b)));
            for name in &ready {
                placed.push(name.clone());
            }
            let ready_set: std::collections::HashSet<&str> = ready.iter().map(|s| s.as_str()).collect();
            remaining.retain(|n| !ready_set.contains(n.as_str()));
        }

        let result = Arc::new(placed);
        *self.cached_order.write().expect("cache lock poisoned") = Some(result.clone());
        Ok(result)
    }
}
