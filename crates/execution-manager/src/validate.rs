//! `validate_dependencies`: callable independently of execution.

use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use plugin_registry::PluginRegistry;
use std::collections::HashMap;

/// The full set of dependency problems found in a registry, gathered in one
/// pass rather than stopping at the first issue.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DependencyValidation {
    /// Each inner vector is one cycle's member plugin names.
    pub cycles: Vec<Vec<String>>,
    /// `(dependent, missing_dependency)` pairs.
    pub missing: Vec<(String, String)>,
}

impl DependencyValidation {
    /// Whether the registry's dependency graph is well-formed.
    pub fn is_ok(&self) -> bool {
        self.cycles.is_empty() && self.missing.is_empty()
    }
}

/// Validate every plugin's declared dependencies against the registry,
/// independent of resolving an execution order. Returns every cycle and
/// every missing dependency found, not just the first.
pub fn validate_dependencies(registry: &PluginRegistry) -> DependencyValidation {
    let entries = registry.all();
    let names: HashMap<String, petgraph::graph::NodeIndex> = {
        let mut graph_names = HashMap::new();
        let mut graph = DiGraph::<String, ()>::new();
        for entry in &entries {
            let idx = graph.add_node(entry.plugin.name().to_string());
            graph_names.insert(entry.plugin.name().to_string(), idx);
        }
        graph_names
    };

    let mut missing = Vec::new();
    let mut graph = DiGraph::<String, ()>::new();
    let mut node_of = HashMap::new();
    for name in names.keys() {
        node_of.insert(name.clone(), graph.add_node(name.clone()));
    }
    for entry in &entries {
        let dependent = entry.plugin.name().to_string();
        for dep in entry.plugin.dependencies() {
            match node_of.get(&dep) {
                Some(&dep_idx) => {
                    graph.add_edge(node_of[&dependent], dep_idx, ());
                }
                None => missing.push((dependent.clone(), dep)),
            }
        }
    }

    let sccs = tarjan_scc(&graph);
    let cycles = sccs
        .into_iter()
        .filter_map(|component| {
            if component.len() > 1 {
                Some(component.into_iter().map(|idx| graph[idx].clone()).collect())
            } else {
                let idx = component[0];
                if graph.find_edge(idx, idx).is_some() {
                    Some(vec![graph[idx].clone()])
                } else {
                    None
                }
            }
        })
        .collect();

    DependencyValidation { cycles, missing }
}
