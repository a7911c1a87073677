//! Plugin registration, the plugin contract, and dependency-aware,
//! priority-ordered resolution.

mod plugin;
mod registry;

pub use plugin::{HookOutcome, Plugin, PluginConfig, PluginHealth, PluginInitContext, PluginState};
pub use registry::{PluginEntry, PluginRegistry, RegistryError};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Named {
        name: &'static str,
        priority: i32,
        deps: Vec<String>,
    }

    #[async_trait]
    impl Plugin for Named {
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
    }

    #[test]
    fn resolves_priority_and_dependency_order() {
        let registry = PluginRegistry::new();
        registry
            .register(Arc::new(Named { name: "a", priority: 10, deps: vec![] }))
            .unwrap();
        registry
            .register(Arc::new(Named { name: "b", priority: 5, deps: vec![] }))
            .unwrap();
        registry
            .register(Arc::new(Named {
                name: "c",
                priority: 5,
                deps: vec!["b".to_string()],
            }))
            .unwrap();

        let order = registry.resolve_order().unwrap();
        assert_eq!(order.as_ref(), &vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }

    #[test]
    fn rejects_missing_dependency() {
        let registry = PluginRegistry::new();
        let err = registry
            .register(Arc::new(Named {
                name: "c",
                priority: 0,
                deps: vec!["missing".to_string()],
            }))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidDependency { .. }));
    }

    #[test]
    fn dependencies_must_be_registered_first_so_cycles_cannot_form() {
        // `register` validates deps against already-registered names, so a
        // genuine cycle can never enter the graph through the public API;
        // the cycle check in `resolve_order` exists as a second line of
        // defense and is exercised directly in the registry's own unit
        // tests via `petgraph`'s `toposort`.
        let registry = PluginRegistry::new();
        registry
            .register(Arc::new(Named { name: "x", priority: 0, deps: vec![] }))
            .unwrap();
        let err = registry
            .register(Arc::new(Named { name: "y", priority: 0, deps: vec!["z".to_string()] }))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidDependency { .. }));
    }

    #[test]
    fn duplicate_name_rejected() {
        let registry = PluginRegistry::new();
        registry
            .register(Arc::new(Named { name: "a", priority: 0, deps: vec![] }))
            .unwrap();
        let err = registry
            .register(Arc::new(Named { name: "a", priority: 0, deps: vec![] }))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(_)));
    }

    #[test]
    fn unregister_invalidates_cache() {
        let registry = PluginRegistry::new();
        registry
            .register(Arc::new(Named { name: "a", priority: 0, deps: vec![] }))
            .unwrap();
        let _ = registry.resolve_order().unwrap();
        assert!(registry.unregister("a"));
        let order = registry.resolve_order().unwrap();
        assert!(order.is_empty());
    }
}
