//! Plugin lifecycle management: `initialize`/`health_check`/`dispose`
//! across every plugin in a registry, plus resource usage reporting.

mod config;
mod lifecycle;
mod resources;

pub use config::LifecycleConfig;
pub use lifecycle::LifecycleManager;
pub use resources::PluginResourceUsage;

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use plugin_registry::{Plugin, PluginRegistry};
    use proxy_core::{ProxyError, ResourceInfo};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct Flaky {
        fail_init: bool,
        disposed: Arc<AtomicBool>,
        resource_leaks_forever: bool,
    }

    #[async_trait]
    impl Plugin for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }
        fn version(&self) -> &str {
            "0.1.0"
        }
        async fn initialize(&self, _ctx: &plugin_registry::PluginInitContext) -> Result<(), ProxyError> {
            if self.fail_init {
                Err(ProxyError::PluginFatal {
                    plugin_name: "flaky".into(),
                    message: "boom".into(),
                })
            } else {
                Ok(())
            }
        }
        async fn dispose(&self) -> Result<(), ProxyError> {
            if self.resource_leaks_forever {
                // Simulate a dispose that never returns within budget.
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            self.disposed.store(true, Ordering::SeqCst);
            Ok(())
        }
        fn get_resources(&self) -> Vec<ResourceInfo> {
            if self.resource_leaks_forever {
                vec![ResourceInfo::new("handle", "h1", "a handle that never gets released")]
            } else {
                vec![]
            }
        }
    }

    struct Clean(Arc<AtomicUsize>);

    #[async_trait]
    impl Plugin for Clean {
        fn name(&self) -> &str {
            "clean"
        }
        fn version(&self) -> &str {
            "0.1.0"
        }
        async fn dispose(&self) -> Result<(), ProxyError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn init_failure_rolls_back_previously_initialized_plugins() {
        let registry = Arc::new(PluginRegistry::new());
        let disposed_count = Arc::new(AtomicUsize::new(0));
        registry.register(Arc::new(Clean(disposed_count.clone()))).unwrap();
        registry
            .register(Arc::new(Flaky {
                fail_init: true,
                disposed: Arc::new(AtomicBool::new(false)),
                resource_leaks_forever: false,
            }))
            .unwrap();

        let manager = LifecycleManager::new(registry, LifecycleConfig::default());
        let err = manager.initialize_all(Default::default()).await.unwrap_err();
        assert!(matches!(err, ProxyError::PluginFatal { .. }));
        assert_eq!(disposed_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dispose_all_is_order_independent_of_failures() {
        let registry = Arc::new(PluginRegistry::new());
        let disposed_count = Arc::new(AtomicUsize::new(0));
        registry.register(Arc::new(Clean(disposed_count.clone()))).unwrap();
        registry
            .register(Arc::new(Flaky {
                fail_init: false,
                disposed: Arc::new(AtomicBool::new(false)),
                resource_leaks_forever: false,
            }))
            .unwrap();

        let manager = LifecycleManager::new(registry, LifecycleConfig::default());
        manager.initialize_all(Default::default()).await.unwrap();
        manager.dispose_all().await;
        assert_eq!(disposed_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn timed_out_disposal_marks_plugin_leaked() {
        let registry = Arc::new(PluginRegistry::new());
        registry
            .register(Arc::new(Flaky {
                fail_init: false,
                disposed: Arc::new(AtomicBool::new(false)),
                resource_leaks_forever: true,
            }))
            .unwrap();

        let mut config = LifecycleConfig::default();
        config.disposal_timeout = Duration::from_millis(10);
        config.disposal_budget = Duration::from_millis(50);
        let manager = LifecycleManager::new(registry.clone(), config);
        manager.initialize_all(Default::default()).await.unwrap();
        manager.dispose_all().await;

        let entry = registry.get("flaky").unwrap();
        assert!(entry.is_leaked());
    }
}
