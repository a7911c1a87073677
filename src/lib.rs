//! Facade crate: re-exports the interception layer's public surface so a
//! host only needs one dependency, plus the `wrap-demo` CLI built on top
//! of it.

pub use mcp_interceptor::{
    tool_handler, wrap, wrap_tool, GlobalAfterHook, GlobalBeforeHook, GlobalErrorHook, GlobalHooks, LifecycleEvent,
    LifecycleEventSource, LifecycleOptions, ToolHandler, ToolServer, WrapOptions, WrapperHandle,
};
pub use observability::{PerformanceConfig, PerformanceReport};
pub use proxy_security::SecurityConfig;

pub mod config;
