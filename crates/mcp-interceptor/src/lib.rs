//! Ties the registry, lifecycle manager, hook runner, and security gate
//! into `wrap(server, options)`: the single entry point that turns a plain
//! [`ToolServer`] into an intercepted one.

mod events;
mod global_hooks;
mod options;
mod target;
mod wrapper;
mod wrapper_registry;

pub use events::{LifecycleEvent, LifecycleEventSource};
pub use options::{GlobalAfterHook, GlobalBeforeHook, GlobalErrorHook, GlobalHooks, LifecycleOptions, WrapOptions};
pub use target::{tool_handler, ToolHandler, ToolServer};
pub use wrapper::{wrap, wrap_tool, WrapperHandle};
