//! The minimal `tool(name, schema, handler)` registration surface the
//! interception layer wraps.
//!
//! A concrete MCP server implementation is expected to hand the layer a
//! type implementing this trait; `mock-server` is one such implementation,
//! used here and in the demo binary.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use proxy_core::{ProxyError, ToolCallContext, ToolCallResult};
use serde_json::Value;

/// A tool's original implementation: takes the call context, returns its
/// result (or an error, converted to an error result at the boundary).
pub type ToolHandler = Arc<
    dyn Fn(ToolCallContext) -> Pin<Box<dyn Future<Output = Result<ToolCallResult, ProxyError>> + Send>> + Send + Sync,
>;

/// Build a [`ToolHandler`] from an async closure.
pub fn tool_handler<F, Fut>(f: F) -> ToolHandler
where
    F: Fn(ToolCallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ToolCallResult, ProxyError>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// The server-side surface the interception layer needs: register a tool,
/// and — best-effort — enumerate and rewrite handlers registered before
/// wrapping.
pub trait ToolServer: Send + Sync {
    /// Register (or replace) a tool's handler and declared schema.
    fn register_tool(&self, name: &str, schema: Value, handler: ToolHandler);

    /// Every tool name currently registered, or `None` if this server's
    /// registry is encapsulated and cannot be enumerated.
    fn registered_tool_names(&self) -> Option<Vec<String>>;

    /// Replace the handler already registered at `name` with
    /// `wrap(original_handler)`, for retrofitting interception onto a tool
    /// registered before `wrap()` was called. Returns whether `name` was
    /// found; always returns `false` if the registry is encapsulated.
    fn wrap_existing_handler(&self, name: &str, wrap: &dyn Fn(ToolHandler) -> ToolHandler) -> bool;
}
