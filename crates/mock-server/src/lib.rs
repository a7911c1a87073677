//! An in-memory `ToolServer` for exercising the interception layer without
//! a real transport, used by `mcp-interceptor`'s own tests and the demo
//! binary.

use std::collections::HashMap;
use std::sync::Mutex;

use mcp_interceptor::{ToolHandler, ToolServer};
use proxy_core::{ProxyError, ToolCallContext, ToolCallResult};
use serde_json::{Map, Value};

struct Registration {
    schema: Value,
    handler: ToolHandler,
}

/// A server whose tool registry lives entirely in a `Mutex<HashMap<...>>`.
/// Tools can be registered both before and after wrapping; `call_tool`
/// drives a call through whatever handler is currently installed.
#[derive(Default)]
pub struct MockServer {
    tools: Mutex<HashMap<String, Registration>>,
}

impl MockServer {
    /// An empty server with no tools registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke the handler currently installed for `name`, as a client would.
    pub async fn call_tool(
        &self,
        name: &str,
        args: Map<String, Value>,
        extra: Map<String, Value>,
    ) -> Result<ToolCallResult, ProxyError> {
        let handler = {
            let tools = self.tools.lock().expect("mock server lock poisoned");
            tools
                .get(name)
                .map(|reg| reg.handler.clone())
                .ok_or_else(|| ProxyError::Handler {
                    tool_name: name.to_string(),
                    message: "no such tool registered".to_string(),
                })?
        };
        let ctx = ToolCallContext::new(name, args, extra);
        handler(ctx).await
    }

    /// Number of tools currently registered.
    pub fn tool_count(&self) -> usize {
        self.tools.lock().expect("mock server lock poisoned").len()
    }
}

impl ToolServer for MockServer {
    fn register_tool(&self, name: &str, schema: Value, handler: ToolHandler) {
        self.tools
            .lock()
            .expect("mock server lock poisoned")
            .insert(name.to_string(), Registration { schema, handler });
    }

    fn registered_tool_names(&self) -> Option<Vec<String>> {
        Some(self.tools.lock().expect("mock server lock poisoned").keys().cloned().collect())
    }

    fn wrap_existing_handler(&self, name: &str, wrap: &dyn Fn(ToolHandler) -> ToolHandler) -> bool {
        let mut tools = self.tools.lock().expect("mock server lock poisoned");
        let Some(reg) = tools.get_mut(name) else {
            return false;
        };
        let wrapped = wrap(reg.handler.clone());
        reg.handler = wrapped;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_interceptor::tool_handler;
    use proxy_core::ContentPart;

    fn echo_handler() -> ToolHandler {
        tool_handler(|ctx: ToolCallContext| async move {
            let args = ctx.snapshot_args();
            Ok(ToolCallResult {
                content: vec![ContentPart::json(Value::Object(args))],
                is_error: false,
                meta: None,
            })
        })
    }

    #[tokio::test]
    async fn call_tool_invokes_the_currently_installed_handler() {
        let server = MockServer::new();
        server.register_tool("echo", Value::Null, echo_handler());
        let mut args = Map::new();
        args.insert("x".to_string(), Value::from(1));
        let result = server.call_tool("echo", args, Map::new()).await.unwrap();
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn calling_an_unregistered_tool_errors() {
        let server = MockServer::new();
        let err = server.call_tool("missing", Map::new(), Map::new()).await.unwrap_err();
        assert!(matches!(err, ProxyError::Handler { .. }));
    }

    #[test]
    fn wrap_existing_handler_replaces_in_place() {
        let server = MockServer::new();
        server.register_tool("echo", Value::Null, echo_handler());
        let rewrapped = server.wrap_existing_handler("echo", &|original| {
            tool_handler(move |ctx| {
                let original = original.clone();
                async move { original(ctx).await }
            })
        });
        assert!(rewrapped);
        assert_eq!(server.tool_count(), 1);
    }
}
