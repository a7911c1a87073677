//! Error taxonomy shared by every crate in the interception pipeline.

use thiserror::Error;

use crate::result::ToolCallResult;

/// The error taxonomy from the interception pipeline's failure model.
///
/// `ShortCircuit` is informational rather than a true failure: a before-hook
/// that short-circuits carries its own [`ToolCallResult`] and never reaches
/// a caller as an `Err`, but the variant exists so internal plumbing can
/// thread it through the same `Result` type as real errors.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The security gate rejected `args` against the tool's declared schema.
    #[error("validation failed for tool `{tool_name}`: {message}")]
    Validation {
        /// Name of the tool whose arguments failed validation.
        tool_name: String,
        /// Human-readable description of the failure.
        message: String,
    },

    /// A plugin hook threw/returned an error.
    #[error("hook `{plugin_name}` failed during {phase}: {message}")]
    Hook {
        /// Name of the plugin whose hook failed.
        plugin_name: String,
        /// Which phase the hook ran in.
        phase: &'static str,
        /// Underlying error message.
        message: String,
    },

    /// A hook did not complete within its configured timeout.
    #[error("hook `{plugin_name}` timed out after {timeout_ms}ms")]
    HookTimeout {
        /// Name of the plugin whose hook timed out.
        plugin_name: String,
        /// The timeout that was exceeded.
        timeout_ms: u64,
    },

    /// The whole call (before + handler + after) exceeded its wall-clock budget.
    #[error("call to `{tool_name}` exceeded its execution cap of {cap_ms}ms")]
    CallCapExceeded {
        /// Name of the tool being called.
        tool_name: String,
        /// The configured cap that was exceeded.
        cap_ms: u64,
    },

    /// A before-hook short-circuited the call. Not a failure.
    #[error("short-circuited by `{plugin_name}`")]
    ShortCircuit {
        /// Name of the plugin that short-circuited.
        plugin_name: String,
        /// The result it produced.
        result: Box<ToolCallResult>,
    },

    /// The original tool handler returned an error.
    #[error("handler for `{tool_name}` failed: {message}")]
    Handler {
        /// Name of the tool whose handler failed.
        tool_name: String,
        /// Underlying error message.
        message: String,
    },

    /// A plugin's `dispose()` did not complete cleanly.
    #[error("plugin `{plugin_name}` failed to dispose: {message}")]
    Disposal {
        /// Name of the plugin.
        plugin_name: String,
        /// Underlying error message.
        message: String,
    },

    /// Dependency graph is malformed: a cycle or a missing dependency.
    #[error("dependency error: {0}")]
    Dependency(String),

    /// A plugin's `initialize()` failed; wrapping/registration is aborted.
    #[error("plugin `{plugin_name}` failed to initialize: {message}")]
    PluginFatal {
        /// Name of the plugin.
        plugin_name: String,
        /// Underlying error message.
        message: String,
    },
}

impl ProxyError {
    /// Render this error as the client-visible text placed into an
    /// error [`ToolCallResult`], stripping internals unless `debug` is set.
    pub fn to_client_message(&self, debug: bool) -> String {
        if debug {
            self.to_string()
        } else {
            match self {
                ProxyError::Validation { tool_name, .. } => {
                    format!("invalid arguments for tool `{tool_name}`")
                }
                ProxyError::Hook { plugin_name, .. } => {
                    format!("a plugin (`{plugin_name}`) failed to process this call")
                }
                ProxyError::HookTimeout { plugin_name, .. } => {
                    format!("timeout while running plugin `{plugin_name}`")
                }
                ProxyError::CallCapExceeded { tool_name, .. } => {
                    format!("call to `{tool_name}` took too long")
                }
                ProxyError::ShortCircuit { .. } => String::new(),
                ProxyError::Handler { tool_name, .. } => {
                    format!("tool `{tool_name}` failed")
                }
                ProxyError::Disposal { plugin_name, .. } => {
                    format!("plugin `{plugin_name}` did not shut down cleanly")
                }
                ProxyError::Dependency(_) => "plugin dependency error".to_string(),
                ProxyError::PluginFatal { plugin_name, .. } => {
                    format!("plugin `{plugin_name}` failed to initialize")
                }
            }
        }
    }
}
