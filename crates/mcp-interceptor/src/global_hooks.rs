//! Adapts `WrapOptions.hooks` into a synthetic, highest-priority plugin.

use async_trait::async_trait;
use plugin_registry::{HookOutcome, Plugin};
use proxy_core::{ProxyError, ToolCallContext, ToolCallResult};

use crate::options::GlobalHooks;

/// Priority high enough to run before any ordinarily-registered plugin,
/// short of a plugin explicitly choosing an equally extreme value.
pub const GLOBAL_HOOK_PRIORITY: i32 = i32::MAX / 2;

/// The `WrapOptions.hooks` closures, wrapped as a [`Plugin`] so the
/// registry, scheduler, and stats machinery need no special case for them.
pub struct GlobalHookPlugin {
    hooks: GlobalHooks,
}

impl GlobalHookPlugin {
    /// Build the synthetic plugin. Returns `None` if no hook was supplied,
    /// since an all-no-op plugin would just add overhead.
    pub fn from_hooks(hooks: GlobalHooks) -> Option<Self> {
        if hooks.before_tool_call.is_none() && hooks.after_tool_call.is_none() && hooks.error_hook.is_none() {
            None
        } else {
            Some(Self { hooks })
        }
    }
}

#[async_trait]
impl Plugin for GlobalHookPlugin {
    fn name(&self) -> &str {
        "__global_hooks__"
    }

    fn version(&self) -> &str {
        "0.1.0"
    }

    fn priority(&self) -> i32 {
        GLOBAL_HOOK_PRIORITY
    }

    async fn before_tool_call(&self, ctx: &ToolCallContext) -> Result<HookOutcome, ProxyError> {
        match &self.hooks.before_tool_call {
            None => Ok(HookOutcome::Continue),
            Some(hook) => match hook(ctx.clone()).await? {
                Some(result) => Ok(HookOutcome::ShortCircuit(result)),
                None => Ok(HookOutcome::Continue),
            },
        }
    }

    async fn after_tool_call(&self, ctx: &ToolCallContext, result: ToolCallResult) -> Result<ToolCallResult, ProxyError> {
        match &self.hooks.after_tool_call {
            None => Ok(result),
            Some(hook) => hook(ctx.clone(), result).await,
        }
    }

    async fn on_error(&self, err: &ProxyError) {
        if let Some(hook) = &self.hooks.error_hook {
            hook(err);
        }
    }
}
