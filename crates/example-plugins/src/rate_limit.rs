//! A sliding-window call-rate limiter.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use plugin_registry::{HookOutcome, Plugin};
use proxy_core::{ProxyError, ToolCallContext, ToolCallResult};
use tokio::sync::Mutex;

/// Blocks calls once more than `max_calls` have landed within `window`.
pub struct RateLimitPlugin {
    max_calls: usize,
    window: Duration,
    calls: Mutex<Vec<Instant>>,
}

impl RateLimitPlugin {
    /// Build a limiter allowing `max_calls` per `window`.
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls,
            window,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Plugin for RateLimitPlugin {
    fn name(&self) -> &str {
        "rate_limit"
    }

    fn version(&self) -> &str {
        "0.1.0"
    }

    async fn before_tool_call(&self, _ctx: &ToolCallContext) -> Result<HookOutcome, ProxyError> {
        let now = Instant::now();
        let mut calls = self.calls.lock().await;
        calls.retain(|t| now.duration_since(*t) < self.window);

        if calls.len() >= self.max_calls {
            return Ok(HookOutcome::ShortCircuit(ToolCallResult::error("rate limit exceeded")));
        }
        calls.push(now);
        Ok(HookOutcome::Continue)
    }
}
