//! The wrapper instance's lifecycle-event stream. Realized as a `tokio::sync::broadcast` channel: the
//! idiomatic choice for a multi-subscriber event stream, since `tokio` is
//! already a full-featured dependency across this workspace.

use tokio::sync::broadcast;

/// The wrapper's own lifecycle, distinct from any individual plugin's
/// `PluginState`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// `wrap()` has been called and plugin initialization is starting.
    Starting,
    /// All plugins initialized; the server is intercepting calls.
    Started,
    /// `dispose()` has been called and plugin teardown is starting.
    Stopping,
    /// All plugins disposed (or marked Leaked).
    Stopped,
    /// A fatal error occurred during start or stop, carrying a message.
    Error(String),
}

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The sending half kept by the wrapper; cloned into a `LifecycleEvents`
/// handle for every subscriber.
#[derive(Clone)]
pub struct LifecycleEventSource {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl LifecycleEventSource {
    /// Create a new event source with its own channel.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish an event. Silently dropped if there are no subscribers.
    pub fn publish(&self, event: LifecycleEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to future events; does not replay past events.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }
}

impl Default for LifecycleEventSource {
    fn default() -> Self {
        Self::new()
    }
}
