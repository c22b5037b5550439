use serde_json::Value;
use tokio::sync::broadcast;

use coinpulse_core::events::{CacheInvalidation, InvalidationSink};

/// SSE event name for cache invalidation notices.
pub const CACHE_INVALIDATE: &str = "cache:invalidate";

/// Named event with an optional JSON payload.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    pub name: &'static str,
    pub payload: Option<Value>,
}

impl ServerEvent {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            payload: None,
        }
    }

    pub fn with_payload(name: &'static str, payload: Value) -> Self {
        Self {
            name,
            payload: Some(payload),
        }
    }
}

/// Lightweight broadcast bus that fans out events to any connected clients.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ServerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: ServerEvent) {
        // No subscribers is not an error; lagging ones drop old events.
        let _ = self.sender.send(event);
    }
}

impl InvalidationSink for EventBus {
    fn invalidate(&self, invalidation: CacheInvalidation) {
        match serde_json::to_value(&invalidation) {
            Ok(payload) => {
                tracing::debug!(
                    "Invalidating {} paths for {}",
                    invalidation.paths.len(),
                    invalidation.dataset
                );
                self.publish(ServerEvent::with_payload(CACHE_INVALIDATE, payload));
            }
            Err(e) => tracing::error!("Failed to serialize invalidation: {}", e),
        }
    }
}
