//! Event Bus - broadcast channel for farm events

use tokio::sync::broadcast;
use tracing::debug;

use super::types::FarmEvent;

/// Default channel capacity (events)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10_000;

/// Broadcast bus the coordinator emits [`FarmEvent`]s on
///
/// Emitting never blocks the coordinator. Slow subscribers lose the oldest
/// events once the channel is full.
pub struct EventBus {
    tx: broadcast::Sender<FarmEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Create a new event bus with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: FarmEvent) {
        debug!(
            event_type = event.event_type(),
            worker = ?event.worker(),
            subscribers = self.subscriber_count(),
            "EventBus::emit"
        );
        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<FarmEvent> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Drain every event currently buffered for `rx`
pub fn drain(rx: &mut broadcast::Receiver<FarmEvent>) -> Vec<FarmEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                debug!(skipped, "drain: receiver lagged");
            }
            Err(_) => break,
        }
    }
    events
}
