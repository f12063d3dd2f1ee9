//! In-process event bus for dashboard events.
//!
//! Embedders that render widgets themselves (or tests that want to observe a
//! run) subscribe to an [`EventBus`] instead of pushing over HTTP.
//!
//! ```ignore
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//! // hand `Arc::new(bus.clone())` to the sync job as its sink
//! while let Ok(event) = rx.recv().await {
//!     println!("{} updated", event.name);
//! }
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::dashboard::{DashboardEvent, EventSink, SinkError};

/// Default channel capacity for the event bus.
/// This determines how many events can be buffered before slow receivers
/// start missing events (lagging).
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Broadcast bus for dashboard events.
///
/// Uses a tokio broadcast channel so every subscriber receives each event.
/// Clones share the channel and the counters.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DashboardEvent>,
    events_published: Arc<AtomicU64>,
    /// Events published while nobody was subscribed
    events_dropped: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            events_published: Arc::new(AtomicU64::new(0)),
            events_dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Publish an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    /// If there are no subscribers, the event is dropped and 0 is returned.
    pub fn publish(&self, event: DashboardEvent) -> usize {
        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(event) {
            Ok(count) => count,
            Err(_) => {
                self.events_dropped.fetch_add(1, Ordering::Relaxed);
                0
            }
        }
    }

    /// Subscribe to events from this bus.
    ///
    /// A receiver that falls behind gets `RecvError::Lagged` with the
    /// number of events it missed.
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }

    pub fn events_dropped(&self) -> u64 {
        self.events_dropped.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSink for EventBus {
    async fn emit(&self, event: &DashboardEvent) -> Result<(), SinkError> {
        self.publish(event.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "event_bus"
    }
}
