//! # vista_event - Typed Event Notifier
//!
//! Publish/subscribe plumbing used for viewport lifecycle, surface, and
//! controller events:
//! - Typed buses, one payload type per bus
//! - Priority-ordered delivery
//! - Re-entrant publishing (handlers may publish or unsubscribe)
//! - Queued single-type channels for consumers that drain on their own tick

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

/// Event priority
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
    Critical = 3,
}

/// Trait for events
pub trait Event: Send + Sync + 'static {}

// Blanket implementation
impl<T: Send + Sync + 'static> Event for T {}

/// Event handler function type
pub type EventHandler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Subscriber ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

struct Subscription<E> {
    id: SubscriberId,
    priority: Priority,
    handler: EventHandler<E>,
}

/// Synchronous event bus for a single payload type.
///
/// Handlers run on the publishing thread, highest priority first and in
/// subscription order within a priority. The subscriber list is snapshotted
/// before dispatch, so no lock is held while a handler runs.
pub struct EventBus<E: Event> {
    subscribers: RwLock<Vec<Subscription<E>>>,
    next_subscriber_id: AtomicU64,
    published: AtomicU64,
}

impl<E: Event> EventBus<E> {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_subscriber_id: AtomicU64::new(1),
            published: AtomicU64::new(0),
        }
    }

    /// Subscribe with normal priority
    pub fn subscribe<F>(&self, handler: F) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscribe_with_priority(handler, Priority::Normal)
    }

    /// Subscribe with priority
    pub fn subscribe_with_priority<F>(&self, handler: F, priority: Priority) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriberId(self.next_subscriber_id.fetch_add(1, Ordering::Relaxed));

        let mut subscribers = self.subscribers.write();
        subscribers.push(Subscription {
            id,
            priority,
            handler: Arc::new(handler),
        });
        // Stable: keeps subscription order within a priority
        subscribers.sort_by(|a, b| b.priority.cmp(&a.priority));

        id
    }

    /// Unsubscribe; returns false for unknown ids
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    /// Deliver an event to every subscriber
    pub fn publish(&self, event: &E) {
        let handlers: Vec<EventHandler<E>> = self
            .subscribers
            .read()
            .iter()
            .map(|s| s.handler.clone())
            .collect();

        self.published.fetch_add(1, Ordering::Relaxed);

        for handler in handlers {
            handler(event);
        }
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Total events published on this bus
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Drop every subscriber
    pub fn clear(&self) {
        self.subscribers.write().clear();
    }
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("published", &self.published_count())
            .finish()
    }
}

/// Queued channel for single-type events
pub struct EventChannel<E: Event> {
    queue: Mutex<VecDeque<E>>,
    capacity: usize,
}

impl<E: Event> EventChannel<E> {
    /// Create an unbounded channel
    pub fn new() -> Self {
        Self::with_capacity(usize::MAX)
    }

    /// Create a channel that drops its oldest event beyond `capacity`
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Send an event
    pub fn send(&self, event: E) {
        let mut queue = self.queue.lock();
        if queue.len() >= self.capacity {
            queue.pop_front();
            log::warn!("EventChannel full ({}), dropping oldest event", self.capacity);
        }
        queue.push_back(event);
    }

    /// Receive an event
    pub fn receive(&self) -> Option<E> {
        self.queue.lock().pop_front()
    }

    /// Drain all events
    pub fn drain(&self) -> Vec<E> {
        self.queue.lock().drain(..).collect()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Get pending count
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }
}

impl<E: Event> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Prelude
pub mod prelude {
    pub use crate::{Event, EventBus, EventChannel, EventHandler, Priority, SubscriberId};
}
