//! Change Notifications
//!
//! The facade emits named events to external subscribers (rendering,
//! persistence). Delivery is synchronous and in registration order; a
//! panicking subscriber is caught and logged so it never prevents
//! delivery to the remaining subscribers.

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::objects::ObjectId;

/// State-change notification emitted by the facade.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Something in the grid/building state changed
    StateUpdated,
    /// An object was placed (live edit or redo)
    ObjectPlaced { id: ObjectId },
    /// An object was deleted (live edit or undo)
    ObjectDeleted { id: ObjectId },
    /// The selection set changed
    SelectionChanged { selected: Vec<ObjectId> },
    /// The undo/redo stacks changed
    HistoryChanged { can_undo: bool, can_redo: bool },
}

/// Handle for unsubscribing.
pub type SubscriberId = u64;

type Subscriber = Box<dyn FnMut(&EditorEvent)>;

/// Synchronous observer list.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriberId, Subscriber)>,
    next_id: SubscriberId,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber; called in registration order on every emit.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriberId
    where
        F: FnMut(&EditorEvent) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscriber. Returns false for an unknown id.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver an event to every subscriber, in registration order.
    ///
    /// A panicking subscriber is isolated: the panic is caught, logged,
    /// and delivery continues with the next subscriber.
    pub fn emit(&mut self, event: &EditorEvent) {
        for (id, callback) in &mut self.subscribers {
            let result = catch_unwind(AssertUnwindSafe(|| callback(event)));
            if result.is_err() {
                log::warn!("event subscriber {id} panicked while handling {event:?}");
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
