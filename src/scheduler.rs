//! Deterministic event scheduler.
//!
//! Uses a `BinaryHeap` with reversed `Ord` on [`Scheduled`] to act as a
//! min-heap keyed by `(due, event_id)`. Event IDs are strictly increasing,
//! so two runs with the same enqueue sequence always dispatch in the same
//! order.

use std::collections::BinaryHeap;

use crate::event::{Event, EventId, EventIdGen, Scheduled};
use crate::time::SimTime;

/// The pending-event store.
///
/// Owns the heap and the ID generator. It performs no causality checks;
/// those belong to [`EventQueue`](crate::queue::EventQueue), which knows
/// the current time.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Scheduled>,
    id_gen: EventIdGen,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            queue: BinaryHeap::new(),
            id_gen: EventIdGen::new(),
        }
    }

    /// Insert an event and return the ID assigned to it.
    pub fn schedule(&mut self, event: Event) -> EventId {
        let id = self.id_gen.next_id();
        self.queue.push(Scheduled { id, event });
        id
    }

    /// Pop the next event (earliest time, lowest ID).
    pub fn pop_next(&mut self) -> Option<Scheduled> {
        self.queue.pop()
    }

    /// Due time of the next event, if any.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.queue.peek().map(|s| s.event.due)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns the next event ID that will be assigned.
    #[cfg(test)]
    pub(crate) fn next_event_id(&self) -> EventId {
        self.id_gen.peek()
    }

    /// Drain all events in dispatch order.
    #[cfg(test)]
    pub(crate) fn drain_ordered(&mut self) -> Vec<Scheduled> {
        let mut events = Vec::with_capacity(self.queue.len());
        while let Some(e) = self.queue.pop() {
            events.push(e);
        }
        events
    }
}
