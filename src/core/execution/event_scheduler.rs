use crate::core::types::{PortRef, SimTime};
use crate::core::values::Value;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A port drive change due at an absolute simulated time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub time: SimTime,
    pub port: PortRef,
    pub value: Value,
}

#[derive(Debug, Clone)]
struct ScheduledEvent {
    sequence_num: u64,
    event: Event,
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.event.time == other.event.time && self.sequence_num == other.sequence_num
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .event
            .time
            .cmp(&self.event.time)
            .then_with(|| other.sequence_num.cmp(&self.sequence_num))
    }
}

/// Time-ordered event queue; equal times pop in insertion order
#[derive(Debug, Clone, Default)]
pub struct EventScheduler {
    event_queue: BinaryHeap<ScheduledEvent>,
    sequence_counter: u64,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, event: Event) {
        self.event_queue.push(ScheduledEvent {
            sequence_num: self.sequence_counter,
            event,
        });
        self.sequence_counter += 1;
    }

    /// Remove the earliest event; `None` means the circuit is stable
    pub fn pop_next(&mut self) -> Option<Event> {
        self.event_queue.pop().map(|scheduled| scheduled.event)
    }

    pub fn peek_time(&self) -> Option<SimTime> {
        self.event_queue.peek().map(|scheduled| scheduled.event.time)
    }

    pub fn has_events(&self) -> bool {
        !self.event_queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.event_queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.event_queue.is_empty()
    }

    /// Drop all pending events. The sequence counter keeps running so
    /// ordering stays monotonic across ticks.
    pub fn clear(&mut self) {
        self.event_queue.clear();
    }

    /// Remove and return every pending event in firing order
    pub fn drain(&mut self) -> Vec<Event> {
        std::iter::from_fn(|| self.pop_next()).collect()
    }
}
