//! Vehicle events for the external logger and telemetry
//!
//! The flight core records what it decided in a bounded queue; the host
//! drains it after each cycle. When the queue is full the oldest event is
//! dropped.

use heapless::Deque;

use super::descriptor::ModeId;
use super::error::ModeError;
use super::reason::ModeReason;

/// Queue capacity
pub const EVENT_QUEUE_LEN: usize = 16;

/// Something the flight core decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleEvent {
    /// Mode transition committed
    ModeChanged {
        from: ModeId,
        to: ModeId,
        reason: ModeReason,
    },
    /// Mode transition rejected; the previous mode stays active
    ModeChangeRejected {
        target: ModeId,
        reason: ModeReason,
        error: ModeError,
    },
    /// A mode advanced its internal sub-state
    SubModeChanged {
        mode: ModeId,
        sub_mode: &'static str,
    },
    /// Mission moved to a new NAV command
    MissionCurrent(u16),
    /// Mission command completed
    MissionItemReached(u16),
    /// Mission has no more NAV commands
    MissionComplete,
    /// Landing finished
    LandComplete,
}

/// Bounded event queue
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Deque<VehicleEvent, EVENT_QUEUE_LEN>,
    dropped: u32,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event, dropping the oldest when full
    pub fn push(&mut self, event: VehicleEvent) {
        if self.events.is_full() {
            self.events.pop_front();
            self.dropped = self.dropped.saturating_add(1);
        }
        // Cannot fail after making room
        let _ = self.events.push_back(event);
    }

    /// Remove and return the oldest event
    pub fn pop(&mut self) -> Option<VehicleEvent> {
        self.events.pop_front()
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if no events are queued
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events dropped because the queue was full
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Iterate queued events, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &VehicleEvent> {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_queue_fifo() {
        let mut queue = EventQueue::new();
        queue.push(VehicleEvent::MissionCurrent(1));
        queue.push(VehicleEvent::MissionComplete);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(VehicleEvent::MissionCurrent(1)));
        assert_eq!(queue.pop(), Some(VehicleEvent::MissionComplete));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_event_queue_drops_oldest() {
        let mut queue = EventQueue::new();
        for i in 0..(EVENT_QUEUE_LEN as u16 + 3) {
            queue.push(VehicleEvent::MissionCurrent(i));
        }
        assert_eq!(queue.len(), EVENT_QUEUE_LEN);
        assert_eq!(queue.dropped(), 3);
        assert_eq!(queue.pop(), Some(VehicleEvent::MissionCurrent(3)));
    }
}
