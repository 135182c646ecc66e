//! Host event inbox
//!
//! Fire placements and removals can arrive before the host world has finished
//! loading. They are buffered here in arrival order and replayed once the
//! engine is marked ready. The inbox is bounded; on overflow the oldest event
//! is dropped.

use crate::core_types::position::BlockPos;
use std::collections::VecDeque;
use tracing::warn;

/// Kind of host notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEventKind {
    /// A fire block was placed
    Ignite,
    /// A fire block was removed
    Extinguish,
}

/// A buffered host notification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostEvent {
    pub kind: HostEventKind,
    /// Fire block position
    pub pos: BlockPos,
    /// Simulation time the host reported the event
    pub at: f64,
}

impl HostEvent {
    pub fn ignite(pos: BlockPos, at: f64) -> Self {
        Self {
            kind: HostEventKind::Ignite,
            pos,
            at,
        }
    }

    pub fn extinguish(pos: BlockPos, at: f64) -> Self {
        Self {
            kind: HostEventKind::Extinguish,
            pos,
            at,
        }
    }
}

#[derive(Debug)]
pub struct EventInbox {
    events: VecDeque<HostEvent>,
    capacity: usize,
    dropped: u64,
}

impl EventInbox {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    /// Buffer an event, evicting the oldest one when full
    pub fn push(&mut self, event: HostEvent) {
        if self.events.len() >= self.capacity {
            if let Some(evicted) = self.events.pop_front() {
                self.dropped += 1;
                warn!(
                    pos = %evicted.pos,
                    kind = ?evicted.kind,
                    capacity = self.capacity,
                    "event inbox full, dropping oldest event"
                );
            }
        }
        self.events.push_back(event);
    }

    /// Take every buffered event in arrival order
    pub fn drain(&mut self) -> Vec<HostEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events lost to overflow since creation
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order() {
        let mut inbox = EventInbox::new(8);
        inbox.push(HostEvent::ignite(BlockPos::new(1, 0, 0), 0.0));
        inbox.push(HostEvent::extinguish(BlockPos::new(1, 0, 0), 1.0));
        inbox.push(HostEvent::ignite(BlockPos::new(2, 0, 0), 2.0));

        let events = inbox.drain();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].kind, HostEventKind::Extinguish);
        assert_eq!(events[2].pos, BlockPos::new(2, 0, 0));
        assert!(inbox.is_empty());
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let mut inbox = EventInbox::new(2);
        for x in 0..4 {
            inbox.push(HostEvent::ignite(BlockPos::new(x, 0, 0), f64::from(x)));
        }
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox.dropped(), 2);
        let xs: Vec<i32> = inbox.drain().iter().map(|e| e.pos.x).collect();
        assert_eq!(xs, vec![2, 3]);
    }
}
