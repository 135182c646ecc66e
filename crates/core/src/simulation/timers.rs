//! Deferred one-shot timers
//!
//! Stand-in for a host timer facility: items are scheduled for a simulation time
//! and handed back by [`DeferredTimers::pop_due`] once that time has passed.
//! Items due at the same instant come back in scheduling order.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

#[derive(Debug)]
struct TimerEntry<T> {
    due: f64,
    seq: u64,
    item: T,
}

impl<T> PartialEq for TimerEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for TimerEntry<T> {}

impl<T> PartialOrd for TimerEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for TimerEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .total_cmp(&other.due)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Min-heap of items keyed by due time
#[derive(Debug)]
pub struct DeferredTimers<T> {
    heap: BinaryHeap<Reverse<TimerEntry<T>>>,
    next_seq: u64,
}

impl<T> Default for DeferredTimers<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<T> DeferredTimers<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `item` to fire at simulation time `due`
    pub fn schedule(&mut self, due: f64, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(TimerEntry { due, seq, item }));
    }

    /// Remove and return every item due at or before `now`
    pub fn pop_due(&mut self, now: f64) -> Vec<T> {
        let mut fired = Vec::new();
        while self.heap.peek().is_some_and(|Reverse(e)| e.due <= now) {
            if let Some(Reverse(entry)) = self.heap.pop() {
                fired.push(entry.item);
            }
        }
        fired
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
