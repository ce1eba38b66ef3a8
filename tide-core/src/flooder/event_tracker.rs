//! Per-node bookkeeping for events sitting in the scheduler's queue.
//!
//! The scheduler may change its mind about when a node needs to be looked at
//! many times before the queue reaches that time. Rather than deleting queue
//! entries, it records the *desired* event time here and keeps at most one
//! *queued* entry alive: an earlier desire enqueues a new entry, a later one
//! is parked until the queued entry pops.

use super::types::Time;

/// What the scheduler should do with an event it just popped for this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DequeueDecision {
    /// The popped event is the one currently desired: handle it.
    Process,
    /// The popped event is stale but a later event is still desired: enqueue
    /// it at the given time.
    Requeue(Time),
    /// The popped event is stale and nothing is desired.
    Discard,
}

/// Tracks the desired and queued event times of one detector node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeEventTracker {
    desired: Option<Time>,
    queued: Option<Time>,
}

impl NodeEventTracker {
    /// Records that the node wants to be examined at `time`.
    ///
    /// Returns `true` if the caller must push a queue entry for `time`; this
    /// happens when nothing is queued yet or the queued entry is later than
    /// `time`.
    #[must_use]
    pub fn set_desired_event(&mut self, time: Time) -> bool {
        self.desired = Some(time);
        match self.queued {
            Some(queued) if queued <= time => false,
            _ => {
                self.queued = Some(time);
                true
            }
        }
    }

    /// Withdraws the desired event. Any queued entry will be discarded when it pops.
    pub fn set_no_desired_event(&mut self) {
        self.desired = None;
    }

    /// Decides what to do with a queue entry for `time` that was just popped.
    ///
    /// Entries that do not match the tracked queued time are leftovers from
    /// earlier reschedules and are discarded.
    pub fn dequeue_decision(&mut self, time: Time) -> DequeueDecision {
        if self.queued != Some(time) {
            return DequeueDecision::Discard;
        }
        self.queued = None;
        match self.desired.take() {
            Some(desired) if desired == time => DequeueDecision::Process,
            Some(desired) => {
                self.desired = Some(desired);
                self.queued = Some(desired);
                DequeueDecision::Requeue(desired)
            }
            None => DequeueDecision::Discard,
        }
    }

    /// Time of the desired event, if any.
    #[inline]
    pub fn desired_time(&self) -> Option<Time> {
        self.desired
    }

    /// Time of the entry believed to be in the queue, if any.
    #[inline]
    pub fn queued_time(&self) -> Option<Time> {
        self.queued
    }

    /// Returns `true` if nothing is desired or queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.desired.is_none() && self.queued.is_none()
    }

    /// Forgets all events.
    #[inline]
    pub fn clear(&mut self) {
        self.desired = None;
        self.queued = None;
    }
}
