//! Queue ordering element.
//!
//! An [`Event`] pairs a due timestamp with an owned message. The queue
//! is a max-heap, so `Ord` is reversed: the "greatest" event is the one
//! due soonest, with the lower sequence number winning among equal due
//! times. The sequence number is assigned at `post` time and makes the
//! FIFO tie-break a property of the ordering itself rather than of heap
//! internals.

use avpipe_message::Message;

/// A pending dispatch: due time, post order, and the owned message.
///
/// Created on `post`, consumed when dispatched, dropped undelivered
/// when the Looper stops with events still queued.
#[derive(Debug)]
pub(crate) struct Event {
    /// Monotonic due time in microseconds (Looper clock).
    pub(crate) due_us: i64,
    /// Post-order tie-break: earlier posts dispatch first at the same
    /// due time.
    pub(crate) seq: u64,
    pub(crate) message: Message,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.due_us == other.due_us && self.seq == other.seq
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reversed: BinaryHeap pops the maximum, we want the earliest
        // due time and, within it, the earliest post.
        other
            .due_us
            .cmp(&self.due_us)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}
