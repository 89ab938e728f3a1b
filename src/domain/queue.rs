//! FIFO holding submissions that arrived while no token was available.

use std::collections::VecDeque;

/// Unbounded first-in, first-out queue.
///
/// Insertion order is dispatch priority: the oldest entry is always the next
/// one handed out. Nothing is ever dropped by the queue itself; entries leave
/// only through [`pop`](Self::pop) or [`drain_all`](Self::drain_all).
/// Entries taken out but not handed on can go back to the head with
/// [`requeue_front`](Self::requeue_front).
///
/// # Example
/// ```
/// use doc_throttle::OverflowQueue;
///
/// let mut queue = OverflowQueue::new();
/// queue.push("a");
/// queue.push("b");
///
/// assert_eq!(queue.pop(), Some("a"));
/// assert_eq!(queue.pop(), Some("b"));
/// assert_eq!(queue.pop(), None);
/// ```
#[derive(Debug, Clone)]
pub struct OverflowQueue<T> {
    entries: VecDeque<T>,
}

impl<T> OverflowQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Append an entry behind every entry already queued.
    ///
    /// Returns the queue depth after the push.
    pub fn push(&mut self, entry: T) -> usize {
        self.entries.push_back(entry);
        self.entries.len()
    }

    /// Remove and return the oldest entry.
    pub fn pop(&mut self) -> Option<T> {
        self.entries.pop_front()
    }

    /// Put entries back ahead of everything queued, keeping their order.
    ///
    /// Returns how many entries were put back.
    pub fn requeue_front<I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: DoubleEndedIterator,
    {
        let mut count = 0;
        for entry in entries.into_iter().rev() {
            self.entries.push_front(entry);
            count += 1;
        }
        count
    }

    /// Remove every entry, oldest first.
    pub fn drain_all(&mut self) -> Vec<T> {
        self.entries.drain(..).collect()
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for OverflowQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
