//! Admission tokens for the current window.
//!
//! The store is a plain counter. It is not synchronized; the admission gate
//! owns it behind its mutex together with the overflow queue so both change
//! in one critical section.

/// Count of admission slots left in the current window.
///
/// Invariant: `available` is always within `[0, capacity]`. It is only ever
/// set to `capacity` by [`refill`](Self::refill) or decremented by exactly one
/// by [`try_acquire`](Self::try_acquire).
///
/// # Example
/// ```
/// use doc_throttle::TokenStore;
///
/// let mut tokens = TokenStore::new(2);
///
/// // Starts empty until the first refill
/// assert!(!tokens.try_acquire());
///
/// tokens.refill();
/// assert!(tokens.try_acquire());
/// assert!(tokens.try_acquire());
/// assert!(!tokens.try_acquire());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStore {
    capacity: u32,
    available: u32,
}

impl TokenStore {
    /// Create an empty store that refills to `capacity`.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            available: 0,
        }
    }

    /// Take one token if any is left.
    pub fn try_acquire(&mut self) -> bool {
        if self.available == 0 {
            return false;
        }
        self.available -= 1;
        true
    }

    /// Reset to full capacity, discarding whatever was left.
    pub fn refill(&mut self) {
        self.available = self.capacity;
    }

    /// Tokens left in the current window.
    pub fn available(&self) -> u32 {
        self.available
    }

    /// Tokens granted at every refill.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Drop all remaining tokens.
    pub(crate) fn clear(&mut self) {
        self.available = 0;
    }
}
