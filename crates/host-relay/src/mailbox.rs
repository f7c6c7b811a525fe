//! One-slot pending mailbox.
//!
//! Holds at most one item. A new arrival displaces the old one; the caller
//! decides how to report the displacement.

use std::sync::Mutex;

/// Single-slot buffer with last-write-wins semantics.
pub struct PendingSlot<T> {
    slot: Mutex<Option<T>>,
}

impl<T> PendingSlot<T> {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Store an item, returning the item it displaced, if any.
    pub fn put(&self, item: T) -> Option<T> {
        self.slot.lock().unwrap().replace(item)
    }

    /// Remove and return the buffered item, leaving the slot empty.
    pub fn take(&self) -> Option<T> {
        self.slot.lock().unwrap().take()
    }

    /// Whether the slot is currently empty.
    pub fn is_empty(&self) -> bool {
        self.slot.lock().unwrap().is_none()
    }
}

impl<T> Default for PendingSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
