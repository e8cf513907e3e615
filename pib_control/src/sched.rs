//! Time-deferred action posting.
//!
//! Fixed-capacity one-shot timer table on the monotonic clock. An entry
//! fires no earlier than requested; ties break arbitrarily. Firing posts
//! the action's flag and removes the entry.

use heapless::Vec;
use pib_common::action::ActionId;
use static_assertions::const_assert;

use crate::flags::ActionRegistry;

/// Scheduler slot count. Must absorb a full night of profile triggers plus
/// every retry timer the sub-machines can hold armed at once.
pub const SCHEDULER_CAPACITY: usize = 32;

const_assert!(SCHEDULER_CAPACITY >= 16);

/// One pending timed action.
#[derive(Debug, Clone, Copy)]
struct ScheduledAction {
    action: ActionId,
    fire_at_ms: u64,
}

/// One-shot action timer table.
#[derive(Debug, Default)]
pub struct Scheduler {
    entries: Vec<ScheduledAction, SCHEDULER_CAPACITY>,
}

impl Scheduler {
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Arm `action` to fire `delay_s` seconds from `now_ms`.
    /// Returns false when capacity is exhausted.
    #[must_use]
    pub fn add(&mut self, action: ActionId, delay_s: u32, now_ms: u64) -> bool {
        self.entries
            .push(ScheduledAction {
                action,
                fire_at_ms: now_ms + u64::from(delay_s) * 1000,
            })
            .is_ok()
    }

    /// Post flags for every entry due at `now_ms` and drop those entries.
    pub fn poll(&mut self, now_ms: u64, flags: &mut ActionRegistry) {
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].fire_at_ms <= now_ms {
                let entry = self.entries.swap_remove(i);
                flags.set(entry.action);
            } else {
                i += 1;
            }
        }
    }

    /// Drop every pending entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Pending entry count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Truncate back to `len` entries (rollback for multi-add operations).
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    /// Pending fire times for an action, in insertion order (test
    /// observability).
    pub fn fire_times_ms(&self, action: ActionId) -> Vec<u64, SCHEDULER_CAPACITY> {
        self.entries
            .iter()
            .filter(|e| e.action == action)
            .map(|e| e.fire_at_ms)
            .collect()
    }
}
