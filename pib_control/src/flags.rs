//! Edge-triggered action flags with staleness decay.
//!
//! Sub-machines post signals whose intended consumer may not run on the
//! tick they are set; the end-of-tick sweep bounds how long an unobserved
//! flag survives so it cannot leak into an unrelated procedure later.

use pib_common::action::ActionId;
use pib_common::consts::FLAG_STALE_TICKS;

#[derive(Debug, Clone, Copy, Default)]
struct ActionFlag {
    value: bool,
    stale_count: u8,
}

/// Registry of one flag per [`ActionId`].
#[derive(Debug)]
pub struct ActionRegistry {
    flags: [ActionFlag; ActionId::COUNT],
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionRegistry {
    pub const fn new() -> Self {
        Self {
            flags: [ActionFlag {
                value: false,
                stale_count: 0,
            }; ActionId::COUNT],
        }
    }

    /// Post an action. Re-posting an already-set flag only refreshes its
    /// staleness; within a tick the effect is idempotent.
    pub fn set(&mut self, action: ActionId) {
        let flag = &mut self.flags[action.index()];
        flag.value = true;
        flag.stale_count = 0;
    }

    /// Read-and-clear. Returns whether the flag was set.
    pub fn consume(&mut self, action: ActionId) -> bool {
        let flag = &mut self.flags[action.index()];
        if flag.value {
            flag.value = false;
            flag.stale_count = 0;
            true
        } else {
            false
        }
    }

    /// Peek without clearing (test observability).
    pub fn is_set(&self, action: ActionId) -> bool {
        self.flags[action.index()].value
    }

    /// End-of-tick decay: age every set flag and force-clear at the stale
    /// threshold.
    pub fn sweep(&mut self) {
        for flag in self.flags.iter_mut() {
            if flag.value {
                flag.stale_count += 1;
                if flag.stale_count >= FLAG_STALE_TICKS {
                    flag.value = false;
                    flag.stale_count = 0;
                }
            }
        }
    }
}
