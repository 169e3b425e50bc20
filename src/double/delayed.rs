//! Delayed double-action: secondary mode is a plain flag, raised on entry
//! and cleared on exit, with no associated value.
//!
//! Grounded on `DDlydDALtchMPBttn`, whose `stOnScndMod_Do` override is
//! empty — all the behavior lives in the entry/exit hooks.

use crate::double::DoubleActionPolicy;

/// Policy implementing a plain on/off secondary mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelayedDouble {
    is_on_scndry: bool,
}

impl DelayedDouble {
    /// Builds a policy with secondary mode initially off.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DoubleActionPolicy for DelayedDouble {
    fn on_enter_secondary(&mut self, _now_ms: u64) {
        if !self.is_on_scndry {
            self.is_on_scndry = true;
        }
    }

    fn tick_secondary(&mut self, _now_ms: u64) {}

    fn on_exit_secondary(&mut self) {
        if self.is_on_scndry {
            self.is_on_scndry = false;
        }
    }

    fn is_on_secondary(&self) -> bool {
        self.is_on_scndry
    }

    fn reset(&mut self) {
        self.is_on_scndry = false;
    }

    fn on_enter_disabled(&mut self, is_on_when_disabled: bool) {
        if self.is_on_scndry != is_on_when_disabled {
            self.is_on_scndry = is_on_when_disabled;
        }
    }
}
