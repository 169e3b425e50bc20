//! Slider double-action: secondary mode drives a bounded `u16` value whose
//! rate of change is `step_size` every `speed_ms_per_step` milliseconds,
//! moving in a configurable direction that may auto-swap at the bounds or
//! on entry.
//!
//! Grounded on `SldrDALtchMPBttn`. The per-tick stepping math
//! (`stOnScndMod_Do`) is implemented with the corrected, non-multiplied
//! remainder rollover — see `DESIGN.md` for the original's dimensionally
//! inconsistent `(elapsed % speed) * speed` form and why it is not
//! replicated. The step-size bound also follows spec's stated invariant
//! (`0 < step_size <= val_max - val_min`) rather than the original
//! setter's `/ speed` division, which cannot be reconciled with that
//! invariant for `speed > 1`.

use crate::double::DoubleActionPolicy;
use crate::error::{MpbError, MpbResult};

/// Policy implementing a bounded, time-driven slider value as the
/// secondary-mode output.
#[derive(Debug, Clone, Copy)]
pub struct SliderDouble {
    val_min: u16,
    val_max: u16,
    cur_val: u16,
    step_size: u16,
    speed_ms_per_step: u32,
    dir_up: bool,
    auto_swap_on_end: bool,
    auto_swap_on_press: bool,
    is_on_scndry: bool,
    secondary_start_ms: Option<u64>,
    /// Set whenever `cur_val` actually changes; drained by
    /// [`DoubleActionPolicy::take_outputs_changed`].
    outputs_changed: bool,
}

impl SliderDouble {
    /// Builds a slider policy. Rejects any violation of the slider
    /// invariants: `val_min < val_max`, `val_min <= cur_val <= val_max`,
    /// `0 < step_size <= val_max - val_min`, `speed_ms_per_step > 0`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        val_min: u16,
        val_max: u16,
        cur_val: u16,
        step_size: u16,
        speed_ms_per_step: u32,
        dir_up: bool,
        auto_swap_on_end: bool,
        auto_swap_on_press: bool,
    ) -> MpbResult<Self> {
        if val_min >= val_max
            || cur_val < val_min
            || cur_val > val_max
            || step_size == 0
            || step_size > val_max - val_min
            || speed_ms_per_step == 0
        {
            return Err(MpbError::InvalidParameter);
        }
        Ok(Self {
            val_min,
            val_max,
            cur_val,
            step_size,
            speed_ms_per_step,
            dir_up,
            auto_swap_on_end,
            auto_swap_on_press,
            is_on_scndry: false,
            secondary_start_ms: None,
            outputs_changed: false,
        })
    }

    /// Current slider value.
    pub fn otpt_cur_val(&self) -> u16 {
        self.cur_val
    }

    /// Whether the slider is currently pinned at its maximum.
    pub fn otpt_cur_val_is_max(&self) -> bool {
        self.cur_val == self.val_max
    }

    /// Whether the slider is currently pinned at its minimum.
    pub fn otpt_cur_val_is_min(&self) -> bool {
        self.cur_val == self.val_min
    }

    /// Current step rate, in milliseconds per step.
    pub fn otpt_sldr_spd(&self) -> u32 {
        self.speed_ms_per_step
    }

    /// Current step size.
    pub fn otpt_sldr_stp_size(&self) -> u16 {
        self.step_size
    }

    /// Current upper bound.
    pub fn otpt_val_max(&self) -> u16 {
        self.val_max
    }

    /// Current lower bound.
    pub fn otpt_val_min(&self) -> u16 {
        self.val_min
    }

    /// Whether the slider currently moves upward.
    pub fn sldr_dir_up(&self) -> bool {
        self.dir_up
    }

    /// Directly sets the slider value. Rejected if out of bounds.
    pub fn set_otpt_cur_val(&mut self, new_val: u16) -> bool {
        if new_val == self.cur_val {
            return true;
        }
        if new_val < self.val_min || new_val > self.val_max {
            return false;
        }
        self.cur_val = new_val;
        true
    }

    /// Updates the step rate. Rejected if zero.
    pub fn set_otpt_slider_speed(&mut self, new_val: u32) -> bool {
        if new_val == self.speed_ms_per_step {
            return true;
        }
        if new_val == 0 {
            return false;
        }
        self.speed_ms_per_step = new_val;
        true
    }

    /// Updates the step size. Rejected if zero or larger than the range.
    pub fn set_otpt_step_size(&mut self, new_val: u16) -> bool {
        if new_val == self.step_size {
            return true;
        }
        if new_val == 0 || new_val > self.val_max - self.val_min {
            return false;
        }
        self.step_size = new_val;
        true
    }

    /// Updates the upper bound. Rejected if not greater than the lower
    /// bound. Clamps the current value down if it now exceeds the new max.
    pub fn set_otpt_max(&mut self, new_val: u16) -> bool {
        if new_val == self.val_max {
            return true;
        }
        if new_val <= self.val_min {
            return false;
        }
        self.val_max = new_val;
        if self.cur_val > self.val_max {
            self.cur_val = self.val_max;
        }
        true
    }

    /// Updates the lower bound. Rejected if not smaller than the upper
    /// bound. Clamps the current value up if it now falls below the new min.
    pub fn set_otpt_min(&mut self, new_val: u16) -> bool {
        if new_val == self.val_min {
            return true;
        }
        if new_val >= self.val_max {
            return false;
        }
        self.val_min = new_val;
        if self.cur_val < self.val_min {
            self.cur_val = self.val_min;
        }
        true
    }

    fn set_dir(&mut self, up: bool) -> bool {
        if up == self.dir_up {
            return true;
        }
        if up {
            if self.cur_val != self.val_max {
                self.dir_up = true;
            }
        } else if self.cur_val != self.val_min {
            self.dir_up = false;
        }
        self.dir_up == up
    }

    /// Sets the slider direction downward. Rejected (no-op) if the slider
    /// already sits at its minimum.
    pub fn set_sldr_dir_dn(&mut self) -> bool {
        self.set_dir(false)
    }

    /// Sets the slider direction upward. Rejected (no-op) if the slider
    /// already sits at its maximum.
    pub fn set_sldr_dir_up(&mut self) -> bool {
        self.set_dir(true)
    }

    /// Flips the slider direction.
    pub fn swap_sldr_dir(&mut self) -> bool {
        let up = !self.dir_up;
        self.set_dir(up)
    }

    /// Whether direction auto-swaps on reaching a bound.
    pub fn swap_dir_on_end(&self) -> bool {
        self.auto_swap_on_end
    }

    /// Enables or disables direction auto-swap on reaching a bound.
    pub fn set_swap_dir_on_end(&mut self, new_val: bool) {
        self.auto_swap_on_end = new_val;
    }

    /// Whether direction auto-swaps on entering secondary mode.
    pub fn swap_dir_on_press(&self) -> bool {
        self.auto_swap_on_press
    }

    /// Enables or disables direction auto-swap on entering secondary mode.
    pub fn set_swap_dir_on_press(&mut self, new_val: bool) {
        self.auto_swap_on_press = new_val;
    }
}

impl DoubleActionPolicy for SliderDouble {
    fn on_enter_secondary(&mut self, now_ms: u64) {
        if !self.is_on_scndry {
            self.is_on_scndry = true;
        }
        if self.auto_swap_on_press {
            self.swap_sldr_dir();
        }
        self.secondary_start_ms = Some(now_ms);
    }

    fn tick_secondary(&mut self, now_ms: u64) {
        let start = match self.secondary_start_ms {
            Some(start) => start,
            None => {
                self.secondary_start_ms = Some(now_ms);
                return;
            }
        };
        let elapsed = now_ms.saturating_sub(start);
        let speed = self.speed_ms_per_step as u64;
        let steps = elapsed / speed;
        let remainder = elapsed % speed;
        self.secondary_start_ms = Some(now_ms - remainder);
        if steps == 0 {
            return;
        }
        let change = steps.saturating_mul(self.step_size as u64);
        if self.dir_up {
            if self.cur_val != self.val_max {
                let headroom = (self.val_max - self.cur_val) as u64;
                self.cur_val = if headroom >= change {
                    self.cur_val + change as u16
                } else {
                    self.val_max
                };
                self.outputs_changed = true;
                if self.cur_val == self.val_max && self.auto_swap_on_end {
                    self.dir_up = false;
                }
            }
        } else if self.cur_val != self.val_min {
            let headroom = (self.cur_val - self.val_min) as u64;
            self.cur_val = if headroom >= change {
                self.cur_val - change as u16
            } else {
                self.val_min
            };
            self.outputs_changed = true;
            if self.cur_val == self.val_min && self.auto_swap_on_end {
                self.dir_up = true;
            }
        }
    }

    fn on_exit_secondary(&mut self) {
        if self.is_on_scndry {
            self.is_on_scndry = false;
        }
        self.secondary_start_ms = None;
    }

    fn is_on_secondary(&self) -> bool {
        self.is_on_scndry
    }

    fn otpt_cur_val(&self) -> u16 {
        self.cur_val
    }

    fn reset(&mut self) {
        self.is_on_scndry = false;
        self.secondary_start_ms = None;
    }

    fn on_enter_disabled(&mut self, is_on_when_disabled: bool) {
        if self.is_on_scndry != is_on_when_disabled {
            self.is_on_scndry = is_on_when_disabled;
        }
    }

    fn take_outputs_changed(&mut self) -> bool {
        ::core::mem::replace(&mut self.outputs_changed, false)
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::core::CoreConfig;
    use crate::debounce::HW_MIN_DBNC_MS;
    use crate::double::DoubleAction;
    use crate::platform::test_support::{FakeClock, RecordingNotifySink, SharedPin};
    use crate::status::OutputFlags;

    #[test]
    fn rejects_invalid_bounds_and_step() {
        assert!(SliderDouble::new(10, 5, 5, 1, 1, true, false, false).is_err());
        assert!(SliderDouble::new(0, 10, 20, 1, 1, true, false, false).is_err());
        assert!(SliderDouble::new(0, 10, 5, 0, 1, true, false, false).is_err());
        assert!(SliderDouble::new(0, 10, 5, 11, 1, true, false, false).is_err());
        assert!(SliderDouble::new(0, 10, 5, 1, 0, true, false, false).is_err());
    }

    /// S4: min=0, max=2000, step=1, speed=1ms/step, cur=1000, dir=down,
    /// auto_swap_on_end=false, auto_swap_on_press=true, scnd_mode_delay=2000.
    /// Holding 3500ms: secondary engages ~2000ms in (direction swaps to up
    /// on entry), then runs ~1500ms more, advancing the value by ~1500
    /// steps up from 1000, clamped at 2000.
    #[test]
    fn s4_slider_advances_and_clamps_on_long_hold() {
        let pin = SharedPin::new();
        let clock = FakeClock::new();
        let policy = SliderDouble::new(0, 2000, 1000, 1, 1, false, false, true).unwrap();
        let mut btn = DoubleAction::new(
            pin.clone(),
            clock.clone(),
            CoreConfig {
                pulled_up: false,
                type_no: true,
                dbnc_time_ms: HW_MIN_DBNC_MS,
                start_delay_ms: 0,
                is_on_when_disabled: false,
            },
            2000,
            policy,
        )
        .unwrap();

        pin.set_high(true);
        while clock.now_ms() < 3_500 {
            btn.tick().unwrap();
            clock.advance(10);
        }
        assert!(btn.output_flags().is_on_scndry);
        assert!(btn.policy().sldr_dir_up(), "auto_swap_on_press flips to up");
        assert_eq!(btn.output_flags().otpt_cur_val, 2000);

        pin.set_high(false);
        for _ in 0..5 {
            btn.tick().unwrap();
            clock.advance(HW_MIN_DBNC_MS as u64);
        }
        assert!(!btn.output_flags().is_on_scndry);
    }

    #[test]
    fn auto_swap_on_end_flips_direction_at_bound() {
        let pin = SharedPin::new();
        let clock = FakeClock::new();
        let policy = SliderDouble::new(0, 100, 95, 1, 1, true, true, false).unwrap();
        let mut btn = DoubleAction::new(
            pin.clone(),
            clock.clone(),
            CoreConfig {
                pulled_up: false,
                type_no: true,
                dbnc_time_ms: HW_MIN_DBNC_MS,
                start_delay_ms: 0,
                is_on_when_disabled: false,
            },
            100,
            policy,
        )
        .unwrap();

        // Stop right at the tick that drives the slider into its max and
        // swaps direction, before any further ticks can carry it back down.
        pin.set_high(true);
        while clock.now_ms() < 145 {
            btn.tick().unwrap();
            clock.advance(10);
        }
        assert_eq!(btn.output_flags().otpt_cur_val, 100);
        assert!(!btn.policy().sldr_dir_up(), "swapped to down after hitting max");
    }

    /// Isolates that a value-only change (already in secondary mode, well
    /// past the entry transition) still posts a notification, so a consumer
    /// watching bits 16-31 actually sees the slider move.
    #[test]
    fn value_change_in_secondary_mode_posts_a_notification() {
        let pin = SharedPin::new();
        let clock = FakeClock::new();
        let mut sink = RecordingNotifySink::new();
        let policy = SliderDouble::new(0, 2000, 1000, 1, 1, true, false, false).unwrap();
        let mut btn = DoubleAction::new(
            pin.clone(),
            clock.clone(),
            CoreConfig {
                pulled_up: false,
                type_no: true,
                dbnc_time_ms: HW_MIN_DBNC_MS,
                start_delay_ms: 0,
                is_on_when_disabled: false,
            },
            100,
            policy,
        )
        .unwrap();
        btn.core_mut().set_notify_sink(&mut sink);

        pin.set_high(true);
        while clock.now_ms() < 150 {
            btn.tick().unwrap();
            clock.advance(10);
        }
        assert!(btn.output_flags().is_on_scndry);
        let count_before = sink.post_count();
        let val_before = btn.output_flags().otpt_cur_val;

        btn.tick().unwrap();
        clock.advance(10);
        assert!(btn.output_flags().otpt_cur_val > val_before);
        assert!(sink.post_count() > count_before, "slider value change must post a notification");
        assert_eq!(
            OutputFlags::decode(sink.last().unwrap()).otpt_cur_val,
            btn.output_flags().otpt_cur_val
        );
    }
}
