//! Timed voidable: the void condition fires after the button has been
//! continuously on for `void_time_ms`. Grounded on `TmVdblMPBttn`.

use crate::error::{MpbError, MpbResult};
use crate::latch::timed::MIN_SRVC_TIME_MS;
use crate::voidable::{SupportsTaskWhileOn, VoidPolicy};

/// Policy implementing a time-driven void condition, plus the two
/// output-forcing knobs the original exposes only on this variant
/// (`setFrcdOtptWhnVdd`/`setStOnWhnOtpFrcd`) — present in the source as a
/// plain getter/setter pair with no further consumer in this file, kept
/// here for API parity; see `DESIGN.md`.
#[derive(Debug, Clone, Copy)]
pub struct TimedVoidable {
    void_time_ms: u32,
    void_start_ms: Option<u64>,
    force_output_when_void: bool,
    state_on_when_forced: bool,
}

impl TimedVoidable {
    /// Builds a timed-voidable policy. `void_time_ms` is clamped up to
    /// [`MIN_SRVC_TIME_MS`], matching the original's tolerant constructors.
    pub fn new(void_time_ms: u32) -> Self {
        Self {
            void_time_ms: void_time_ms.max(MIN_SRVC_TIME_MS),
            void_start_ms: None,
            force_output_when_void: false,
            state_on_when_forced: false,
        }
    }

    /// Current void time.
    pub fn void_time_ms(&self) -> u32 {
        self.void_time_ms
    }

    /// Updates the void time. Rejected if below [`MIN_SRVC_TIME_MS`].
    pub fn set_void_time(&mut self, void_time_ms: u32) -> MpbResult<()> {
        if void_time_ms < MIN_SRVC_TIME_MS {
            return Err(MpbError::InvalidParameter);
        }
        self.void_time_ms = void_time_ms;
        Ok(())
    }

    /// Whether the output is forced to a fixed level while voided.
    pub fn force_output_when_void(&self) -> bool {
        self.force_output_when_void
    }

    /// Updates the force-output-while-voided flag.
    pub fn set_force_output_when_void(&mut self, value: bool) {
        self.force_output_when_void = value;
    }

    /// The forced `is_on` level applied while voided, when
    /// `force_output_when_void` is set.
    pub fn state_on_when_forced(&self) -> bool {
        self.state_on_when_forced
    }

    /// Updates the forced `is_on` level.
    pub fn set_state_on_when_forced(&mut self, value: bool) {
        self.state_on_when_forced = value;
    }
}

impl VoidPolicy for TimedVoidable {
    fn on_enter_off_not_vpp(&mut self) {
        self.void_start_ms = None;
    }

    fn start_void_tracking(&mut self, now_ms: u64) {
        self.void_start_ms = Some(now_ms);
    }

    fn tick_void_status(&mut self, now_ms: u64, _is_on: bool) -> bool {
        match self.void_start_ms {
            Some(start) => now_ms.saturating_sub(start) as u32 >= self.void_time_ms,
            None => false,
        }
    }
}

impl SupportsTaskWhileOn for TimedVoidable {}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::core::CoreConfig;
    use crate::debounce::HW_MIN_DBNC_MS;
    use crate::platform::test_support::{FakeClock, SharedPin};
    use crate::voidable::Voidable;

    fn button(
        void_time_ms: u32,
    ) -> (Voidable<'static, SharedPin, FakeClock, TimedVoidable>, SharedPin, FakeClock) {
        let pin = SharedPin::new();
        let clock = FakeClock::new();
        let btn = Voidable::new(
            pin.clone(),
            clock.clone(),
            CoreConfig {
                pulled_up: false,
                type_no: true,
                dbnc_time_ms: HW_MIN_DBNC_MS,
                start_delay_ms: 0,
                is_on_when_disabled: false,
            },
            TimedVoidable::new(void_time_ms),
        )
        .unwrap();
        (btn, pin, clock)
    }

    /// S6-equivalent: held past `void_time_ms`, the button is forced off
    /// and voided, then cycles back to off-unvoided once released.
    #[test]
    fn long_hold_past_void_time_forces_off_and_voids() {
        let (mut btn, pin, clock) = button(500);

        pin.set_high(true);
        while clock.now_ms() < 200 {
            btn.tick().unwrap();
            clock.advance(10);
        }
        assert!(btn.core().is_on());
        assert!(!btn.is_voided());

        while clock.now_ms() < 800 {
            btn.tick().unwrap();
            clock.advance(10);
        }
        assert!(!btn.core().is_on(), "forced off once voided");
        assert!(btn.is_voided());

        pin.set_high(false);
        for _ in 0..5 {
            btn.tick().unwrap();
            clock.advance(HW_MIN_DBNC_MS as u64);
        }
        assert!(!btn.is_voided(), "unvoided after release observed");
    }

    #[test]
    fn short_press_release_never_voids() {
        let (mut btn, pin, clock) = button(5_000);

        pin.set_high(true);
        for _ in 0..3 {
            btn.tick().unwrap();
            clock.advance(HW_MIN_DBNC_MS as u64);
        }
        pin.set_high(false);
        for _ in 0..5 {
            btn.tick().unwrap();
            clock.advance(HW_MIN_DBNC_MS as u64);
        }
        assert!(!btn.core().is_on());
        assert!(!btn.is_voided());
    }

    #[test]
    fn set_is_voided_bypasses_fda() {
        let (mut btn, _pin, _clock) = button(5_000);
        assert!(!btn.is_voided());
        btn.set_is_voided();
        assert!(btn.is_voided());
        btn.set_is_not_voided();
        assert!(!btn.is_voided());
    }

    #[test]
    fn set_void_time_rejects_below_floor() {
        let mut policy = TimedVoidable::new(1_000);
        assert!(policy.set_void_time(10).is_err());
        assert_eq!(policy.void_time_ms(), 1_000);
        assert!(policy.set_void_time(2_000).is_ok());
        assert_eq!(policy.void_time_ms(), 2_000);
    }
}
