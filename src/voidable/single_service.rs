//! Single-service voidable: the void condition is just "currently on" —
//! voiding fires the instant the button turns on and the FSA drives it
//! straight through a forced-off, auto-unvoid cycle. Grounded on
//! `SnglSrvcVdblMPBttn`.
//!
//! `force_output_when_void`/`state_on_when_forced` are fixed at
//! `true`/`false` here, matching the original's constructor comment ("this
//! attribute is subclass inherent characteristic, no setter will be
//! provided for it") — no setters are exposed, and this policy does not
//! implement [`crate::voidable::SupportsTaskWhileOn`], matching
//! `setTaskWhileOn`'s no-op override.

use crate::voidable::VoidPolicy;

/// Policy implementing an on-triggered, one-shot void condition.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleServiceVoidable {
    _private: (),
}

impl SingleServiceVoidable {
    /// Builds a single-service-voidable policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed `true`: this variant always forces its output while voided.
    pub fn force_output_when_void(&self) -> bool {
        true
    }

    /// Fixed `false`: the forced level while voided is always off.
    pub fn state_on_when_forced(&self) -> bool {
        false
    }
}

impl VoidPolicy for SingleServiceVoidable {
    fn on_enter_off_not_vpp(&mut self) {}

    fn start_void_tracking(&mut self, _now_ms: u64) {}

    fn tick_void_status(&mut self, _now_ms: u64, is_on: bool) -> bool {
        is_on
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::core::CoreConfig;
    use crate::debounce::HW_MIN_DBNC_MS;
    use crate::platform::test_support::{FakeClock, SharedPin};
    use crate::voidable::Voidable;

    fn button() -> (Voidable<'static, SharedPin, FakeClock, SingleServiceVoidable>, SharedPin, FakeClock) {
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
            SingleServiceVoidable::new(),
        )
        .unwrap();
        (btn, pin, clock)
    }

    /// A held press turns the button on only fleetingly: the FSA observes
    /// `is_on` voided almost immediately and drives it back off, one state
    /// per tick, before `is_on` has been visible for long. The button then
    /// waits (voided, off) for the release before unvoiding.
    #[test]
    fn press_turns_on_briefly_then_fda_forces_voided_off() {
        let (mut btn, pin, clock) = button();

        pin.set_high(true);
        for _ in 0..2 {
            btn.tick().unwrap();
            clock.advance(HW_MIN_DBNC_MS as u64);
        }
        // One more tick consumes the declared press (OffVPP), turning on.
        btn.tick().unwrap();
        clock.advance(10);
        assert!(btn.core().is_on());
        assert!(!btn.is_voided());

        // Next tick: void status is now true (is_on), OnNVRP -> OnVVP.
        btn.tick().unwrap();
        clock.advance(10);
        // Next tick: OnVVP -> OnVddNVUP, voided flag raised.
        btn.tick().unwrap();
        clock.advance(10);
        assert!(btn.is_voided());
        // Next tick: OnVddNVUP -> OffVddNVUP, forced off.
        btn.tick().unwrap();
        clock.advance(10);
        assert!(!btn.core().is_on());
        assert!(btn.is_voided(), "stays voided until release is observed");

        pin.set_high(false);
        for _ in 0..6 {
            btn.tick().unwrap();
            clock.advance(HW_MIN_DBNC_MS as u64);
        }
        assert!(!btn.is_voided(), "unvoided once the release is processed");
        assert!(!btn.core().is_on());
    }
}
