//! Toggle latch: a latched valid press becomes the unlatch condition, the
//! subsequent release becomes the unlatch-release condition.
//!
//! Grounded on `TgglLtchMPBttn::updValidUnlatchStatus`. Also the one
//! variant (with [`crate::latch::external::ExternalUnlatch`]) that honors a
//! disable request while waiting in `OffNVURP`, per
//! `TgglLtchMPBttn::stOffNVURP_Do`.

use crate::latch::LatchPolicy;

/// Policy implementing toggle-style unlatch: press again to unlatch.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToggleLatch {
    trn_off_asap: bool,
    unlatch_pend: bool,
    unlatch_release_pend: bool,
}

impl ToggleLatch {
    /// Builds a toggle-latch policy.
    pub fn new(trn_off_asap: bool) -> Self {
        Self {
            trn_off_asap,
            ..Default::default()
        }
    }

    /// Updates `trn_off_asap`.
    pub fn set_trn_off_asap(&mut self, trn_off_asap: bool) {
        self.trn_off_asap = trn_off_asap;
    }
}

impl LatchPolicy for ToggleLatch {
    fn on_enter_on_nvrp(&mut self, _now_ms: u64) {}

    fn tick_latched(&mut self, _now_ms: u64, valid_press_pend: bool, valid_release_pend: bool) {
        if valid_press_pend {
            self.unlatch_pend = true;
        }
        if valid_release_pend {
            self.unlatch_release_pend = true;
        }
    }

    fn valid_unlatch_pend(&self) -> bool {
        self.unlatch_pend
    }

    fn valid_unlatch_release_pend(&self) -> bool {
        self.unlatch_release_pend
    }

    fn trn_off_asap(&self) -> bool {
        self.trn_off_asap
    }

    fn reset(&mut self) {
        self.unlatch_pend = false;
        self.unlatch_release_pend = false;
    }

    fn checks_disable_in_off_nvurp(&self) -> bool {
        true
    }

    fn on_disabled_while_off_nvurp(&mut self) {
        self.unlatch_release_pend = false;
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::core::CoreConfig;
    use crate::debounce::HW_MIN_DBNC_MS;
    use crate::latch::Latched;
    use crate::platform::test_support::{FakeClock, SharedPin};

    fn press_release(pin: &SharedPin, clock: &FakeClock, btn: &mut Latched<'static, SharedPin, FakeClock, ToggleLatch>, ticks: u32) {
        pin.set_high(true);
        for _ in 0..ticks {
            btn.tick().unwrap();
            clock.advance(HW_MIN_DBNC_MS as u64);
        }
        pin.set_high(false);
        for _ in 0..ticks {
            btn.tick().unwrap();
            clock.advance(HW_MIN_DBNC_MS as u64);
        }
    }

    #[test]
    fn second_press_release_cycle_unlatches() {
        let pin = SharedPin::new();
        let clock = FakeClock::new();
        let mut btn = Latched::new(
            pin.clone(),
            clock.clone(),
            CoreConfig {
                pulled_up: false,
                type_no: true,
                dbnc_time_ms: HW_MIN_DBNC_MS,
                start_delay_ms: 0,
                is_on_when_disabled: false,
            },
            ToggleLatch::new(true),
        )
        .unwrap();

        press_release(&pin, &clock, &mut btn, 5);
        assert!(btn.core().is_on());
        assert!(btn.is_latched());

        press_release(&pin, &clock, &mut btn, 5);
        // A few extra ticks to let the tail states (LtchdVUP..OffVURP) drain.
        for _ in 0..5 {
            btn.tick().unwrap();
            clock.advance(HW_MIN_DBNC_MS as u64);
        }
        assert!(!btn.core().is_on());
        assert!(!btn.is_latched());
    }
}
