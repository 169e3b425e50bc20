//! Timed latch: unlatches automatically after `service_time_ms` on.
//!
//! Grounded on `TmLtchMPBttn`: the service timer starts at `stOffVPP_Out`
//! (entering `OnNVRP`, right after turn-on) and, once elapsed, both the
//! unlatch and unlatch-release conditions fire at once — a timed latch
//! does not wait for any further external input to finish its cycle.

use crate::debounce::HW_MIN_DBNC_MS;
use crate::latch::LatchPolicy;

/// Minimum accepted service time, per spec's `MIN_SRVC_TIME`.
pub const MIN_SRVC_TIME_MS: u32 = 100;

/// Policy implementing a service-time-based unlatch.
#[derive(Debug, Clone, Copy)]
pub struct TimedLatch {
    service_time_ms: u32,
    /// When true, each new valid press while latched restarts the timer.
    tm_restartable: bool,
    trn_off_asap: bool,
    service_start_ms: Option<u64>,
    unlatch_pend: bool,
    unlatch_release_pend: bool,
}

impl TimedLatch {
    /// Builds a timed-latch policy. `service_time_ms` is clamped up to
    /// [`MIN_SRVC_TIME_MS`] rather than rejected, matching the original's
    /// tolerant constructor behavior (a deliberate deviation from the
    /// usual "reject and return false" rule, preserved here since it is
    /// construction-time, not a setter).
    pub fn new(service_time_ms: u32, tm_restartable: bool, trn_off_asap: bool) -> Self {
        Self {
            service_time_ms: service_time_ms.max(MIN_SRVC_TIME_MS),
            tm_restartable,
            trn_off_asap,
            service_start_ms: None,
            unlatch_pend: false,
            unlatch_release_pend: false,
        }
    }

    /// Current service time.
    pub fn service_time_ms(&self) -> u32 {
        self.service_time_ms
    }

    /// Updates the service time. Rejected if below [`MIN_SRVC_TIME_MS`].
    pub fn set_service_time(&mut self, service_time_ms: u32) -> bool {
        if service_time_ms < MIN_SRVC_TIME_MS {
            return false;
        }
        self.service_time_ms = service_time_ms;
        true
    }

    /// Whether the service timer restarts on each fresh press while latched.
    pub fn tm_restartable(&self) -> bool {
        self.tm_restartable
    }

    /// Updates the restartable flag.
    pub fn set_tm_restartable(&mut self, tm_restartable: bool) {
        self.tm_restartable = tm_restartable;
    }

    /// Whether the button turns off as soon as the service time elapses,
    /// rather than staying on until an external unlatch-release.
    pub fn trn_off_asap(&self) -> bool {
        self.trn_off_asap
    }

    /// Updates `trn_off_asap`.
    pub fn set_trn_off_asap(&mut self, trn_off_asap: bool) {
        self.trn_off_asap = trn_off_asap;
    }
}

impl LatchPolicy for TimedLatch {
    fn on_enter_on_nvrp(&mut self, now_ms: u64) {
        self.service_start_ms = Some(now_ms);
    }

    fn tick_latched(&mut self, now_ms: u64, valid_press_pend: bool, _valid_release_pend: bool) {
        if valid_press_pend && self.tm_restartable {
            self.service_start_ms = Some(now_ms);
        }
        if let Some(start) = self.service_start_ms {
            let elapsed = now_ms.saturating_sub(start) as u32;
            if elapsed >= self.service_time_ms {
                self.unlatch_pend = true;
                self.unlatch_release_pend = true;
            }
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
        self.service_start_ms = None;
        self.unlatch_pend = false;
        self.unlatch_release_pend = false;
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::core::CoreConfig;
    use crate::latch::Latched;
    use crate::platform::test_support::{FakeClock, SharedPin};

    fn button(
        service_time_ms: u32,
    ) -> (Latched<'static, SharedPin, FakeClock, TimedLatch>, SharedPin, FakeClock) {
        let pin = SharedPin::new();
        let clock = FakeClock::new();
        let btn = Latched::new(
            pin.clone(),
            clock.clone(),
            CoreConfig {
                pulled_up: false,
                type_no: true,
                dbnc_time_ms: HW_MIN_DBNC_MS,
                start_delay_ms: 0,
                is_on_when_disabled: false,
            },
            TimedLatch::new(service_time_ms, true, true),
        )
        .unwrap();
        (btn, pin, clock)
    }

    /// S2 (timed latch unlatch): a short press latches the button on; it
    /// stays latched comfortably inside the service time window, then
    /// unlatches automatically once the service time elapses.
    #[test]
    fn s2_timed_latch_unlatches_after_service_time() {
        let (mut btn, pin, clock) = button(500);

        pin.set_high(true);
        for _ in 0..3 {
            btn.tick().unwrap();
            clock.advance(HW_MIN_DBNC_MS as u64);
        }
        pin.set_high(false);
        // Enough ticks to clear the release debounce and settle into the
        // latched state, well short of the 500ms service time.
        for _ in 0..5 {
            btn.tick().unwrap();
            clock.advance(HW_MIN_DBNC_MS as u64);
        }

        assert!(btn.core().is_on());
        assert!(btn.is_latched());

        for _ in 0..40 {
            btn.tick().unwrap();
            clock.advance(HW_MIN_DBNC_MS as u64);
        }

        assert!(!btn.core().is_on());
        assert!(!btn.is_latched());
    }
}
