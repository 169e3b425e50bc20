//! Hinted-timed latch: a timed latch that also exposes a pilot lamp (armed,
//! off) and a warning lamp (about to time out).
//!
//! Grounded on `HntdTmLtchMPBttn`, which layers pilot/warning bookkeeping on
//! top of `TmLtchMPBttn`'s service timer. Re-expressed here as its own
//! self-contained [`LatchPolicy`] (composition over the original's
//! inheritance) rather than wrapping a [`crate::latch::timed::TimedLatch`],
//! since the warning computation (`updWrnngOn`) needs the same
//! `service_start_ms` the unlatch computation does and duplicating that one
//! field is simpler than threading a second policy's private state through.

use crate::latch::LatchPolicy;
use crate::latch::timed::MIN_SRVC_TIME_MS;

/// Policy implementing a timed unlatch plus pilot/warning indicator bits.
#[derive(Debug, Clone, Copy)]
pub struct HintedTimedLatch {
    service_time_ms: u32,
    tm_restartable: bool,
    trn_off_asap: bool,
    /// 0-100; `warning_ms = service_time_ms * warning_percent / 100`.
    warning_percent: u32,
    /// When true, the pilot lamp tracks "armed but off" while enabled; when
    /// false the pilot lamp is always off.
    keep_pilot: bool,

    service_start_ms: Option<u64>,
    unlatch_pend: bool,
    unlatch_release_pend: bool,
    pilot_on: bool,
    warning_on: bool,
    /// Set whenever `pilot_on`/`warning_on` flip, independent of what caused
    /// the flip; drained by [`LatchPolicy::take_outputs_changed`].
    outputs_changed: bool,

    on_turn_on_pilot: Option<fn()>,
    on_turn_off_pilot: Option<fn()>,
    on_turn_on_warning: Option<fn()>,
    on_turn_off_warning: Option<fn()>,
}

impl HintedTimedLatch {
    /// Builds a hinted-timed-latch policy. `service_time_ms` is clamped up
    /// to [`MIN_SRVC_TIME_MS`]; `warning_percent` is clamped to `0..=100`,
    /// matching the original's tolerant constructors.
    pub fn new(
        service_time_ms: u32,
        warning_percent: u32,
        tm_restartable: bool,
        trn_off_asap: bool,
        keep_pilot: bool,
    ) -> Self {
        Self {
            service_time_ms: service_time_ms.max(MIN_SRVC_TIME_MS),
            tm_restartable,
            trn_off_asap,
            warning_percent: warning_percent.min(100),
            keep_pilot,
            service_start_ms: None,
            unlatch_pend: false,
            unlatch_release_pend: false,
            pilot_on: false,
            warning_on: false,
            outputs_changed: false,
            on_turn_on_pilot: None,
            on_turn_off_pilot: None,
            on_turn_on_warning: None,
            on_turn_off_warning: None,
        }
    }

    fn warning_ms(&self) -> u32 {
        self.service_time_ms * self.warning_percent / 100
    }

    /// Registers the user callback fired when the pilot lamp turns on.
    pub fn set_fn_on_turn_on_pilot(&mut self, f: fn()) {
        self.on_turn_on_pilot = Some(f);
    }

    /// Registers the user callback fired when the pilot lamp turns off.
    pub fn set_fn_on_turn_off_pilot(&mut self, f: fn()) {
        self.on_turn_off_pilot = Some(f);
    }

    /// Registers the user callback fired when the warning lamp turns on.
    pub fn set_fn_on_turn_on_warning(&mut self, f: fn()) {
        self.on_turn_on_warning = Some(f);
    }

    /// Registers the user callback fired when the warning lamp turns off.
    pub fn set_fn_on_turn_off_warning(&mut self, f: fn()) {
        self.on_turn_off_warning = Some(f);
    }

    fn set_pilot(&mut self, on: bool) {
        if self.pilot_on != on {
            self.pilot_on = on;
            self.outputs_changed = true;
            let f = if on { self.on_turn_on_pilot } else { self.on_turn_off_pilot };
            if let Some(f) = f {
                f();
            }
        }
    }

    fn set_warning(&mut self, on: bool) {
        if self.warning_on != on {
            self.warning_on = on;
            self.outputs_changed = true;
            let f = if on { self.on_turn_on_warning } else { self.on_turn_off_warning };
            if let Some(f) = f {
                f();
            }
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

    /// Updates `trn_off_asap`.
    pub fn set_trn_off_asap(&mut self, trn_off_asap: bool) {
        self.trn_off_asap = trn_off_asap;
    }

    /// Current warning threshold, as a percentage of the service time.
    pub fn warning_percent(&self) -> u32 {
        self.warning_percent
    }

    /// Updates the warning threshold. Rejected if over 100.
    pub fn set_warning_percent(&mut self, warning_percent: u32) -> bool {
        if warning_percent > 100 {
            return false;
        }
        self.warning_percent = warning_percent;
        true
    }

    /// Whether the pilot lamp tracks "armed but off" while enabled.
    pub fn keep_pilot(&self) -> bool {
        self.keep_pilot
    }

    /// Updates `keep_pilot`.
    pub fn set_keep_pilot(&mut self, keep_pilot: bool) {
        self.keep_pilot = keep_pilot;
        if !keep_pilot {
            self.set_pilot(false);
        }
    }
}

impl LatchPolicy for HintedTimedLatch {
    fn on_enter_on_nvrp(&mut self, now_ms: u64) {
        self.service_start_ms = Some(now_ms);
        self.set_pilot(false);
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
        self.set_warning(false);
    }

    fn pilot_on(&self) -> bool {
        self.pilot_on
    }

    fn warning_on(&self) -> bool {
        self.warning_on
    }

    /// Mirrors `updWrnngOn`/`updPilotOn`: runs every tick while enabled,
    /// independent of FSA state. Warning only evaluates while on (requires
    /// `is_on` from the caller); pilot only evaluates while off.
    fn tick_while_enabled(&mut self, now_ms: u64, is_on: bool) {
        if self.warning_percent > 0 {
            if is_on {
                if let Some(start) = self.service_start_ms {
                    let elapsed = now_ms.saturating_sub(start) as u32;
                    let on = elapsed >= self.service_time_ms.saturating_sub(self.warning_ms());
                    self.set_warning(on);
                } else {
                    self.set_warning(false);
                }
            } else {
                self.set_warning(false);
            }
        }
        if self.keep_pilot {
            self.set_pilot(!is_on);
        } else {
            self.set_pilot(false);
        }
    }

    fn on_enter_off_not_vpp(&mut self) {
        if self.keep_pilot {
            self.set_pilot(true);
        }
        self.set_warning(false);
    }

    fn on_enter_disabled(&mut self) {
        self.set_warning(false);
        self.set_pilot(self.keep_pilot);
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
    use crate::latch::Latched;
    use crate::platform::test_support::{FakeClock, RecordingNotifySink, SharedPin};
    use crate::status::OutputFlags;

    fn button(
        service_time_ms: u32,
        warning_percent: u32,
    ) -> (Latched<'static, SharedPin, FakeClock, HintedTimedLatch>, SharedPin, FakeClock) {
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
            HintedTimedLatch::new(service_time_ms, warning_percent, true, true, false),
        )
        .unwrap();
        (btn, pin, clock)
    }

    /// S5 (hinted warning): `service=10000ms, warning_percent=20` — warning
    /// turns on near 8000ms into the on interval and off again once the
    /// latch unlatches at 10000ms.
    #[test]
    fn s5_warning_turns_on_near_threshold_and_off_on_unlatch() {
        let (mut btn, pin, clock) = button(10_000, 20);

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
        assert!(btn.core().is_on());
        assert!(!btn.output_flags().wrnng_on);

        // Jump most of the way to the warning threshold (~8000ms in).
        while clock.now_ms() < 8_100 {
            btn.tick().unwrap();
            clock.advance(HW_MIN_DBNC_MS as u64);
        }
        assert!(btn.output_flags().wrnng_on);

        while btn.core().is_on() {
            btn.tick().unwrap();
            clock.advance(HW_MIN_DBNC_MS as u64);
        }
        assert!(!btn.output_flags().wrnng_on);
    }

    #[test]
    fn keep_pilot_tracks_inverse_of_is_on_while_enabled() {
        let (mut btn, pin, clock) = button(1_000, 0);
        btn.policy_mut().set_keep_pilot(true);

        btn.tick().unwrap();
        assert!(btn.output_flags().pilot_on);

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
        assert!(btn.core().is_on());
        assert!(!btn.output_flags().pilot_on);
    }

    /// The warning bit flipping is the only output change at that tick —
    /// `is_on` stays true throughout — so this isolates that the policy's
    /// pilot/warning transitions themselves mark outputs-changed instead of
    /// relying on some other flag flip to piggyback a notification.
    #[test]
    fn warning_transition_posts_a_notification_on_its_own() {
        let pin = SharedPin::new();
        let clock = FakeClock::new();
        let mut sink = RecordingNotifySink::new();
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
            HintedTimedLatch::new(10_000, 20, true, true, false),
        )
        .unwrap();
        btn.core_mut().set_notify_sink(&mut sink);

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
        assert!(btn.core().is_on());

        while clock.now_ms() < 7_900 {
            btn.tick().unwrap();
            clock.advance(HW_MIN_DBNC_MS as u64);
        }
        assert!(!btn.output_flags().wrnng_on);
        let count_before = sink.post_count();

        while !btn.output_flags().wrnng_on {
            btn.tick().unwrap();
            clock.advance(HW_MIN_DBNC_MS as u64);
        }
        assert!(sink.post_count() > count_before, "warning turning on must post a notification");
        assert_eq!(sink.last().map(OutputFlags::decode).map(|f| f.wrnng_on), Some(true));
    }
}
