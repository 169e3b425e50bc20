//! Common button record: configuration, volatile state and the debounce
//! layer shared by every FSA family (component A/E plus the non-FSA parts
//! of the original `DbncdMPBttn` base class).
//!
//! Per-family FSA enums (in [`crate::base`], [`crate::latch`],
//! [`crate::double`], [`crate::voidable`]) each wrap a [`ButtonCore`] and
//! drive it through its `sample`/`turn_on`/`turn_off`/`clr_status` surface
//! rather than duplicating timer and pin-polarity bookkeeping.

use embedded_hal::digital::InputPin;

use crate::debounce::{DebounceConfig, DebounceState, HW_MIN_DBNC_MS};
use crate::error::{MpbError, MpbResult};
use crate::platform::{MillisClock, NotifySink, Scheduler, TaskControl, TaskHandle};

/// Default polling cadence in milliseconds, matching `STD_POLL_DELAY`.
pub const STD_POLL_DELAY_MS: u32 = 10;

/// Construction-time configuration shared by every button variant.
///
/// Groups the original's per-field constructor arguments into one struct;
/// the public setter surface (`set_dbnc_time`, …) stays per-field.
#[derive(Debug, Clone, Copy)]
pub struct CoreConfig {
    /// Electrical pull direction: `true` if the pin is pulled up at rest.
    pub pulled_up: bool,
    /// `true` for Normally-Open wiring, `false` for Normally-Closed.
    pub type_no: bool,
    /// Press-side debounce interval in milliseconds, `>= HW_MIN_DBNC_MS`.
    pub dbnc_time_ms: u32,
    /// Extra delay added to `dbnc_time_ms` before a press is declared valid.
    pub start_delay_ms: u32,
    /// `is_on` value forced while the button sits in the `Disabled` state.
    pub is_on_when_disabled: bool,
}

impl CoreConfig {
    fn debounce_config(&self) -> DebounceConfig {
        DebounceConfig::new(self.dbnc_time_ms, self.start_delay_ms)
    }
}

/// The shared record every button variant embeds: pin/clock access,
/// debounce timers, common volatile flags and the optional collaborators
/// (scheduler, notification sink, while-on task, user callbacks).
pub struct ButtonCore<'a, PIN, CLK> {
    pin: PIN,
    clock: CLK,
    config: CoreConfig,
    debounce: DebounceState,

    is_pressed: bool,
    is_on: bool,
    is_enabled: bool,
    valid_disable_pend: bool,
    valid_enable_pend: bool,
    outputs_changed: bool,
    last_error: Option<MpbError>,

    poll_handle: Option<TaskHandle>,
    scheduler: Option<&'a mut dyn Scheduler>,
    notify_sink: Option<&'a mut dyn NotifySink>,
    task_while_on: Option<&'a mut dyn TaskControl>,
    on_turn_on: Option<fn()>,
    on_turn_off: Option<fn()>,
}

impl<'a, PIN, CLK> ButtonCore<'a, PIN, CLK>
where
    PIN: InputPin,
    CLK: MillisClock,
{
    /// Builds a new core from a pin, a clock and a configuration. The
    /// button starts enabled, off and with all collaborators unset.
    pub fn new(pin: PIN, clock: CLK, config: CoreConfig) -> MpbResult<Self> {
        if config.dbnc_time_ms < HW_MIN_DBNC_MS {
            return Err(MpbError::InvalidParameter);
        }
        Ok(Self {
            pin,
            clock,
            config,
            debounce: DebounceState::new(),
            is_pressed: false,
            is_on: false,
            is_enabled: true,
            valid_disable_pend: false,
            valid_enable_pend: false,
            outputs_changed: false,
            last_error: None,
            poll_handle: None,
            scheduler: None,
            notify_sink: None,
            task_while_on: None,
            on_turn_on: None,
            on_turn_off: None,
        })
    }

    /// Maps a raw electrical pin level to the "pressed" boolean, per the
    /// NO/NC × pulled-up/not truth table: pressed iff the electrical level
    /// being high disagrees with `pulled_up == type_no`.
    fn raw_pressed(electrical_high: bool, pulled_up: bool, type_no: bool) -> bool {
        electrical_high != (pulled_up == type_no)
    }

    fn read_pressed(&mut self) -> MpbResult<bool> {
        let high = self
            .pin
            .is_high()
            .map_err(|_| MpbError::TransportFault)?;
        Ok(Self::raw_pressed(high, self.config.pulled_up, self.config.type_no))
    }

    /// Samples the pin and advances the debounce timers, unless the button
    /// is currently disabled (pending flags are frozen, matching spec
    /// §4.1's "sampling while disabled is skipped"). Always refreshes
    /// `is_pressed` so the FSA's disabled-exit guard ("button next observed
    /// released") keeps working even while disabled.
    pub fn sample(&mut self) -> MpbResult<()> {
        let pressed = self.read_pressed()?;
        self.is_pressed = pressed;
        if self.is_enabled {
            let now_ms = self.clock.now_ms();
            let cfg = self.config.debounce_config();
            self.debounce.sample(now_ms, pressed, &cfg);
        }
        Ok(())
    }

    /// Samples the pin and advances debounce timers as a double-action
    /// variant, which needs the secondary-mode promotion threshold.
    pub fn sample_with_secondary(&mut self, secondary_mode_delay_ms: u32) -> MpbResult<()> {
        let pressed = self.read_pressed()?;
        self.is_pressed = pressed;
        if self.is_enabled {
            let now_ms = self.clock.now_ms();
            let cfg = self
                .config
                .debounce_config()
                .with_secondary_mode_delay(secondary_mode_delay_ms);
            self.debounce.sample(now_ms, pressed, &cfg);
        }
        Ok(())
    }

    /// The shared monotonic clock, for FSA families that run their own
    /// timers (service time, void time, slider pacing) alongside debounce.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Current debounced pending flags, read-only from the FSA's point of
    /// view; cleared via the `clear_*` methods below as each FSA consumes
    /// them.
    pub fn debounce(&self) -> &DebounceState {
        &self.debounce
    }

    /// Mutable access so an FSA step can clear pending flags it consumed.
    pub fn debounce_mut(&mut self) -> &mut DebounceState {
        &mut self.debounce
    }

    /// Turns the button on if it is not already on: flips `is_on`, marks
    /// outputs changed, resumes the while-on task and invokes the
    /// registered turn-on callback. Idempotent.
    pub fn turn_on(&mut self) {
        if !self.is_on {
            if let Some(task) = self.task_while_on.as_deref_mut() {
                task.resume();
            }
            if let Some(f) = self.on_turn_on {
                f();
            }
            self.is_on = true;
            self.outputs_changed = true;
        }
    }

    /// Turns the button off if it is not already off. Idempotent, mirror
    /// image of [`Self::turn_on`].
    pub fn turn_off(&mut self) {
        if self.is_on {
            if let Some(task) = self.task_while_on.as_deref_mut() {
                task.suspend();
            }
            if let Some(f) = self.on_turn_off {
                f();
            }
            self.is_on = false;
            self.outputs_changed = true;
        }
    }

    /// Resets pending flags and debounce timers. When `clear_is_on` is
    /// true, also turns the button off if it was on; `is_on` is otherwise
    /// left untouched. Mirrors `clrStatus`.
    pub fn clr_status(&mut self, clear_is_on: bool) {
        self.is_pressed = false;
        self.debounce.reset();
        if clear_is_on {
            self.turn_off();
        }
    }

    /// Requests a disable; queued as a pending flag, resolved by the FSA.
    pub fn request_disable(&mut self) {
        if self.is_enabled {
            self.valid_disable_pend = true;
            self.valid_enable_pend = false;
        }
    }

    /// Requests an enable; queued as a pending flag, resolved by the FSA.
    pub fn request_enable(&mut self) {
        if !self.is_enabled {
            self.valid_enable_pend = true;
            self.valid_disable_pend = false;
        }
    }

    /// Whether a disable request is pending FSA processing.
    pub fn valid_disable_pend(&self) -> bool {
        self.valid_disable_pend
    }

    /// Clears the pending disable flag.
    pub fn clear_valid_disable_pend(&mut self) {
        self.valid_disable_pend = false;
    }

    /// Whether an enable request is pending FSA processing.
    pub fn valid_enable_pend(&self) -> bool {
        self.valid_enable_pend
    }

    /// Clears the pending enable flag.
    pub fn clear_valid_enable_pend(&mut self) {
        self.valid_enable_pend = false;
    }

    /// Forces the enabled flag directly, used by the `Disabled` state's
    /// entry/exit hooks rather than the public `enable`/`disable` request
    /// path.
    pub fn set_enabled_flag(&mut self, enabled: bool) {
        self.is_enabled = enabled;
    }

    /// Marks that an output-visible field changed this tick.
    pub fn set_outputs_changed(&mut self) {
        self.outputs_changed = true;
    }

    /// Takes (clears) the outputs-changed flag, returning its prior value.
    /// Used by the per-tick orchestrator to decide whether to post a
    /// notification.
    pub fn take_outputs_changed(&mut self) -> bool {
        ::core::mem::replace(&mut self.outputs_changed, false)
    }

    /// Reads the outputs-changed flag without clearing it.
    pub fn outputs_change(&self) -> bool {
        self.outputs_changed
    }

    /// Posts `status` to the registered notification sink, if any. Sets the
    /// sticky transport-fault error flag on failure — posting never panics
    /// and never blocks, since [`NotifySink::post`] is an overwrite.
    pub fn notify(&mut self, status: u32) {
        if let Some(sink) = self.notify_sink.as_deref_mut() {
            if !sink.post(status) {
                self.last_error = Some(MpbError::TransportFault);
            }
        }
    }

    /// Registers the notification sink. Replaces any previous registration.
    pub fn set_notify_sink(&mut self, sink: &'a mut dyn NotifySink) {
        self.notify_sink = Some(sink);
    }

    /// Registers the while-on helper task. The previous task (if any) is
    /// left in whatever suspend state it was in; the library never deletes
    /// collaborator tasks, only suspends/resumes them.
    pub fn set_task_while_on(&mut self, task: &'a mut dyn TaskControl) {
        self.task_while_on = Some(task);
    }

    /// Registers the user turn-on callback.
    pub fn set_fn_on_turn_on(&mut self, f: fn()) {
        self.on_turn_on = Some(f);
    }

    /// Registers the user turn-off callback.
    pub fn set_fn_on_turn_off(&mut self, f: fn()) {
        self.on_turn_off = Some(f);
    }

    /// Starts the periodic callback at `poll_ms`. Idempotent if already
    /// started. Returns `ResourceUnavailable` if the scheduler rejects
    /// creation/start.
    pub fn begin(&mut self, poll_ms: u32) -> MpbResult<()> {
        if poll_ms == 0 {
            return Err(MpbError::InvalidParameter);
        }
        if self.poll_handle.is_some() {
            return Ok(());
        }
        let scheduler = self
            .scheduler
            .as_deref_mut()
            .ok_or(MpbError::ResourceUnavailable)?;
        let handle = scheduler.create(poll_ms as u64);
        scheduler.start(handle);
        self.poll_handle = Some(handle);
        Ok(())
    }

    /// Registers the scheduler collaborator used by [`Self::begin`]/
    /// [`Self::pause`]/[`Self::resume`]/[`Self::end`].
    pub fn set_scheduler(&mut self, scheduler: &'a mut dyn Scheduler) {
        self.scheduler = Some(scheduler);
    }

    /// Stops the periodic callback without losing configuration or the
    /// scheduler registration.
    pub fn pause(&mut self) -> MpbResult<()> {
        let handle = self.poll_handle.ok_or(MpbError::ResourceUnavailable)?;
        let scheduler = self
            .scheduler
            .as_deref_mut()
            .ok_or(MpbError::ResourceUnavailable)?;
        scheduler.stop(handle);
        Ok(())
    }

    /// Restarts the periodic callback. Callers must call
    /// [`Self::clr_status`]`(false)` (via their FSA's `reset_fda`) before
    /// this, since resuming mid-press could otherwise fabricate a spurious
    /// valid press.
    pub fn resume(&mut self) -> MpbResult<()> {
        let handle = self.poll_handle.ok_or(MpbError::ResourceUnavailable)?;
        let scheduler = self
            .scheduler
            .as_deref_mut()
            .ok_or(MpbError::ResourceUnavailable)?;
        scheduler.start(handle);
        Ok(())
    }

    /// Stops and frees the periodic callback.
    pub fn end(&mut self) -> MpbResult<()> {
        if let Some(handle) = self.poll_handle.take() {
            let scheduler = self
                .scheduler
                .as_deref_mut()
                .ok_or(MpbError::ResourceUnavailable)?;
            scheduler.stop(handle);
            scheduler.delete(handle);
        }
        Ok(())
    }

    /// Raw (non-debounced) pressed state, refreshed every tick.
    pub fn is_pressed(&self) -> bool {
        self.is_pressed
    }

    /// Debounced on/off output.
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Whether the button currently accepts input.
    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    /// `true` once a notification post has failed and not yet been
    /// acknowledged by [`Self::clear_last_error`].
    pub fn last_error(&self) -> Option<MpbError> {
        self.last_error
    }

    /// Acknowledges and clears the sticky error flag.
    pub fn clear_last_error(&mut self) {
        self.last_error = None;
    }

    /// Updates the press-side debounce time. Rejected (returns `false`,
    /// `Ok(false)`... actually) if below [`HW_MIN_DBNC_MS`].
    pub fn set_dbnc_time(&mut self, dbnc_time_ms: u32) -> bool {
        if dbnc_time_ms < HW_MIN_DBNC_MS {
            return false;
        }
        self.config.dbnc_time_ms = dbnc_time_ms;
        true
    }

    /// Current press-side debounce time.
    pub fn get_cur_dbnc_time(&self) -> u32 {
        self.config.dbnc_time_ms
    }

    /// Updates the additional start delay added before a press is valid.
    pub fn set_start_delay(&mut self, start_delay_ms: u32) {
        self.config.start_delay_ms = start_delay_ms;
    }

    /// Current start delay.
    pub fn get_starts_delay(&self) -> u32 {
        self.config.start_delay_ms
    }

    /// Updates the `is_on` value forced while disabled. If the button is
    /// currently disabled, applies the new value immediately.
    pub fn set_is_on_when_disabled(&mut self, value: bool) {
        self.config.is_on_when_disabled = value;
        if !self.is_enabled {
            if value {
                self.turn_on();
            } else {
                self.turn_off();
            }
        }
    }

    /// Current `is_on_when_disabled` configuration.
    pub fn get_is_on_when_disabled(&self) -> bool {
        self.config.is_on_when_disabled
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::platform::test_support::FakeClock;

    struct AlwaysHighPin;

    impl embedded_hal::digital::ErrorType for AlwaysHighPin {
        type Error = ::core::convert::Infallible;
    }

    impl InputPin for AlwaysHighPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(true)
        }
        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(false)
        }
    }

    fn make_core() -> ButtonCore<'static, AlwaysHighPin, FakeClock> {
        ButtonCore::new(
            AlwaysHighPin,
            FakeClock::new(),
            CoreConfig {
                pulled_up: false,
                type_no: true,
                dbnc_time_ms: 50,
                start_delay_ms: 0,
                is_on_when_disabled: false,
            },
        )
        .unwrap()
    }

    #[test]
    fn pin_polarity_truth_table_matches_original() {
        assert!(ButtonCore::<AlwaysHighPin, FakeClock>::raw_pressed(true, false, true));
        assert!(!ButtonCore::<AlwaysHighPin, FakeClock>::raw_pressed(false, false, true));
        assert!(!ButtonCore::<AlwaysHighPin, FakeClock>::raw_pressed(true, true, true));
        assert!(ButtonCore::<AlwaysHighPin, FakeClock>::raw_pressed(false, true, true));
        assert!(!ButtonCore::<AlwaysHighPin, FakeClock>::raw_pressed(true, false, false));
        assert!(ButtonCore::<AlwaysHighPin, FakeClock>::raw_pressed(false, false, false));
        assert!(ButtonCore::<AlwaysHighPin, FakeClock>::raw_pressed(true, true, false));
        assert!(!ButtonCore::<AlwaysHighPin, FakeClock>::raw_pressed(false, true, false));
    }

    #[test]
    fn rejects_debounce_time_below_hardware_floor() {
        let result = ButtonCore::new(
            AlwaysHighPin,
            FakeClock::new(),
            CoreConfig {
                pulled_up: false,
                type_no: true,
                dbnc_time_ms: 5,
                start_delay_ms: 0,
                is_on_when_disabled: false,
            },
        );
        assert_eq!(result.err(), Some(MpbError::InvalidParameter));
    }

    #[test]
    fn turn_on_turn_off_are_idempotent() {
        let mut core = make_core();
        core.turn_on();
        assert!(core.is_on());
        assert!(core.take_outputs_changed());
        core.turn_on();
        assert!(!core.take_outputs_changed());
        core.turn_off();
        assert!(!core.is_on());
        assert!(core.take_outputs_changed());
        core.turn_off();
        assert!(!core.take_outputs_changed());
    }

    #[test]
    fn set_dbnc_time_rejects_values_below_floor() {
        let mut core = make_core();
        assert!(!core.set_dbnc_time(10));
        assert_eq!(core.get_cur_dbnc_time(), 50);
        assert!(core.set_dbnc_time(100));
        assert_eq!(core.get_cur_dbnc_time(), 100);
    }

    #[test]
    fn outputs_change_reads_without_clearing() {
        let mut core = make_core();
        core.turn_on();
        assert!(core.outputs_change());
        assert!(core.outputs_change());
        assert!(core.take_outputs_changed());
        assert!(!core.outputs_change());
    }

    #[test]
    fn failed_notify_sets_sticky_transport_fault() {
        use crate::platform::test_support::RecordingNotifySink;

        let mut core = make_core();
        let mut sink = RecordingNotifySink::new();
        sink.fail_next_post();
        core.set_notify_sink(&mut sink);

        assert_eq!(core.last_error(), None);
        core.notify(0);
        assert_eq!(core.last_error(), Some(MpbError::TransportFault));

        core.clear_last_error();
        assert_eq!(core.last_error(), None);
        core.notify(0);
        assert_eq!(core.last_error(), None);
    }
}
