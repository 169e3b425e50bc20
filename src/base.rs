//! Base FSA family (component F): the plain momentary-to-on/off machine
//! every other family extends. Grounded directly on
//! `DbncdMPBttn::updFdaState` in the original implementation.

use embedded_hal::digital::InputPin;

use crate::core::{ButtonCore, CoreConfig};
use crate::error::MpbResult;
use crate::platform::{CompanionSwitch, MillisClock};
use crate::status::OutputFlags;

/// The five states of the base FSA. Initial state is `OffNotVPP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseState {
    /// Idle: not pressed, no valid press pending.
    OffNotVPP,
    /// A valid press just landed; transitional, turns the button on.
    OffVPP,
    /// On, waiting for a valid release.
    On,
    /// A valid release just landed; transitional, turns the button off.
    OnVRP,
    /// Disabled: input ignored until next observed released.
    Disabled,
}

/// A debounced momentary button: `is_on` tracks whether the button is
/// currently pressed (after debouncing), nothing more.
pub struct DebouncedButton<'a, PIN, CLK> {
    core: ButtonCore<'a, PIN, CLK>,
    state: BaseState,
    entered: bool,
}

impl<'a, PIN, CLK> DebouncedButton<'a, PIN, CLK>
where
    PIN: InputPin,
    CLK: MillisClock,
{
    /// Builds a new debounced button in state `OffNotVPP`, enabled, off.
    pub fn new(pin: PIN, clock: CLK, config: CoreConfig) -> MpbResult<Self> {
        Ok(Self {
            core: ButtonCore::new(pin, clock, config)?,
            state: BaseState::OffNotVPP,
            entered: true,
        })
    }

    /// Direct access to the shared core, for registering collaborators
    /// (`set_scheduler`, `set_notify_sink`, `set_task_while_on`, …) and
    /// reading common getters.
    pub fn core(&self) -> &ButtonCore<'a, PIN, CLK> {
        &self.core
    }

    /// Mutable access to the shared core.
    pub fn core_mut(&mut self) -> &mut ButtonCore<'a, PIN, CLK> {
        &mut self.core
    }

    /// Current FSA state, mostly useful for tests and diagnostics.
    pub fn state(&self) -> BaseState {
        self.state
    }

    /// Forces the FSA back to `OffNotVPP` and clears all pending flags and
    /// timers, without affecting `is_on`. Used by [`Self::resume`] — resuming
    /// mid-press could otherwise fabricate a spurious valid press.
    pub fn reset_fda(&mut self) {
        self.core.clr_status(false);
        self.state = BaseState::OffNotVPP;
        self.entered = true;
    }

    /// Restarts the periodic callback after a [`Self::pause`], first
    /// resetting the FSA.
    pub fn resume(&mut self) -> MpbResult<()> {
        self.reset_fda();
        self.core.resume()
    }

    /// Stops the periodic callback, retaining configuration and FSA state.
    pub fn pause(&mut self) -> MpbResult<()> {
        self.core.pause()
    }

    /// Starts the periodic callback.
    pub fn begin(&mut self, poll_ms: u32) -> MpbResult<()> {
        self.core.begin(poll_ms)
    }

    /// Stops and frees the periodic callback.
    pub fn end(&mut self) -> MpbResult<()> {
        self.core.end()
    }

    /// Requests a disable; resolved by the FSA on its next tick.
    pub fn disable(&mut self) {
        self.core.request_disable();
    }

    /// Requests an enable; resolved by the FSA on its next tick.
    pub fn enable(&mut self) {
        self.core.request_enable();
    }

    /// Packs the current output flags.
    pub fn output_flags(&self) -> OutputFlags {
        OutputFlags {
            is_on: self.core.is_on(),
            is_enabled: self.core.is_enabled(),
            ..Default::default()
        }
    }

    /// Runs one tick of the per-tick orchestrator: sample the pin under a
    /// critical section, advance the FSA, then — outside the critical
    /// section — pack and post a notification if anything changed.
    pub fn tick(&mut self) -> MpbResult<()> {
        critical_section::with(|_| self.sample_and_step())?;
        if self.core.take_outputs_changed() {
            let word = self.output_flags().encode();
            self.core.notify(word);
            #[cfg(feature = "rtt-logs")]
            rtt_target::rprintln!("mpb-switch: base tick -> state={:?} word={:#010x}", self.state, word);
        }
        Ok(())
    }

    fn sample_and_step(&mut self) -> MpbResult<()> {
        self.core.sample()?;
        self.step();
        Ok(())
    }

    fn step(&mut self) {
        match self.state {
            BaseState::OffNotVPP => {
                if self.entered {
                    self.core.clr_status(true);
                    self.entered = false;
                }
                if self.core.debounce().valid_press_pend() {
                    self.state = BaseState::OffVPP;
                    self.entered = true;
                } else if self.core.valid_disable_pend() {
                    self.state = BaseState::Disabled;
                    self.entered = true;
                }
            }
            BaseState::OffVPP => {
                self.entered = false;
                self.core.turn_on();
                self.core.debounce_mut().clear_valid_press_pend();
                self.state = BaseState::On;
                self.entered = true;
            }
            BaseState::On => {
                self.entered = false;
                if self.core.debounce().valid_release_pend() {
                    self.state = BaseState::OnVRP;
                    self.entered = true;
                } else if self.core.valid_disable_pend() {
                    self.state = BaseState::Disabled;
                    self.entered = true;
                }
            }
            BaseState::OnVRP => {
                self.entered = false;
                self.core.turn_off();
                self.core.debounce_mut().clear_valid_release_pend();
                self.state = BaseState::OffNotVPP;
                self.entered = true;
            }
            BaseState::Disabled => {
                if self.entered {
                    let target = self.core.get_is_on_when_disabled();
                    if self.core.is_on() != target {
                        if self.core.is_on() {
                            self.core.turn_off();
                        } else {
                            self.core.turn_on();
                        }
                    }
                    self.core.clr_status(false);
                    self.core.set_enabled_flag(false);
                    self.core.set_outputs_changed();
                    self.core.clear_valid_disable_pend();
                    self.entered = false;
                }
                if self.core.valid_enable_pend() {
                    if self.core.is_on() {
                        self.core.turn_off();
                    }
                    self.core.set_enabled_flag(true);
                    self.core.clear_valid_enable_pend();
                    self.core.set_outputs_changed();
                }
                if self.core.is_enabled() && !self.core.is_pressed() {
                    self.core.clr_status(true);
                    self.state = BaseState::OffNotVPP;
                    self.entered = true;
                }
            }
        }
    }
}

impl<'a, PIN, CLK> CompanionSwitch for DebouncedButton<'a, PIN, CLK>
where
    PIN: InputPin,
    CLK: MillisClock,
{
    fn is_on(&self) -> bool {
        self.core.is_on()
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::core::CoreConfig;
    use crate::platform::test_support::{FakeClock, SharedPin};

    fn button(
        pin: SharedPin,
        clock: FakeClock,
    ) -> DebouncedButton<'static, SharedPin, FakeClock> {
        DebouncedButton::new(
            pin,
            clock,
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

    /// S1: `dbnc=50, start_delay=0`, a press held across several 10 ms
    /// polls then released. `turn_on` fires once the press has been
    /// observed for >= 50 ms; `turn_off` follows the same shape on release.
    #[test]
    fn s1_base_debounce_turns_on_then_off() {
        let pin = SharedPin::new();
        let clock = FakeClock::new();
        let mut btn = button(pin.clone(), clock.clone());

        for _ in 0..3 {
            btn.tick().unwrap();
            clock.advance(10);
        }
        assert!(!btn.core().is_on());

        pin.set_high(true);
        // 6 ticks of 10ms cross the 50ms debounce threshold and declare the
        // pending press; one further tick is needed for the FSA to consume
        // it from `OffVPP` and actually fire `turn_on`.
        for _ in 0..7 {
            btn.tick().unwrap();
            clock.advance(10);
        }
        assert!(btn.core().is_on());

        pin.set_high(false);
        for _ in 0..4 {
            btn.tick().unwrap();
            clock.advance(10);
        }
        assert!(!btn.core().is_on());
    }

    #[test]
    fn disabled_state_forces_is_on_when_disabled_and_blocks_reenable_while_pressed() {
        let pin = SharedPin::new();
        pin.set_high(true);
        let mut btn = button(pin, FakeClock::new());

        btn.disable();
        btn.tick().unwrap();
        assert!(!btn.core().is_enabled());
        assert!(!btn.core().is_on());

        btn.enable();
        btn.tick().unwrap();
        // Still pressed: must remain disabled for security reasons.
        assert!(!btn.core().is_enabled());
    }

    #[test]
    fn idempotent_repeated_disable_matches_single_call() {
        let pin = SharedPin::new();
        let mut btn = button(pin, FakeClock::new());

        btn.disable();
        btn.disable();
        btn.tick().unwrap();
        assert!(!btn.core().is_enabled());
    }
}
