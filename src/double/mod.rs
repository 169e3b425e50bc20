//! Double-action FSA family (component H): eight states adding a secondary
//! mode entered after a long hold on top of the base machine. Per-variant
//! secondary behavior (`DelayedDouble`, `SliderDouble`) is expressed as
//! implementations of [`DoubleActionPolicy`], grounded on
//! `DblActnLtchMPBttn::updFdaState`.

pub mod delayed;
pub mod slider;

use embedded_hal::digital::InputPin;

use crate::core::{ButtonCore, CoreConfig};
use crate::error::{MpbError, MpbResult};
use crate::latch::timed::MIN_SRVC_TIME_MS;
use crate::platform::MillisClock;
use crate::status::OutputFlags;

/// The eight states of the double-action FSA. Initial state is `OffNotVPP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoubleActionState {
    /// Idle: not pressed, no valid press or secondary-mode pending.
    OffNotVPP,
    /// On, waiting for either a quick release (toggle cycle) or a long
    /// hold promoting to secondary mode. Turns the button on immediately.
    OffVPP,
    /// Entering secondary mode; transitional.
    OnStrtScndMod,
    /// In secondary mode: slider variants advance their value here.
    OnScndMod,
    /// Secondary mode just ended (release while in `OnScndMod`); transitional.
    OnEndScndMod,
    /// On, released, waiting for the next press (which either toggles off
    /// via a second quick press/release, or re-enters secondary mode).
    OnMPBRlsd,
    /// A second quick press/release landed; transitional, turns off.
    OnTurnOff,
    /// Disabled: input ignored until next observed released.
    Disabled,
}

/// Per-variant behavior composed onto the shared eight-state machine: what
/// the secondary mode actually does (flip a flag, or advance a slider
/// value) and how it reacts to a disable while active.
pub trait DoubleActionPolicy {
    /// Called once on entering secondary mode (`stOnStrtScndMod_In`).
    fn on_enter_secondary(&mut self, now_ms: u64);

    /// Called once per tick while in secondary mode, as long as the button
    /// has not yet been released (`stOnScndMod_Do`).
    fn tick_secondary(&mut self, now_ms: u64);

    /// Called once on leaving secondary mode (`stOnEndScndMod_Out`).
    fn on_exit_secondary(&mut self);

    /// Whether secondary mode is currently active.
    fn is_on_secondary(&self) -> bool;

    /// Current slider output value. `0` for variants with no numeric
    /// output (`DelayedDouble`).
    fn otpt_cur_val(&self) -> u16 {
        0
    }

    /// Resets all variant-owned state, called on full-cycle completion
    /// (entry to `OffNotVPP`) and on `clr_status`.
    fn reset(&mut self);

    /// Called on entering `Disabled`, mirroring `stDisabled_In`: forces
    /// secondary mode to match `is_on_when_disabled` if it disagrees.
    fn on_enter_disabled(&mut self, is_on_when_disabled: bool);

    /// Takes (clears) a policy-owned "an output I own changed this tick"
    /// signal, so [`DoubleAction::step`] can mark the core's
    /// outputs-changed flag. Mirrors `SldrDALtchMPBttn::stOnScndMod_Do`
    /// calling `setOutputsChange(true)` on every value change. Default:
    /// never changed (`DelayedDouble` has no extra output beyond the
    /// secondary-mode bit, which `on_enter_secondary`/`on_exit_secondary`
    /// already mark via the wrapper's `fire_on_scndry`/`fire_off_scndry`).
    fn take_outputs_changed(&mut self) -> bool {
        false
    }
}

/// Minimum accepted secondary-mode promotion delay, per spec's
/// `MIN_SRVC_TIME` (the same floor the timed-latch family uses).
pub const MIN_SCND_MOD_DELAY_MS: u32 = MIN_SRVC_TIME_MS;

/// A double-action button: on release from a short press it behaves as a
/// toggle; held past `secondary_mode_delay_ms` it enters a variant-defined
/// secondary mode instead.
pub struct DoubleAction<'a, PIN, CLK, P> {
    core: ButtonCore<'a, PIN, CLK>,
    state: DoubleActionState,
    entered: bool,
    secondary_mode_delay_ms: u32,
    on_turn_on_scndry: Option<fn()>,
    on_turn_off_scndry: Option<fn()>,
    policy: P,
}

impl<'a, PIN, CLK, P> DoubleAction<'a, PIN, CLK, P>
where
    PIN: InputPin,
    CLK: MillisClock,
    P: DoubleActionPolicy,
{
    /// Builds a new double-action button in state `OffNotVPP`, enabled,
    /// off, not in secondary mode. `secondary_mode_delay_ms` is rejected if
    /// below [`MIN_SCND_MOD_DELAY_MS`].
    pub fn new(
        pin: PIN,
        clock: CLK,
        config: CoreConfig,
        secondary_mode_delay_ms: u32,
        policy: P,
    ) -> MpbResult<Self> {
        if secondary_mode_delay_ms < MIN_SCND_MOD_DELAY_MS {
            return Err(MpbError::InvalidParameter);
        }
        Ok(Self {
            core: ButtonCore::new(pin, clock, config)?,
            state: DoubleActionState::OffNotVPP,
            entered: true,
            secondary_mode_delay_ms,
            on_turn_on_scndry: None,
            on_turn_off_scndry: None,
            policy,
        })
    }

    /// Direct access to the shared core.
    pub fn core(&self) -> &ButtonCore<'a, PIN, CLK> {
        &self.core
    }

    /// Mutable access to the shared core.
    pub fn core_mut(&mut self) -> &mut ButtonCore<'a, PIN, CLK> {
        &mut self.core
    }

    /// Direct access to the variant policy, e.g. for slider setters.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Mutable access to the variant policy.
    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    /// Current FSA state.
    pub fn state(&self) -> DoubleActionState {
        self.state
    }

    /// Current secondary-mode promotion delay.
    pub fn scnd_mod_actv_dly(&self) -> u32 {
        self.secondary_mode_delay_ms
    }

    /// Updates the secondary-mode promotion delay. Rejected if below
    /// [`MIN_SCND_MOD_DELAY_MS`].
    pub fn set_scnd_mod_actv_dly(&mut self, delay_ms: u32) -> bool {
        if delay_ms < MIN_SCND_MOD_DELAY_MS {
            return false;
        }
        self.secondary_mode_delay_ms = delay_ms;
        true
    }

    /// Registers the user callback fired on entering secondary mode.
    pub fn set_fn_on_turn_on_scndry(&mut self, f: fn()) {
        self.on_turn_on_scndry = Some(f);
    }

    /// Registers the user callback fired on leaving secondary mode.
    pub fn set_fn_on_turn_off_scndry(&mut self, f: fn()) {
        self.on_turn_off_scndry = Some(f);
    }

    /// Resets the FSA to `OffNotVPP`, clearing all pending flags, timers
    /// and the variant policy's own state, without affecting `is_on`.
    pub fn reset_fda(&mut self) {
        self.core.clr_status(false);
        self.policy.reset();
        self.state = DoubleActionState::OffNotVPP;
        self.entered = true;
    }

    /// Restarts the periodic callback after a [`Self::pause`].
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

    /// Packs the current output flags, including the secondary-mode bit
    /// and slider value the policy owns.
    pub fn output_flags(&self) -> OutputFlags {
        OutputFlags {
            is_on: self.core.is_on(),
            is_enabled: self.core.is_enabled(),
            is_on_scndry: self.policy.is_on_secondary(),
            otpt_cur_val: self.policy.otpt_cur_val(),
            ..Default::default()
        }
    }

    fn fire_on_scndry(&mut self) {
        self.policy.on_enter_secondary(self.core.now_ms());
        if let Some(f) = self.on_turn_on_scndry {
            f();
        }
        self.core.set_outputs_changed();
    }

    fn fire_off_scndry(&mut self) {
        self.policy.on_exit_secondary();
        if let Some(f) = self.on_turn_off_scndry {
            f();
        }
        self.core.set_outputs_changed();
    }

    /// Runs one tick of the per-tick orchestrator.
    pub fn tick(&mut self) -> MpbResult<()> {
        critical_section::with(|_| self.sample_and_step())?;
        if self.core.take_outputs_changed() {
            let word = self.output_flags().encode();
            self.core.notify(word);
            #[cfg(feature = "rtt-logs")]
            rtt_target::rprintln!("mpb-switch: double tick -> state={:?} word={:#010x}", self.state, word);
        }
        Ok(())
    }

    fn sample_and_step(&mut self) -> MpbResult<()> {
        self.core.sample_with_secondary(self.secondary_mode_delay_ms)?;
        self.step();
        Ok(())
    }

    fn step(&mut self) {
        let now_ms = self.core.now_ms();
        match self.state {
            DoubleActionState::OffNotVPP => {
                if self.entered {
                    self.core.clr_status(true);
                    self.policy.reset();
                    self.entered = false;
                }
                if self.core.debounce().valid_press_pend() || self.core.debounce().valid_secondary_mode_pend() {
                    self.state = DoubleActionState::OffVPP;
                    self.entered = true;
                } else if self.core.valid_disable_pend() {
                    self.state = DoubleActionState::Disabled;
                    self.entered = true;
                }
            }
            DoubleActionState::OffVPP => {
                self.entered = false;
                if !self.core.is_on() {
                    self.core.turn_on();
                }
                if self.core.debounce().valid_secondary_mode_pend() {
                    self.state = DoubleActionState::OnStrtScndMod;
                    self.entered = true;
                } else if self.core.debounce().valid_press_pend() && self.core.debounce().valid_release_pend() {
                    self.core.debounce_mut().clear_valid_press_pend();
                    self.core.debounce_mut().clear_valid_release_pend();
                    self.state = DoubleActionState::OnMPBRlsd;
                    self.entered = true;
                }
            }
            DoubleActionState::OnStrtScndMod => {
                self.entered = false;
                self.fire_on_scndry();
                self.state = DoubleActionState::OnScndMod;
                self.entered = true;
            }
            DoubleActionState::OnScndMod => {
                self.entered = false;
                if !self.core.debounce().valid_release_pend() {
                    self.policy.tick_secondary(now_ms);
                } else {
                    self.state = DoubleActionState::OnEndScndMod;
                    self.entered = true;
                }
                if self.core.valid_disable_pend() {
                    self.state = DoubleActionState::Disabled;
                    self.entered = true;
                }
            }
            DoubleActionState::OnEndScndMod => {
                self.entered = false;
                self.core.debounce_mut().clear_valid_secondary_mode_pend();
                self.state = DoubleActionState::OnMPBRlsd;
                self.entered = true;
                self.fire_off_scndry();
            }
            DoubleActionState::OnMPBRlsd => {
                self.entered = false;
                if self.core.debounce().valid_secondary_mode_pend() {
                    self.state = DoubleActionState::OnStrtScndMod;
                    self.entered = true;
                } else if self.core.debounce().valid_press_pend() && self.core.debounce().valid_release_pend() {
                    self.core.debounce_mut().clear_valid_press_pend();
                    self.core.debounce_mut().clear_valid_release_pend();
                    self.state = DoubleActionState::OnTurnOff;
                    self.entered = true;
                }
                if self.core.valid_disable_pend() {
                    self.state = DoubleActionState::Disabled;
                    self.entered = true;
                }
            }
            DoubleActionState::OnTurnOff => {
                self.entered = false;
                self.core.turn_off();
                self.state = DoubleActionState::OffNotVPP;
                self.entered = true;
            }
            DoubleActionState::Disabled => {
                if self.entered {
                    let target = self.core.get_is_on_when_disabled();
                    if self.core.is_on() != target {
                        if self.core.is_on() {
                            self.core.turn_off();
                        } else {
                            self.core.turn_on();
                        }
                    }
                    self.policy.on_enter_disabled(target);
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
                    self.state = DoubleActionState::OffNotVPP;
                    self.entered = true;
                }
            }
        }
        if self.policy.take_outputs_changed() {
            self.core.set_outputs_changed();
        }
    }
}
