//! Voidable FSA family (component I): twelve states layering an
//! auto-clearing "voided" condition on top of the base on/off machine.
//! Per-variant void detection (`TimedVoidable`, `SingleServiceVoidable`) is
//! expressed as an implementation of [`VoidPolicy`], grounded on
//! `VdblMPBttn::updFdaState` plus its two concrete subclasses'
//! `updVoidStatus`/`stOffVPP_Do`/`stOffNotVPP_In` overrides.
//!
//! `stOffVddNVUP_Do` is identical in both `TmVdblMPBttn` and
//! `SnglSrvcVdblMPBttn`, so it is implemented once here on the wrapper
//! rather than duplicated behind the trait.

pub mod single_service;
pub mod timed;

use embedded_hal::digital::InputPin;

use crate::core::{ButtonCore, CoreConfig};
use crate::error::MpbResult;
use crate::platform::{MillisClock, TaskControl};
use crate::status::OutputFlags;

/// The twelve states of the voidable FSA. Initial state is `OffNotVPP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoidableState {
    /// Idle: not pressed, not voided, no valid press pending.
    OffNotVPP,
    /// A valid press just landed; transitional, turns the button on and
    /// starts the variant's void-tracking.
    OffVPP,
    /// On, not voided, waiting for a release or a void condition.
    OnNVRP,
    /// A void condition just landed; transitional, raises the voided flag.
    OnVVP,
    /// On and voided, about to turn off; transitional.
    OnVddNVUP,
    /// Off and voided, waiting for the unvoid condition.
    OffVddNVUP,
    /// The unvoid condition just landed; transitional, clears voided.
    OffVddVUP,
    /// Off, just unvoided; transitional.
    OffUnVdd,
    /// A valid release landed while on and not voided; transitional.
    OnVRP,
    /// About to turn off after a plain release; transitional.
    OnTurnOff,
    /// Off, full cycle complete; transitional, loops back to idle.
    Off,
    /// Disabled: input ignored until next observed released.
    Disabled,
}

/// Per-variant void detection, composed onto the shared twelve-state
/// machine: what starts the void timer on entering `OnNVRP` and what
/// declares the void condition itself.
pub trait VoidPolicy {
    /// Called once on (re-)entering `OffNotVPP` (`stOffNotVPP_In`). Clears
    /// any variant-owned tracking state, e.g. a running void timer.
    fn on_enter_off_not_vpp(&mut self);

    /// Called once on entering `OnNVRP`, i.e. right after the button turns
    /// on (`stOffVPP_Do`). Starting point for the voiding mechanism.
    fn start_void_tracking(&mut self, now_ms: u64);

    /// Evaluated every tick while enabled, independent of FSA state
    /// (`updVoidStatus`). Returns whether the void condition currently
    /// holds.
    fn tick_void_status(&mut self, now_ms: u64, is_on: bool) -> bool;
}

/// Marker for policies whose secondary while-on task makes sense to run.
/// Implemented by [`timed::TimedVoidable`]; deliberately not implemented by
/// [`single_service::SingleServiceVoidable`], whose `is_on` window is too
/// short-lived for a collaborator task to observe reliably — the original's
/// `SnglSrvcVdblMPBttn::setTaskWhileOn` is an intentional no-op override of
/// exactly this, expressed here as a missing capability instead.
pub trait SupportsTaskWhileOn {}

/// A voidable button: behaves as a plain on/off switch until a
/// variant-defined void condition fires, forcing it through an automatic
/// off/unvoid cycle.
pub struct Voidable<'a, PIN, CLK, P> {
    core: ButtonCore<'a, PIN, CLK>,
    state: VoidableState,
    entered: bool,
    is_voided: bool,
    valid_void_pend: bool,
    valid_unvoid_pend: bool,
    on_turn_on_vdd: Option<fn()>,
    on_turn_off_vdd: Option<fn()>,
    policy: P,
}

impl<'a, PIN, CLK, P> Voidable<'a, PIN, CLK, P>
where
    PIN: InputPin,
    CLK: MillisClock,
    P: VoidPolicy,
{
    /// Builds a new voidable button in state `OffNotVPP`, enabled, off, not
    /// voided.
    pub fn new(pin: PIN, clock: CLK, config: CoreConfig, policy: P) -> MpbResult<Self> {
        Ok(Self {
            core: ButtonCore::new(pin, clock, config)?,
            state: VoidableState::OffNotVPP,
            entered: true,
            is_voided: false,
            valid_void_pend: false,
            valid_unvoid_pend: false,
            on_turn_on_vdd: None,
            on_turn_off_vdd: None,
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

    /// Direct access to the variant policy, e.g. for `TimedVoidable`'s
    /// `set_void_time`.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Mutable access to the variant policy.
    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    /// Current FSA state.
    pub fn state(&self) -> VoidableState {
        self.state
    }

    /// Whether the button currently sits in the voided condition.
    pub fn is_voided(&self) -> bool {
        self.is_voided
    }

    /// Registers the user callback fired on entering the voided condition.
    pub fn set_fn_on_turn_on_vdd(&mut self, f: fn()) {
        self.on_turn_on_vdd = Some(f);
    }

    /// Registers the user callback fired on leaving the voided condition.
    pub fn set_fn_on_turn_off_vdd(&mut self, f: fn()) {
        self.on_turn_off_vdd = Some(f);
    }

    fn turn_on_vdd(&mut self) {
        if !self.is_voided {
            if let Some(f) = self.on_turn_on_vdd {
                f();
            }
            self.is_voided = true;
            self.core.set_outputs_changed();
        }
    }

    fn turn_off_vdd(&mut self) {
        if self.is_voided {
            if let Some(f) = self.on_turn_off_vdd {
                f();
            }
            self.is_voided = false;
            self.core.set_outputs_changed();
        }
    }

    /// Directly raises the voided condition, bypassing the FSA entirely —
    /// mirrors `setIsVoided`/`setVoided(true)`, which act straight on the
    /// voided flag regardless of where the FSA currently sits.
    pub fn set_is_voided(&mut self) {
        self.turn_on_vdd();
    }

    /// Directly clears the voided condition, bypassing the FSA. Mirrors
    /// `setIsNotVoided`/`setVoided(false)`.
    pub fn set_is_not_voided(&mut self) {
        self.turn_off_vdd();
    }

    /// Directly sets the voided condition to `value`, bypassing the FSA.
    /// Mirrors `setVoided`.
    pub fn set_voided(&mut self, value: bool) {
        if value {
            self.turn_on_vdd();
        } else {
            self.turn_off_vdd();
        }
    }

    /// Resets pending flags, timers and the variant policy's own tracking.
    /// Unvoids if currently voided. When `clear_is_on` is true, also turns
    /// the button off. Mirrors `VdblMPBttn::clrStatus`.
    pub fn clr_status(&mut self, clear_is_on: bool) {
        self.turn_off_vdd();
        self.policy.on_enter_off_not_vpp();
        self.core.clr_status(clear_is_on);
    }

    /// Forces the FSA back to `OffNotVPP`, clearing pending flags, timers
    /// and any void condition, without affecting `is_on`.
    pub fn reset_fda(&mut self) {
        self.clr_status(false);
        self.state = VoidableState::OffNotVPP;
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

    /// Packs the current output flags, including the voided bit.
    pub fn output_flags(&self) -> OutputFlags {
        OutputFlags {
            is_on: self.core.is_on(),
            is_enabled: self.core.is_enabled(),
            is_voided: self.is_voided,
            ..Default::default()
        }
    }

    /// Runs one tick of the per-tick orchestrator.
    pub fn tick(&mut self) -> MpbResult<()> {
        critical_section::with(|_| self.sample_and_step())?;
        if self.core.take_outputs_changed() {
            let word = self.output_flags().encode();
            self.core.notify(word);
            #[cfg(feature = "rtt-logs")]
            rtt_target::rprintln!("mpb-switch: voidable tick -> state={:?} word={:#010x}", self.state, word);
        }
        Ok(())
    }

    fn sample_and_step(&mut self) -> MpbResult<()> {
        self.core.sample()?;
        if self.core.is_enabled() {
            let now_ms = self.core.now_ms();
            self.valid_void_pend = self.policy.tick_void_status(now_ms, self.core.is_on());
        }
        self.step();
        Ok(())
    }

    /// Common to both `TmVdblMPBttn` and `SnglSrvcVdblMPBttn`: a release
    /// observed while off-and-voided promotes straight to a pending unvoid.
    fn off_vdd_nvup_do(&mut self) {
        if self.core.debounce().valid_release_pend() {
            self.core.debounce_mut().clear_valid_release_pend();
            self.valid_unvoid_pend = true;
        }
    }

    fn step(&mut self) {
        let now_ms = self.core.now_ms();
        match self.state {
            VoidableState::OffNotVPP => {
                if self.entered {
                    self.turn_off_vdd();
                    self.policy.on_enter_off_not_vpp();
                    self.entered = false;
                }
                if self.core.debounce().valid_press_pend() {
                    self.state = VoidableState::OffVPP;
                    self.entered = true;
                }
                if self.core.valid_disable_pend() {
                    self.state = VoidableState::Disabled;
                    self.entered = true;
                }
            }
            VoidableState::OffVPP => {
                self.entered = false;
                if !self.core.is_on() {
                    self.core.turn_on();
                }
                self.core.debounce_mut().clear_valid_press_pend();
                self.policy.start_void_tracking(now_ms);
                self.state = VoidableState::OnNVRP;
                self.entered = true;
            }
            VoidableState::OnNVRP => {
                self.entered = false;
                // Sequential, not mutually exclusive, matching the
                // original: if a void and a release land the same tick,
                // the disable check (below) has the final say, then void,
                // then release, in source order.
                if self.valid_void_pend {
                    self.state = VoidableState::OnVVP;
                    self.entered = true;
                }
                if self.core.debounce().valid_release_pend() {
                    self.state = VoidableState::OnVRP;
                    self.entered = true;
                }
                if self.core.valid_disable_pend() {
                    self.state = VoidableState::Disabled;
                    self.entered = true;
                }
            }
            VoidableState::OnVVP => {
                if self.entered {
                    self.turn_on_vdd();
                    self.valid_void_pend = false;
                    self.entered = false;
                }
                self.state = VoidableState::OnVddNVUP;
                self.entered = true;
            }
            VoidableState::OnVddNVUP => {
                self.entered = false;
                self.core.turn_off();
                self.state = VoidableState::OffVddNVUP;
                self.entered = true;
            }
            VoidableState::OffVddNVUP => {
                self.entered = false;
                self.off_vdd_nvup_do();
                if self.valid_unvoid_pend {
                    self.state = VoidableState::OffVddVUP;
                    self.entered = true;
                }
                if self.core.valid_disable_pend() {
                    self.state = VoidableState::Disabled;
                    self.entered = true;
                }
            }
            VoidableState::OffVddVUP => {
                self.entered = false;
                self.turn_off_vdd();
                self.valid_unvoid_pend = false;
                self.state = VoidableState::OffUnVdd;
                self.entered = true;
            }
            VoidableState::OffUnVdd => {
                self.entered = false;
                self.state = VoidableState::Off;
                self.entered = true;
            }
            VoidableState::OnVRP => {
                self.entered = false;
                self.core.debounce_mut().clear_valid_release_pend();
                self.state = VoidableState::OnTurnOff;
                self.entered = true;
            }
            VoidableState::OnTurnOff => {
                self.entered = false;
                self.core.turn_off();
                self.state = VoidableState::Off;
                self.entered = true;
            }
            VoidableState::Off => {
                self.entered = false;
                self.state = VoidableState::OffNotVPP;
                self.entered = true;
            }
            VoidableState::Disabled => {
                if self.entered {
                    let target = self.core.get_is_on_when_disabled();
                    if self.core.is_on() != target {
                        if self.core.is_on() {
                            self.core.turn_off();
                        } else {
                            self.core.turn_on();
                        }
                    }
                    self.clr_status(false);
                    self.core.set_enabled_flag(false);
                    self.core.set_outputs_changed();
                    self.core.clear_valid_disable_pend();
                    self.entered = false;
                }
                if self.core.valid_enable_pend() {
                    self.core.turn_off();
                    self.core.set_enabled_flag(true);
                    self.core.clear_valid_enable_pend();
                    self.core.set_outputs_changed();
                }
                if self.core.is_enabled() && !self.core.is_pressed() {
                    // Mirrors `stDisabled_Out`: forces the button fully off
                    // on the way out, even if it was just forced back on to
                    // match `is_on_when_disabled` above.
                    self.clr_status(true);
                    self.state = VoidableState::OffNotVPP;
                    self.entered = true;
                }
            }
        }
    }
}

impl<'a, PIN, CLK, P> Voidable<'a, PIN, CLK, P>
where
    PIN: InputPin,
    CLK: MillisClock,
    P: VoidPolicy + SupportsTaskWhileOn,
{
    /// Registers the while-on helper task. Only available for policies that
    /// implement [`SupportsTaskWhileOn`].
    pub fn set_task_while_on(&mut self, task: &'a mut dyn TaskControl) {
        self.core.set_task_while_on(task);
    }
}
