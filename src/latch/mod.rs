//! Latch FSA family (component G): ten states adding a latched/unlatch
//! cycle on top of the base machine. Per-variant unlatch sources (timed,
//! toggle, hinted-timed, external) are expressed as implementations of
//! [`LatchPolicy`] rather than as a subclass each, per the tagged-variant
//! re-architecture.

pub mod external;
pub mod hinted;
pub mod timed;
pub mod toggle;

use embedded_hal::digital::InputPin;

use crate::core::{ButtonCore, CoreConfig};
use crate::error::MpbResult;
use crate::platform::MillisClock;
use crate::status::OutputFlags;

/// The ten states of the latch FSA. Initial state is `OffNotVPP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchState {
    /// Idle: not pressed, no valid press pending.
    OffNotVPP,
    /// A valid press just landed; transitional, turns the button on.
    OffVPP,
    /// On, not yet latched, waiting for a valid release.
    OnNVRP,
    /// A valid release just landed; transitional, about to latch.
    OnVRP,
    /// Latched and on, waiting for the variant's unlatch condition.
    LtchNVUP,
    /// Unlatch condition met; transitional, may turn off immediately.
    LtchdVUP,
    /// Off (if `trn_off_asap`) or still on, waiting to clear unlatch pend.
    OffVUP,
    /// Waiting for the unlatch-release condition.
    OffNVURP,
    /// Unlatch-release condition met; transitional, finishes the cycle.
    OffVURP,
    /// Disabled: input ignored until next observed released.
    Disabled,
}

/// Per-variant behavior a [`Latched`] button composes on top of the shared
/// ten-state machine: what starts/stops the per-variant timer, and what
/// declares the unlatch and unlatch-release conditions.
pub trait LatchPolicy {
    /// Called when entering `OnNVRP`, right after `turn_on` fires. Starts
    /// any per-variant timer (e.g. the timed/hinted-timed service timer).
    fn on_enter_on_nvrp(&mut self, now_ms: u64);

    /// Called once per tick while latched (`LtchNVUP`), before checking for
    /// `valid_unlatch_pend`. `valid_press_pend`/`valid_release_pend` are the
    /// *consumed* base debounce edges the policy may repurpose (toggle) or
    /// ignore (timed, external).
    fn tick_latched(&mut self, now_ms: u64, valid_press_pend: bool, valid_release_pend: bool);

    /// Whether the unlatch condition now holds. Consumed exactly once by
    /// the FSA; policies that also set `valid_unlatch_release_pend` inside
    /// [`Self::tick_latched`] should report it via
    /// [`Self::valid_unlatch_release_pend`] independently.
    fn valid_unlatch_pend(&self) -> bool;

    /// Whether the unlatch-release condition now holds.
    fn valid_unlatch_release_pend(&self) -> bool;

    /// Whether the button should physically turn off as soon as the
    /// unlatch condition is reached (`LtchdVUP`), versus staying on until
    /// the unlatch-release condition too.
    fn trn_off_asap(&self) -> bool;

    /// Resets all variant-owned pending flags and timers, called on full
    /// latch-cycle completion (entry to `OffNotVPP`) and on `clr_status`.
    fn reset(&mut self);

    /// Pilot output bit, hinted-timed only.
    fn pilot_on(&self) -> bool {
        false
    }

    /// Warning output bit, hinted-timed only.
    fn warning_on(&self) -> bool {
        false
    }

    /// Whether this variant also honors a disable request while waiting in
    /// `OffNVURP` for the unlatch-release condition. Only the toggle and
    /// external-unlatch variants do (a fresh press/companion-edge can
    /// arrive mid-wait there); timed and hinted-timed do not.
    fn checks_disable_in_off_nvurp(&self) -> bool {
        false
    }

    /// Called when [`Self::checks_disable_in_off_nvurp`] is true and a
    /// disable is honored from `OffNVURP`, so the policy can drop its own
    /// in-flight unlatch-release bookkeeping.
    fn on_disabled_while_off_nvurp(&mut self) {}

    /// Called once per tick while enabled, independent of the current FSA
    /// state — mirrors `updWrnngOn`/`updPilotOn` running unconditionally
    /// from the hinted-timed poll callback before `updFdaState`. Only the
    /// hinted-timed policy overrides this; plain latch variants no-op.
    fn tick_while_enabled(&mut self, _now_ms: u64, _is_on: bool) {}

    /// Takes (clears) a policy-owned "an output bit I own changed this
    /// tick" signal, so [`Latched::step`] can mark the core's
    /// outputs-changed flag regardless of which hook (`tick_while_enabled`,
    /// `on_enter_on_nvrp`, `on_enter_off_not_vpp`, `on_enter_disabled`, …)
    /// caused the flip. Mirrors `_turnOnWrnng`/`_turnOffWrnng`/
    /// `_turnOnPilot`/`_turnOffPilot` each setting `_outputsChange = true`
    /// in the original, regardless of their call site. Default: never
    /// changed (plain latch variants own no extra output bits).
    fn take_outputs_changed(&mut self) -> bool {
        false
    }

    /// Called on entry to `OffNotVPP`, mirroring `stOffNotVPP_In` — only the
    /// hinted-timed policy's pilot bookkeeping needs this.
    fn on_enter_off_not_vpp(&mut self) {}

    /// Called on entry to `Disabled`, mirroring `stDisabled_In` — only the
    /// hinted-timed policy's pilot/warning bookkeeping needs this.
    fn on_enter_disabled(&mut self) {}
}

/// A latching button: stays on after release until its policy's unlatch
/// condition fires.
pub struct Latched<'a, PIN, CLK, P> {
    core: ButtonCore<'a, PIN, CLK>,
    state: LatchState,
    entered: bool,
    is_latched: bool,
    policy: P,
}

impl<'a, PIN, CLK, P> Latched<'a, PIN, CLK, P>
where
    PIN: InputPin,
    CLK: MillisClock,
    P: LatchPolicy,
{
    /// Builds a new latching button in state `OffNotVPP`, enabled, off,
    /// unlatched.
    pub fn new(pin: PIN, clock: CLK, config: CoreConfig, policy: P) -> MpbResult<Self> {
        Ok(Self {
            core: ButtonCore::new(pin, clock, config)?,
            state: LatchState::OffNotVPP,
            entered: true,
            is_latched: false,
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

    /// Direct access to the variant policy, e.g. for variant-specific
    /// setters (`set_service_time`, `set_warning_percent`, …).
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Mutable access to the variant policy.
    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    /// Current FSA state.
    pub fn state(&self) -> LatchState {
        self.state
    }

    /// Whether the button is currently latched.
    pub fn is_latched(&self) -> bool {
        self.is_latched
    }

    /// Programmatically unlatches the button, as if the variant's unlatch
    /// condition had just fired. Valid in any state; a no-op if not
    /// latched.
    pub fn unlatch(&mut self) {
        if self.is_latched && self.state == LatchState::LtchNVUP {
            self.state = LatchState::LtchdVUP;
            self.entered = true;
        }
    }

    /// Resets the FSA to `OffNotVPP`, clearing all pending flags, timers
    /// and the variant policy's own state, without affecting `is_on`.
    pub fn reset_fda(&mut self) {
        self.core.clr_status(false);
        self.policy.reset();
        self.state = LatchState::OffNotVPP;
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

    /// Packs the current output flags, including the pilot/warning bits
    /// the policy may own.
    pub fn output_flags(&self) -> OutputFlags {
        OutputFlags {
            is_on: self.core.is_on(),
            is_enabled: self.core.is_enabled(),
            pilot_on: self.policy.pilot_on(),
            wrnng_on: self.policy.warning_on(),
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
            rtt_target::rprintln!("mpb-switch: latch tick -> state={:?} word={:#010x}", self.state, word);
        }
        Ok(())
    }

    fn sample_and_step(&mut self) -> MpbResult<()> {
        self.core.sample()?;
        self.step();
        Ok(())
    }

    fn step(&mut self) {
        let now_ms = self.core.now_ms();
        if self.core.is_enabled() {
            self.policy.tick_while_enabled(now_ms, self.core.is_on());
        }
        // Mirrors `updValidUnlatchStatus`: runs every tick while latched,
        // independent of the current FSA state, so a toggle/external policy
        // still observes the unlatch-release edge after the machine has
        // already moved on from `LtchNVUP` into the `OffVUP`/`OffNVURP` tail.
        if self.is_latched {
            let press_pend = self.core.debounce().valid_press_pend();
            let release_pend = self.core.debounce().valid_release_pend();
            if press_pend {
                self.core.debounce_mut().clear_valid_press_pend();
            }
            if release_pend {
                self.core.debounce_mut().clear_valid_release_pend();
            }
            self.policy.tick_latched(now_ms, press_pend, release_pend);
        }
        match self.state {
            LatchState::OffNotVPP => {
                if self.entered {
                    self.core.clr_status(true);
                    self.policy.reset();
                    self.policy.on_enter_off_not_vpp();
                    self.entered = false;
                }
                if self.core.debounce().valid_press_pend() {
                    self.state = LatchState::OffVPP;
                    self.entered = true;
                } else if self.core.valid_disable_pend() {
                    self.state = LatchState::Disabled;
                    self.entered = true;
                }
            }
            LatchState::OffVPP => {
                self.entered = false;
                self.core.turn_on();
                self.core.debounce_mut().clear_valid_press_pend();
                self.state = LatchState::OnNVRP;
                self.entered = true;
            }
            LatchState::OnNVRP => {
                if self.entered {
                    self.policy.on_enter_on_nvrp(now_ms);
                    self.entered = false;
                }
                if self.core.debounce().valid_release_pend() {
                    self.state = LatchState::OnVRP;
                    self.entered = true;
                } else if self.core.valid_disable_pend() {
                    self.state = LatchState::Disabled;
                    self.entered = true;
                }
            }
            LatchState::OnVRP => {
                self.entered = false;
                self.core.debounce_mut().clear_valid_release_pend();
                self.is_latched = true;
                self.state = LatchState::LtchNVUP;
                self.entered = true;
            }
            LatchState::LtchNVUP => {
                self.entered = false;
                if self.policy.valid_unlatch_pend() {
                    self.state = LatchState::LtchdVUP;
                    self.entered = true;
                } else if self.core.valid_disable_pend() {
                    self.state = LatchState::Disabled;
                    self.entered = true;
                }
            }
            LatchState::LtchdVUP => {
                self.entered = false;
                if self.policy.trn_off_asap() {
                    self.core.turn_off();
                }
                self.state = LatchState::OffVUP;
                self.entered = true;
            }
            LatchState::OffVUP => {
                self.entered = false;
                self.state = LatchState::OffNVURP;
                self.entered = true;
            }
            LatchState::OffNVURP => {
                self.entered = false;
                if self.policy.checks_disable_in_off_nvurp() && self.core.valid_disable_pend() {
                    self.policy.on_disabled_while_off_nvurp();
                    self.state = LatchState::Disabled;
                    self.entered = true;
                } else if self.policy.valid_unlatch_release_pend() {
                    self.state = LatchState::OffVURP;
                    self.entered = true;
                }
            }
            LatchState::OffVURP => {
                self.entered = false;
                if self.core.is_on() {
                    self.core.turn_off();
                }
                self.is_latched = false;
                self.core.debounce_mut().clear_valid_press_pend();
                self.core.debounce_mut().clear_valid_release_pend();
                self.state = LatchState::OffNotVPP;
                self.entered = true;
            }
            LatchState::Disabled => {
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
                    self.policy.reset();
                    self.policy.on_enter_disabled();
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
                    self.is_latched = false;
                    self.state = LatchState::OffNotVPP;
                    self.entered = true;
                }
            }
        }
        if self.policy.take_outputs_changed() {
            self.core.set_outputs_changed();
        }
    }
}
