//! External-unlatch variant: a companion switch's rising/falling edge drives
//! the unlatch and unlatch-release conditions instead of a timer or a second
//! press of the same button.
//!
//! Grounded on `XtrnUnltchMPBttn::updValidUnlatchStatus`: `_xtrnUnltchPRlsCcl`
//! tracks whether the companion's rising edge has already been consumed, so
//! a companion that stays on doesn't re-fire `valid_unlatch_pend` every tick.

use crate::latch::LatchPolicy;
use crate::platform::CompanionSwitch;

/// Policy implementing unlatch-by-companion-switch.
///
/// With no companion registered, the button can only be unlatched
/// programmatically via [`crate::latch::Latched::unlatch`], matching the
/// original's "feature disabled" treatment of a null companion pointer.
pub struct ExternalUnlatch<'a> {
    companion: Option<&'a dyn CompanionSwitch>,
    trn_off_asap: bool,
    /// Mirrors `_xtrnUnltchPRlsCcl`: true from the companion's rising edge
    /// until its matching falling edge.
    companion_cycle: bool,
    unlatch_pend: bool,
    unlatch_release_pend: bool,
}

impl<'a> ExternalUnlatch<'a> {
    /// Builds a policy with no companion registered yet.
    pub fn new(trn_off_asap: bool) -> Self {
        Self {
            companion: None,
            trn_off_asap,
            companion_cycle: false,
            unlatch_pend: false,
            unlatch_release_pend: false,
        }
    }

    /// Builds a policy with a companion already registered.
    pub fn with_companion(companion: &'a dyn CompanionSwitch, trn_off_asap: bool) -> Self {
        let mut policy = Self::new(trn_off_asap);
        policy.companion = Some(companion);
        policy
    }

    /// Registers (or replaces) the companion switch observed for unlatch.
    pub fn set_companion(&mut self, companion: &'a dyn CompanionSwitch) {
        self.companion = Some(companion);
    }

    /// Removes the companion: the button can now only be unlatched
    /// programmatically.
    pub fn clear_companion(&mut self) {
        self.companion = None;
        self.companion_cycle = false;
    }

    /// Whether a companion is currently registered.
    pub fn has_companion(&self) -> bool {
        self.companion.is_some()
    }

    /// Updates `trn_off_asap`.
    pub fn set_trn_off_asap(&mut self, trn_off_asap: bool) {
        self.trn_off_asap = trn_off_asap;
    }
}

impl<'a> LatchPolicy for ExternalUnlatch<'a> {
    fn on_enter_on_nvrp(&mut self, _now_ms: u64) {}

    fn tick_latched(&mut self, _now_ms: u64, _valid_press_pend: bool, _valid_release_pend: bool) {
        let Some(companion) = self.companion else {
            self.companion_cycle = false;
            return;
        };
        let companion_on = companion.is_on();
        if companion_on && !self.companion_cycle {
            self.unlatch_pend = true;
            self.companion_cycle = true;
        }
        if !companion_on && self.companion_cycle {
            self.unlatch_release_pend = true;
            self.companion_cycle = false;
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
        self.companion_cycle = false;
        self.unlatch_pend = false;
        self.unlatch_release_pend = false;
    }

    fn checks_disable_in_off_nvurp(&self) -> bool {
        true
    }

    fn on_disabled_while_off_nvurp(&mut self) {
        self.unlatch_release_pend = false;
        self.companion_cycle = false;
    }
}
