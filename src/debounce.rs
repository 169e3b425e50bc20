//! Debounce & validation layer (component E).
//!
//! Turns a stream of raw pressed/released samples into the
//! `valid_press_pend` / `valid_release_pend` / `valid_secondary_mode_pend`
//! edges every FSA family consumes. Grounded on
//! `DbncdMPBttn::updValidPressesStatus` in the original implementation,
//! with the C++ `_dbncTimerStrt == 0` "not yet started" sentinel replaced
//! by `Option<u64>` — an idiomatic swap, not a behavior change, since the
//! original never observes a real zero timestamp at runtime (time starts
//! running before any button is constructed).

/// Hardware debounce floor. No variant may set `dbnc_time_ms` below this.
pub const HW_MIN_DBNC_MS: u32 = 20;

/// Configuration consumed by [`DebounceState::sample`].
#[derive(Debug, Clone, Copy)]
pub struct DebounceConfig {
    /// Press-side debounce interval, `>= HW_MIN_DBNC_MS`.
    pub dbnc_time_ms: u32,
    /// Release-side debounce interval. Fixed at `HW_MIN_DBNC_MS` by spec:
    /// releases are intentionally made more responsive than presses.
    pub rls_dbnc_time_ms: u32,
    /// Extra delay added to `dbnc_time_ms` before a press is declared valid.
    pub start_delay_ms: u32,
    /// For double-action variants, the additional delay past the press
    /// threshold after which a still-held press promotes to
    /// `valid_secondary_mode_pend` instead of `valid_press_pend`. `None`
    /// for variants with no secondary mode.
    pub secondary_mode_delay_ms: Option<u32>,
}

impl DebounceConfig {
    /// Builds a config with the release debounce fixed at
    /// [`HW_MIN_DBNC_MS`] and no secondary-mode promotion.
    pub fn new(dbnc_time_ms: u32, start_delay_ms: u32) -> Self {
        Self {
            dbnc_time_ms,
            rls_dbnc_time_ms: HW_MIN_DBNC_MS,
            start_delay_ms,
            secondary_mode_delay_ms: None,
        }
    }

    /// Returns this config with a secondary-mode promotion delay attached,
    /// for double-action variants.
    pub fn with_secondary_mode_delay(mut self, secondary_mode_delay_ms: u32) -> Self {
        self.secondary_mode_delay_ms = Some(secondary_mode_delay_ms);
        self
    }

    fn press_threshold_ms(&self) -> u32 {
        self.dbnc_time_ms + self.start_delay_ms
    }

    fn secondary_threshold_ms(&self) -> Option<u32> {
        self.secondary_mode_delay_ms
            .map(|delay| self.press_threshold_ms() + delay)
    }
}

/// Running debounce timers and pending-event flags for one button instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebounceState {
    press_timer_start: Option<u64>,
    release_timer_start: Option<u64>,
    /// `true` between a declared valid press and its matching valid release.
    press_release_cycle: bool,
    valid_press_pend: bool,
    valid_release_pend: bool,
    valid_secondary_mode_pend: bool,
}

impl DebounceState {
    /// A fresh debounce state with all timers and pending flags clear.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all timers and pending flags without changing `press_release_cycle`
    /// semantics beyond resetting it to `false`. Used by `reset_fda`/`clr_status`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advances the debounce timers/flags given the current raw-pressed
    /// sample and the monotonic clock reading. Must not be called while the
    /// button is disabled — the caller skips sampling entirely in that case
    /// per spec, the FSA still ticks on the stale flags.
    ///
    /// Double-action variants (`cfg.secondary_mode_delay_ms.is_some()`) keep
    /// re-checking the elapsed press time every tick even after
    /// `valid_press_pend` has latched, so a still-held press can promote to
    /// `valid_secondary_mode_pend` later in the same cycle; base variants
    /// stop checking once a press is declared, matching the two distinct
    /// press-validation overrides in the original implementation.
    pub fn sample(&mut self, now_ms: u64, pressed: bool, cfg: &DebounceConfig) {
        let double_action = cfg.secondary_mode_delay_ms.is_some();
        if pressed {
            self.release_timer_start = None;
            if double_action || !self.press_release_cycle {
                match self.press_timer_start {
                    None => self.press_timer_start = Some(now_ms),
                    Some(start) => {
                        let elapsed = now_ms.saturating_sub(start) as u32;
                        if let Some(secondary_threshold) = cfg.secondary_threshold_ms() {
                            if elapsed >= secondary_threshold {
                                self.valid_secondary_mode_pend = true;
                                self.valid_press_pend = false;
                            } else if elapsed >= cfg.press_threshold_ms() {
                                self.valid_press_pend = true;
                            }
                        } else if elapsed >= cfg.press_threshold_ms() {
                            self.valid_press_pend = true;
                        }
                        if self.valid_press_pend || self.valid_secondary_mode_pend {
                            self.valid_release_pend = false;
                            self.press_release_cycle = true;
                        }
                    }
                }
            }
        } else {
            self.press_timer_start = None;
            let release_gate = if double_action {
                !self.valid_release_pend && self.press_release_cycle
            } else {
                self.press_release_cycle
            };
            if release_gate {
                match self.release_timer_start {
                    None => self.release_timer_start = Some(now_ms),
                    Some(start) => {
                        let elapsed = now_ms.saturating_sub(start) as u32;
                        if elapsed >= cfg.rls_dbnc_time_ms {
                            self.valid_release_pend = true;
                            self.press_release_cycle = false;
                            self.release_timer_start = None;
                        }
                    }
                }
            }
        }
    }

    /// Whether a debounced press edge is pending. Consuming code must clear
    /// this via [`Self::clear_valid_press_pend`] once acted upon.
    pub fn valid_press_pend(&self) -> bool {
        self.valid_press_pend
    }

    /// Clears the pending valid-press flag.
    pub fn clear_valid_press_pend(&mut self) {
        self.valid_press_pend = false;
    }

    /// Whether a debounced release edge is pending.
    pub fn valid_release_pend(&self) -> bool {
        self.valid_release_pend
    }

    /// Clears the pending valid-release flag.
    pub fn clear_valid_release_pend(&mut self) {
        self.valid_release_pend = false;
    }

    /// Whether the press has been held long enough to promote to secondary
    /// mode (double-action variants only).
    pub fn valid_secondary_mode_pend(&self) -> bool {
        self.valid_secondary_mode_pend
    }

    /// Clears the pending valid-secondary-mode flag.
    pub fn clear_valid_secondary_mode_pend(&mut self) {
        self.valid_secondary_mode_pend = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_press_pend_before_threshold() {
        let cfg = DebounceConfig::new(50, 0);
        let mut state = DebounceState::new();
        state.sample(0, true, &cfg);
        for t in (10..50).step_by(10) {
            state.sample(t, true, &cfg);
            assert!(!state.valid_press_pend(), "fired early at t={t}");
        }
    }

    #[test]
    fn press_pend_fires_once_threshold_crossed() {
        let cfg = DebounceConfig::new(50, 0);
        let mut state = DebounceState::new();
        state.sample(0, true, &cfg);
        state.sample(50, true, &cfg);
        assert!(state.valid_press_pend());
    }

    #[test]
    fn release_uses_fixed_hw_min_regardless_of_press_dbnc() {
        let cfg = DebounceConfig::new(500, 0);
        let mut state = DebounceState::new();
        state.sample(0, true, &cfg);
        state.sample(500, true, &cfg);
        assert!(state.valid_press_pend());
        state.clear_valid_press_pend();

        state.sample(500, false, &cfg);
        state.sample(519, false, &cfg);
        assert!(!state.valid_release_pend());
        state.sample(520, false, &cfg);
        assert!(state.valid_release_pend());
    }

    #[test]
    fn glitch_shorter_than_dbnc_leaves_no_pending_flag() {
        let cfg = DebounceConfig::new(50, 0);
        let mut state = DebounceState::new();
        state.sample(0, true, &cfg);
        state.sample(20, false, &cfg);
        assert!(!state.valid_press_pend());
        assert!(!state.valid_release_pend());
    }

    #[test]
    fn secondary_mode_promotion_clears_press_pend() {
        let cfg = DebounceConfig::new(50, 0).with_secondary_mode_delay(100);
        let mut state = DebounceState::new();
        state.sample(0, true, &cfg);
        state.sample(150, true, &cfg);
        assert!(state.valid_secondary_mode_pend());
        assert!(!state.valid_press_pend());
    }

    #[test]
    fn double_action_promotes_after_press_pend_already_latched() {
        let cfg = DebounceConfig::new(50, 0).with_secondary_mode_delay(100);
        let mut state = DebounceState::new();
        state.sample(0, true, &cfg);
        state.sample(50, true, &cfg);
        assert!(state.valid_press_pend());
        assert!(!state.valid_secondary_mode_pend());

        state.sample(150, true, &cfg);
        assert!(state.valid_secondary_mode_pend());
        assert!(!state.valid_press_pend());
    }
}
