//! `mpb-switch`: turns a noisy, bouncing momentary push-button input into
//! the stable semantics of one of several electromechanical switch classes
//! — momentary, latching (timed, hinted-timed, externally-unlatched,
//! toggle), double-action (delayed-secondary, slider) and voidable
//! (timed, single-service).
//!
//! The re-architecture keeps one [`core::ButtonCore`] record shared by
//! every family; each family is a small state enum plus a per-tick `step`,
//! generic over a policy trait (`latch::LatchPolicy`,
//! `double::DoubleActionPolicy`, `voidable::VoidPolicy`) that supplies the
//! variant-specific behavior. See `DESIGN.md` for where each piece is
//! grounded in the original implementation.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod base;
pub mod core;
pub mod debounce;
pub mod double;
pub mod error;
pub mod latch;
pub mod platform;
pub mod status;
pub mod voidable;

pub use base::{BaseState, DebouncedButton};
pub use core::{ButtonCore, CoreConfig, STD_POLL_DELAY_MS};
pub use debounce::{DebounceConfig, DebounceState, HW_MIN_DBNC_MS};
pub use double::{DoubleAction, DoubleActionPolicy, DoubleActionState, MIN_SCND_MOD_DELAY_MS};
pub use error::{MpbError, MpbResult};
pub use latch::{LatchPolicy, LatchState, Latched};
pub use platform::{CompanionSwitch, MillisClock, NotifySink, Scheduler, TaskControl, TaskHandle};
pub use status::OutputFlags;
pub use voidable::{SupportsTaskWhileOn, VoidPolicy, Voidable, VoidableState};

/// A convenience pin-identifier pair, collapsing the original's two
/// delegating-constructor overloads (`(port, pin)` vs. `gpioPinId_t`) into
/// the one call shape every constructor here actually needs — see
/// `SPEC_FULL.md` section C.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinId<P> {
    /// The GPIO port/bank identifier, as defined by the embedding HAL.
    pub port: P,
    /// The pin number within that port.
    pub pin: u8,
}
