//! Crate-level error type.

use ::core::fmt;

/// Errors returned by fallible operations on a button.
///
/// An explicit error enum, not a panic, for bad configuration or an
/// unavailable collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpbError {
    /// A construction or setter argument is out of its allowed range, e.g. a
    /// zero debounce time or a slider step larger than the value range.
    InvalidParameter,
    /// A collaborator (scheduler slot, companion switch) is not available
    /// in the current configuration.
    ResourceUnavailable,
    /// The underlying [`embedded_hal::digital::InputPin`] read failed.
    TransportFault,
}

impl fmt::Display for MpbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter => f.write_str("invalid parameter"),
            Self::ResourceUnavailable => f.write_str("resource unavailable"),
            Self::TransportFault => f.write_str("pin transport fault"),
        }
    }
}

/// A `Result` alias defaulting its error type to [`MpbError`].
pub type MpbResult<T> = Result<T, MpbError>;
