//! Output-status bit-packing protocol (component D).
//!
//! Every variant encodes its visible state into a single `u32` word posted
//! to a [`crate::platform::NotifySink`]; bits a variant does not own are
//! always read back as zero, matching the original `otptsSttsUnpkg`
//! free function's packed-word contract.

const BIT_IS_ON: u32 = 0;
const BIT_IS_ENABLED: u32 = 1;
const BIT_PILOT_ON: u32 = 2;
const BIT_WRNNG_ON: u32 = 3;
const BIT_IS_VOIDED: u32 = 4;
const BIT_IS_ON_SCNDRY: u32 = 5;
const OTPT_CUR_VAL_SHIFT: u32 = 16;

/// The decoded contents of a packed status word.
///
/// Fields not owned by a given button variant are left at their default
/// (`false` / `0`) both when encoding and when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputFlags {
    /// Debounced on/off state.
    pub is_on: bool,
    /// Whether the button currently accepts input (inverse of `Disabled`).
    pub is_enabled: bool,
    /// Pilot indicator state (hinted-timed latch only).
    pub pilot_on: bool,
    /// Warning indicator state (hinted-timed latch only).
    pub wrnng_on: bool,
    /// Voided state (voidable family only).
    pub is_voided: bool,
    /// Secondary-mode (long-press) state (double-action family only).
    pub is_on_scndry: bool,
    /// Current slider output value (slider double-action only).
    pub otpt_cur_val: u16,
}

impl OutputFlags {
    /// Packs this flag set into a single status word.
    pub fn encode(self) -> u32 {
        let mut word = 0u32;
        word |= (self.is_on as u32) << BIT_IS_ON;
        word |= (self.is_enabled as u32) << BIT_IS_ENABLED;
        word |= (self.pilot_on as u32) << BIT_PILOT_ON;
        word |= (self.wrnng_on as u32) << BIT_WRNNG_ON;
        word |= (self.is_voided as u32) << BIT_IS_VOIDED;
        word |= (self.is_on_scndry as u32) << BIT_IS_ON_SCNDRY;
        word |= (self.otpt_cur_val as u32) << OTPT_CUR_VAL_SHIFT;
        word
    }

    /// Unpacks a status word into its flag set. The inverse of [`encode`](Self::encode).
    pub fn decode(word: u32) -> Self {
        Self {
            is_on: word & (1 << BIT_IS_ON) != 0,
            is_enabled: word & (1 << BIT_IS_ENABLED) != 0,
            pilot_on: word & (1 << BIT_PILOT_ON) != 0,
            wrnng_on: word & (1 << BIT_WRNNG_ON) != 0,
            is_voided: word & (1 << BIT_IS_VOIDED) != 0,
            is_on_scndry: word & (1 << BIT_IS_ON_SCNDRY) != 0,
            otpt_cur_val: (word >> OTPT_CUR_VAL_SHIFT) as u16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_flag_independently() {
        let cases = [
            OutputFlags { is_on: true, ..Default::default() },
            OutputFlags { is_enabled: true, ..Default::default() },
            OutputFlags { pilot_on: true, ..Default::default() },
            OutputFlags { wrnng_on: true, ..Default::default() },
            OutputFlags { is_voided: true, ..Default::default() },
            OutputFlags { is_on_scndry: true, ..Default::default() },
            OutputFlags { otpt_cur_val: 1234, ..Default::default() },
        ];
        for flags in cases {
            assert_eq!(OutputFlags::decode(flags.encode()), flags);
        }
    }

    #[test]
    fn round_trips_combined_flags() {
        let flags = OutputFlags {
            is_on: true,
            is_enabled: true,
            pilot_on: false,
            wrnng_on: true,
            is_voided: false,
            is_on_scndry: true,
            otpt_cur_val: 0xBEEF,
        };
        assert_eq!(OutputFlags::decode(flags.encode()), flags);
    }

    #[test]
    fn unowned_bits_decode_as_zero() {
        let word = 0xFFFF_0000;
        let flags = OutputFlags::decode(word);
        assert!(!flags.is_on);
        assert!(!flags.is_enabled);
        assert!(!flags.pilot_on);
        assert!(!flags.wrnng_on);
        assert!(!flags.is_voided);
        assert!(!flags.is_on_scndry);
        assert_eq!(flags.otpt_cur_val, 0xFFFF);
    }
}
