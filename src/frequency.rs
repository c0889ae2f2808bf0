//! Frequency calculations
//!
//! `f = reference * (nint + nfrac / 2^23) / x`, where `x` is the VCO divider
//! selected by the FREQSEL band code.

use crate::constants::*;
use crate::errors::*;
use crate::tables::*;

/// PLL divider settings for one frequency
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllFrequency {
    /// VCO divider, 1, 2, 4, 8 or 16
    pub x: u8,
    /// Integer divider, 9 bits
    pub nint: u16,
    /// Fractional divider, always below 2^23
    pub nfrac: u32,
    /// FREQSEL band code
    pub freqsel: u8,
    /// Reference clock, Hz
    pub reference: u32,
}

/// Clamps `hz` into the tunable range
pub fn clamp_frequency(hz: u32) -> u32 {
    let clamped = hz.max(FREQUENCY_MIN).min(FREQUENCY_MAX);
    if clamped != hz {
        info!("Clamping frequency to {}Hz", clamped);
    }
    clamped
}

/// VCO divider encoded in the low 3 bits of a FREQSEL code
pub fn vco_divider(freqsel: u8) -> Result<u8, Error> {
    match freqsel & 7 {
        frange @ 3 ..= 7 => Ok(1 << (frange - 3)),
        _ => Err(Error::UnexpectedState),
    }
}

impl PllFrequency {

    /// Divider settings for `hz`, clamped into the tunable range
    pub fn from_hz(hz: u32) -> Self {
        let hz = clamp_frequency(hz);

        // Every clamped frequency has a band
        let freqsel = find_band(hz).unwrap_or(&BANDS[0]).value;

        let x = 1u64 << ((freqsel & 7) - 3);
        let reference = REFERENCE_HZ as u64;
        let vco = x * hz as u64;

        let mut nint = vco / reference;
        let mut nfrac = ((vco - nint * reference) << NFRAC_BITS) + reference / 2;
        nfrac /= reference;

        if nfrac == 1 << NFRAC_BITS {
            nint += 1;
            nfrac = 0;
        }

        PllFrequency {
            x: x as u8,
            nint: nint as u16,
            nfrac: nfrac as u32,
            freqsel,
            reference: REFERENCE_HZ,
        }
    }

    /// Synthesized frequency, rounded to the nearest Hz
    pub fn to_hz(self: &Self) -> u32 {
        let coeff = ((self.nint as u64) << NFRAC_BITS) + self.nfrac as u64;
        let div = (self.x as u64) << NFRAC_BITS;

        ((self.reference as u64 * coeff + (div >> 1)) / div) as u32
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn check_round_trip(hz: u32) {
        let f = PllFrequency::from_hz(hz);
        let err = (f.to_hz() as i64 - hz as i64).abs();
        let bound = (f.x as u64 * f.reference as u64 / (1 << NFRAC_BITS)) as i64;

        assert!(f.nfrac < 1 << NFRAC_BITS);
        assert!(f.nint < 1 << 9, "nint {} for {}", f.nint, hz);
        assert!(err <= bound, "{} Hz -> {:?} -> {} Hz", hz, f, f.to_hz());
    }

    #[test]
    fn round_trip_across_range() {
        let mut hz = FREQUENCY_MIN;
        while hz < FREQUENCY_MAX - 7_654_321 {
            check_round_trip(hz);
            hz += 7_654_321;
        }
        check_round_trip(FREQUENCY_MAX);
    }

    #[test]
    fn round_trip_band_edges() {
        for b in BANDS.iter() {
            check_round_trip(b.low);
            check_round_trip(b.low + 1);
            check_round_trip(b.high - 1);
            check_round_trip(b.high);
        }
    }

    #[test]
    fn out_of_range_clamps() {
        assert_eq!(PllFrequency::from_hz(0), PllFrequency::from_hz(FREQUENCY_MIN));
        assert_eq!(PllFrequency::from_hz(u32::MAX), PllFrequency::from_hz(FREQUENCY_MAX));
    }

    #[test]
    fn known_dividers() {
        // 1 GHz: band 0x25, x = 4, VCO 4 GHz
        let f = PllFrequency::from_hz(1_000_000_000);
        assert_eq!(f.freqsel, 0x25);
        assert_eq!(f.x, 4);
        assert_eq!(f.nint, 104);
        assert_eq!(f.nfrac, 1_398_101);
        assert_eq!(f.to_hz(), 1_000_000_000);

        // Exact multiple of the reference
        let f = PllFrequency::from_hz(2_400_000_000);
        assert_eq!(f.x, 2);
        assert_eq!(f.nint, 125);
        assert_eq!(f.nfrac, 0);
    }

    #[test]
    fn band_lookup() {
        assert_eq!(PllFrequency::from_hz(1_500_000_000).freqsel, 0x35);
        assert_eq!(PllFrequency::from_hz(BANDS[3].high).freqsel, BANDS[3].value);
    }

    #[test]
    fn divider_decode() {
        assert_eq!(vco_divider(0x27), Ok(16));
        assert_eq!(vco_divider(0x3c), Ok(2));
        assert_eq!(vco_divider(0x2b), Ok(1));
        assert_eq!(vco_divider(0x22), Err(Error::UnexpectedState));
    }
}
