//! Static lookup tables
//!
//! FREQSEL bands, LPF bandwidths, RXVGA1 gain conversion and the diagnostic
//! register list.

use crate::constants::*;

/// One FREQSEL band, inclusive on both ends.
///
/// Adjacent bands share their boundary frequency; lookups take the first
/// matching entry in ascending order.
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub struct FrequencyBand {
    pub low: u32,
    pub high: u32,
    /// FREQSEL code: SELVCO in bits [5:3], FRANGE in bits [2:0]
    pub value: u8,
}

impl FrequencyBand {
    #[inline]
    pub fn contains(self: &Self, hz: u32) -> bool {
        (self.low ..= self.high).contains(&hz)
    }
}

const fn band(low: u32, high: u32, value: u8) -> FrequencyBand {
    FrequencyBand { low, high, value }
}

/// Frequency Range table, corresponds to the LMS FREQSEL table.
pub const BANDS: [FrequencyBand; 16] = [
    band(FREQUENCY_MIN, 285_625_000, 0x27),
    band(285_625_000, 336_875_000, 0x2f),
    band(336_875_000, 405_000_000, 0x37),
    band(405_000_000, 465_000_000, 0x3f),
    band(465_000_000, 571_250_000, 0x26),
    band(571_250_000, 673_750_000, 0x2e),
    band(673_750_000, 810_000_000, 0x36),
    band(810_000_000, 930_000_000, 0x3e),
    band(930_000_000, 1_142_500_000, 0x25),
    band(1_142_500_000, 1_347_500_000, 0x2d),
    band(1_347_500_000, 1_620_000_000, 0x35),
    band(1_620_000_000, 1_860_000_000, 0x3d),
    band(1_860_000_000, 2_285_000_000, 0x24),
    band(2_285_000_000, 2_695_000_000, 0x2c),
    band(2_695_000_000, 3_240_000_000, 0x34),
    band(3_240_000_000, FREQUENCY_MAX, 0x3c),
];

/// First band containing `hz`, in ascending order.
pub fn find_band(hz: u32) -> Option<&'static FrequencyBand> {
    BANDS.iter().find(|b| b.contains(hz))
}


/// LPF bandwidth, discriminant is the 4 bit register code
#[derive(Debug,Copy,Clone,PartialEq,Eq,PartialOrd,Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LpfBandwidth {
    Bw28MHz = 0,
    Bw20MHz,
    Bw14MHz,
    Bw12MHz,
    Bw10MHz,
    Bw8p75MHz,
    Bw7MHz,
    Bw6MHz,
    Bw5p5MHz,
    Bw5MHz,
    Bw3p84MHz,
    Bw3MHz,
    Bw2p75MHz,
    Bw2p5MHz,
    Bw1p75MHz,
    Bw1p5MHz,
}

/// LPF bandwidths by register code, widest first
pub const BANDWIDTHS: [(LpfBandwidth, u32); 16] = [
    (LpfBandwidth::Bw28MHz, 28_000_000),
    (LpfBandwidth::Bw20MHz, 20_000_000),
    (LpfBandwidth::Bw14MHz, 14_000_000),
    (LpfBandwidth::Bw12MHz, 12_000_000),
    (LpfBandwidth::Bw10MHz, 10_000_000),
    (LpfBandwidth::Bw8p75MHz, 8_750_000),
    (LpfBandwidth::Bw7MHz, 7_000_000),
    (LpfBandwidth::Bw6MHz, 6_000_000),
    (LpfBandwidth::Bw5p5MHz, 5_500_000),
    (LpfBandwidth::Bw5MHz, 5_000_000),
    (LpfBandwidth::Bw3p84MHz, 3_840_000),
    (LpfBandwidth::Bw3MHz, 3_000_000),
    (LpfBandwidth::Bw2p75MHz, 2_750_000),
    (LpfBandwidth::Bw2p5MHz, 2_500_000),
    (LpfBandwidth::Bw1p75MHz, 1_750_000),
    (LpfBandwidth::Bw1p5MHz, 1_500_000),
];

impl LpfBandwidth {
    /// Narrowest bandwidth that is at least `req` Hz.
    /// Requests wider than every entry get the widest filter.
    pub fn from_hz(req: u32) -> Self {
        BANDWIDTHS.iter()
            .rev()
            .find(|(_, hz)| req <= *hz)
            .map(|(bw, _)| *bw)
            .unwrap_or(LpfBandwidth::Bw28MHz)
    }

    /// Register code to bandwidth, only the low 4 bits are used
    pub fn from_code(code: u8) -> Self {
        BANDWIDTHS[(code & 0xf) as usize].0
    }

    #[inline]
    pub fn code(self: Self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn hz(self: Self) -> u32 {
        BANDWIDTHS[self as usize].1
    }
}


/// RXVGA1 code to dB.
///
/// The LMS FAQ (Rev 1.0r10, Section 5.20) gives
/// `value_db = 20 * log10(127 / (127 - code))`, but an offset of 5 is needed:
/// `value_db = 5 + 20 * log10(127 / (127 - code))`.
pub const RXVGA1_LUT_CODE2VAL: [u8; 121] = [
    5,  5,  5,  5,  5,  5,  5,  5,  6,  6,  6,  6,  6,  6,  6,  6,  6,  6,  6,
    6,  6,  7,  7,  7,  7,  7,  7,  7,  7,  7,  7,  7,  8,  8,  8,  8,  8,  8,
    8,  8,  8,  8,  8,  9,  9,  9,  9,  9,  9,  9,  9,  9,  10, 10, 10, 10, 10,
    10, 10, 10, 11, 11, 11, 11, 11, 11, 11, 12, 12, 12, 12, 12, 12, 12, 13, 13,
    13, 13, 13, 13, 14, 14, 14, 14, 14, 15, 15, 15, 15, 15, 16, 16, 16, 16, 17,
    17, 17, 18, 18, 18, 18, 19, 19, 19, 20, 20, 21, 21, 22, 22, 22, 23, 24, 24,
    25, 25, 26, 27, 28, 29, 30,
];

/// RXVGA1 dB to code, closest codes to the formula above.
/// Indices 0 - 4 are clamped to 5 dB.
pub const RXVGA1_LUT_VAL2CODE: [u8; 31] = [
    2,  2,  2,  2,   2,   2,   14,  26,  37,  47,  56,  63,  70,  76,  82,  87,
    91, 95, 99, 102, 104, 107, 109, 111, 113, 114, 116, 117, 118, 119, 120,
];


/// Named group of registers for diagnostics
#[derive(Debug,Copy,Clone)]
pub struct RegisterGroup {
    pub name: &'static str,
    pub addrs: &'static [u8],
}

/// Every documented register, by functional group
pub const REGISTER_GROUPS: [RegisterGroup; 8] = [
    RegisterGroup {
        name: "Top level configuration",
        addrs: &[
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B,
            0x0E, 0x0F,
        ],
    },
    RegisterGroup {
        name: "TX PLL configuration",
        addrs: &[
            0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B,
            0x1C, 0x1D, 0x1E, 0x1F,
        ],
    },
    RegisterGroup {
        name: "RX PLL configuration",
        addrs: &[
            0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x28, 0x29, 0x2A, 0x2B,
            0x2C, 0x2D, 0x2E, 0x2F,
        ],
    },
    RegisterGroup {
        name: "TX LPF modules configuration",
        addrs: &[0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36],
    },
    RegisterGroup {
        name: "TX RF modules configuration",
        addrs: &[
            0x40, 0x41, 0x42, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49, 0x4A, 0x4B,
            0x4C, 0x4D, 0x4E, 0x4F,
        ],
    },
    RegisterGroup {
        name: "RX LPF, ADC and DAC modules configuration",
        addrs: &[
            0x50, 0x51, 0x52, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5A, 0x5B,
            0x5C, 0x5D, 0x5E, 0x5F,
        ],
    },
    RegisterGroup {
        name: "RXVGA2 configuration",
        addrs: &[0x60, 0x61, 0x62, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68],
    },
    RegisterGroup {
        name: "RX FE modules configuration",
        addrs: &[
            0x70, 0x71, 0x72, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7A, 0x7B,
            0x7C,
        ],
    },
];

/// Number of registers in [`REGISTER_GROUPS`]
pub const REGISTER_DUMP_LEN: usize = 107;

/// All diagnostic registers in dump order, tagged with their group name
pub fn dump_addrs() -> impl Iterator<Item = (&'static str, u8)> {
    REGISTER_GROUPS.iter()
        .flat_map(|g| g.addrs.iter().map(move |a| (g.name, *a)))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_cover_the_tunable_range() {
        let mut f = FREQUENCY_MIN;
        while f <= FREQUENCY_MAX - 1_000_000 {
            assert!(find_band(f).is_some(), "no band for {}", f);
            f += 1_000_000;
        }
        assert!(find_band(FREQUENCY_MAX).is_some());
        assert!(find_band(FREQUENCY_MIN - 1).is_none());
        assert!(find_band(FREQUENCY_MAX + 1).is_none());
    }

    #[test]
    fn band_boundaries_match_two_entries_and_resolve_low() {
        for pair in BANDS.windows(2) {
            let edge = pair[0].high;
            assert_eq!(edge, pair[1].low);
            assert_eq!(BANDS.iter().filter(|b| b.contains(edge)).count(), 2);
            assert_eq!(find_band(edge), Some(&pair[0]));
        }
    }

    #[test]
    fn band_codes_select_vco_divider() {
        for b in BANDS.iter() {
            let frange = b.value & 7;
            assert!((4..=7).contains(&frange));
        }
    }

    #[test]
    fn bandwidth_rounds_up_to_table_entry() {
        assert_eq!(LpfBandwidth::from_hz(8_000_000), LpfBandwidth::Bw8p75MHz);
        assert_eq!(LpfBandwidth::from_hz(30_000_000), LpfBandwidth::Bw28MHz);
        assert_eq!(LpfBandwidth::from_hz(0), LpfBandwidth::Bw1p5MHz);
        assert_eq!(LpfBandwidth::from_hz(1_500_000), LpfBandwidth::Bw1p5MHz);
        assert_eq!(LpfBandwidth::from_hz(1_500_001), LpfBandwidth::Bw1p75MHz);
        assert_eq!(LpfBandwidth::from_hz(28_000_000), LpfBandwidth::Bw28MHz);
    }

    #[test]
    fn bandwidth_codes_match_table_order() {
        for (i, (bw, hz)) in BANDWIDTHS.iter().enumerate() {
            assert_eq!(bw.code() as usize, i);
            assert_eq!(bw.hz(), *hz);
            assert_eq!(LpfBandwidth::from_code(i as u8), *bw);
        }
    }

    #[test]
    fn rxvga1_tables_agree() {
        for db in RXVGA1_GAIN_MIN ..= RXVGA1_GAIN_MAX {
            let code = RXVGA1_LUT_VAL2CODE[db as usize];
            assert_eq!(RXVGA1_LUT_CODE2VAL[code as usize] as i32, db);
        }
    }

    #[test]
    fn dump_list_is_complete() {
        assert_eq!(dump_addrs().count(), REGISTER_DUMP_LEN);
        assert!(dump_addrs().all(|(_, a)| a <= 0x7f));
        assert_eq!(dump_addrs().last(), Some(("RX FE modules configuration", 0x7c)));
    }
}
