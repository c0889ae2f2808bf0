//! Constants

/// PLL reference clock
pub const REFERENCE_HZ: u32 = 38_400_000;

/// Fractional divider width, NFRAC is a 23 bit value
pub const NFRAC_BITS: u32 = 23;

/// Lowest tunable frequency, VCO4 lower edge (3.72 GHz) divided by 16
pub const FREQUENCY_MIN: u32 = 232_500_000;

/// Highest tunable frequency
/// The programming manual lists 3.72 GHz for the last FREQSEL entry,
/// it works up to 3.8 GHz.
pub const FREQUENCY_MAX: u32 = 3_800_000_000;

/// Frequencies at or above this use the high band PA/LNA and PLL output buffer
pub const BAND_HIGH: u32 = 1_500_000_000;

/// RXVGA1 gain range, dB
pub const RXVGA1_GAIN_MIN: i32 = 5;
pub const RXVGA1_GAIN_MAX: i32 = 30;

/// RXVGA2 gain range, dB, 3 dB per code
pub const RXVGA2_GAIN_MIN: i32 = 0;
pub const RXVGA2_GAIN_MAX: i32 = 30;
pub const RXVGA2_GAIN_STEP: i32 = 3;

/// TXVGA1 gain range, dB, register code is gain + 35
pub const TXVGA1_GAIN_MIN: i32 = -35;
pub const TXVGA1_GAIN_MAX: i32 = -4;
pub const TXVGA1_GAIN_OFFSET: i32 = 35;

/// TXVGA2 gain range, dB
/// Register codes 25 to 31 all correspond to 25 dB.
pub const TXVGA2_GAIN_MIN: i32 = 0;
pub const TXVGA2_GAIN_MAX: i32 = 25;

/// RXVGA1 codes above this are clamped before table lookup
pub const RXVGA1_CODE_MAX: u8 = 120;

/// VCOCAP search starting point and initial step
pub const VCOCAP_START: u8 = 32;
pub const VCOCAP_MAX: u8 = 63;

/// Binary search iterations before giving up on VTUNE lock
pub const VCOCAP_MAX_ITERATIONS: u8 = 6;

/// Recommended PLL charge pump current (Ichp), offset up/down currents are zeroed
pub const PLL_ICHP: u8 = 0x0c;
pub const PLL_OFFUP: u8 = 0x00;
pub const PLL_OFFDOWN: u8 = 0x00;

/// DC calibration "done" polls before a submodule is declared stuck
pub const DC_CAL_MAX_POLLS: u8 = 25;

/// Settle time between DC calibration "done" polls
pub const DC_CAL_POLL_DELAY_US: u16 = 10;

/// DC_CNTVAL starting point, and the result that asks for a restart from 0
pub const DC_CAL_START_COUNT: u8 = 31;
pub const DC_CAL_SUSPECT_VALUE: u8 = 31;

/// Largest valid DC calibration value (6 bits)
pub const DC_CAL_VALUE_MAX: u8 = 0x3f;
