//! LMS6002D registers
//!
//! Most registers don't have clearly defined names in the datasheet and many
//! are shared between unrelated functions. Only the registers and fields the
//! driver touches are named here.
//!
//! Registers come in two flavours:
//! * [`Register`]: fixed address (top level, TX RF, RX front end, ...)
//! * [`Relative`]: offset from a base that depends on the module (TX/RX PLL at
//!   0x10/0x20, TX/RX LPF at 0x30/0x50) or on the DC calibration block.

use core::convert::TryFrom;
use core::marker::PhantomData;

use crate::errors::Error;

/// Register at a fixed address
pub trait Register {
    const ADDR: u8;
}

/// Register at a fixed offset from a block base address
pub trait Relative {
    const OFFSET: u8;
}

/// Fixed address register marker types
macro_rules! gen_register_marker {
    ($(#[$meta:meta])* $r:ident, $n:tt) => {
        $(#[$meta])*
        #[derive(Debug,Copy,Clone)]
        pub struct $r {}

        impl Register for $r { const ADDR: u8 = $n; }
    }
}

/// Block relative register marker types
macro_rules! gen_relative_marker {
    ($(#[$meta:meta])* $r:ident, $n:tt) => {
        $(#[$meta])*
        #[derive(Debug,Copy,Clone)]
        pub struct $r {}

        impl Relative for $r { const OFFSET: u8 = $n; }
    }
}


/// Single register value
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub struct Reg<R> {
    /// Register byte
    pub w: u8,
    phantom: PhantomData<R>,
}

/// Bit operations on register bytes
impl<R> Reg<R> {
    #[inline]
    pub fn new(w: u8) -> Self {
        Reg { w, phantom: PhantomData }
    }

    /// Get a field that can hold any bit pattern
    #[inline]
    pub fn get<F>(self: &Self) -> F
    where F: BitField<R> + From<u8>
    {
        F::from(
            (self.w >> F::offset()) & F::mask()
        )
    }

    /// Get a field with reserved bit patterns
    #[inline]
    pub fn try_get<F>(self: &Self) -> Result<F, Error>
    where F: BitField<R> + TryFrom<u8, Error = Error>
    {
        F::try_from(
            (self.w >> F::offset()) & F::mask()
        )
    }

    #[inline]
    pub fn set<F>(mut self: Self, f: F) -> Self
    where F: BitField<R> + Into<u8>
    {
        let bits: u8 = f.into();
        let fbits = (bits & F::mask()) << F::offset();
        let rbits = self.w & !(F::mask() << F::offset());
        self.w = rbits | fbits;
        self
    }
}


/// Bit field within an 8 bit register
pub trait BitField<R> {
    /// Number of bits in the bit field
    fn num_bits() -> u8;

    /// Offset from 0
    fn offset() -> u8;

    #[inline]
    fn mask() -> u8 {
        ((1u16 << Self::num_bits()) - 1) as u8
    }
}

/// Generate BitField implementation for each register carrying the field
macro_rules! gen_bitfield_impl {
    ([$($r:ty),+], $n:ident, $nb:tt, $off:tt) => {
        $(
            impl BitField<$r> for $n {
                #[inline] fn num_bits() -> u8 { $nb }
                #[inline] fn offset() -> u8 { $off }
            }
        )+
    }
}

/// Small bitfield-encoded numbers boilerplate
macro_rules! gen_bitfield_struct {
    ($(#[$meta:meta])*, [$($r:ty),+], $n:ident, $nb:tt, $off:tt) => {
        $(#[$meta])*
        #[derive(Debug,Copy,Clone,PartialEq,Eq)]
        pub struct $n(pub u8);

        gen_bitfield_impl!([$($r),+], $n, $nb, $off);

        impl From<u8> for $n { #[inline] fn from(x: u8) -> Self { $n(x) } }
        impl From<$n> for u8 { #[inline] fn from(x: $n) -> u8 { x.0 } }
    };
}

/// Single bit switches
macro_rules! gen_bitfield_flag {
    ($(#[$meta:meta])*, [$($r:ty),+], $n:ident, $off:tt) => {
        $(#[$meta])*
        #[derive(Debug,Copy,Clone,PartialEq,Eq)]
        pub struct $n(pub bool);

        gen_bitfield_impl!([$($r),+], $n, 1, $off);

        impl From<u8> for $n { #[inline] fn from(x: u8) -> Self { $n(x != 0) } }
        impl From<$n> for u8 { #[inline] fn from(x: $n) -> u8 { x.0 as u8 } }
    };
}

/// Enumerated fields; bit patterns without a variant read back as `UnexpectedState`
macro_rules! gen_bitfield_enum {
    ($(#[$meta:meta])*, [$($r:ty),+], $n:ident, $nb:tt, $off:tt,
     { $($(#[$vmeta:meta])* $v:ident = $x:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug,Copy,Clone,PartialEq,Eq)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub enum $n {
            $( $(#[$vmeta])* $v = $x, )+
        }

        gen_bitfield_impl!([$($r),+], $n, $nb, $off);

        impl TryFrom<u8> for $n {
            type Error = Error;

            #[inline]
            fn try_from(x: u8) -> Result<Self, Error> {
                $( if x == $x { return Ok($n::$v); } )+
                Err(Error::UnexpectedState)
            }
        }

        impl From<$n> for u8 { #[inline] fn from(x: $n) -> u8 { x as u8 } }
    };
}


gen_register_marker!(
    /// Top level control: soft reset, chip enable, TX/RX enable
    TopCtl, 0x05);
gen_register_marker!(
    /// RF loopback and baseband loopback destination
    LoopbackCtl, 0x08);
gen_register_marker!(
    /// Clock enables (DSMs, calibration clocks) and ADC input select
    ClkEn, 0x09);
gen_register_marker!(
    /// RF loopback switch power
    RfLoopSwitch, 0x0b);
gen_register_marker!(
    /// TX DAC control
    TxDacCtl, 0x36);
gen_register_marker!(
    /// TX LPF DC calibration comparator
    TxLpfDcComp, 0x3f);
gen_register_marker!(
    /// TX RF front end enable
    TxRfCtl, 0x40);
gen_register_marker!(
    /// TXVGA1 gain, the whole register is VGA1GAIN
    Txvga1Gain, 0x41);
gen_register_marker!(
    /// PA selection, AUX PA and peak detector power
    PaCtl, 0x44);
gen_register_marker!(
    /// TXVGA2 gain
    Txvga2Gain, 0x45);
gen_register_marker!(
    /// Baseband loopback source
    BbLoopCtl, 0x46);
gen_register_marker!(
    /// RX LPF DC calibration comparator
    RxLpfDcComp, 0x5f);
gen_register_marker!(
    /// RXVGA2 enable and gain decode control
    Rxvga2Ctl, 0x64);
gen_register_marker!(
    /// RXVGA2 gain
    Rxvga2Gain, 0x65);
gen_register_marker!(
    /// RXVGA2 stage gains under direct control
    Rxvga2StageGain, 0x68);
gen_register_marker!(
    /// RXVGA2 DC calibration comparators
    Rxvga2DcComp, 0x6e);
gen_register_marker!(
    /// RX front end enable and LNA decode
    RxFeCtl, 0x70);
gen_register_marker!(
    /// RX front end input, LNA pads
    RxFeIn, 0x71);
gen_register_marker!(
    /// LNA gain and selection
    LnaCtl, 0x75);
gen_register_marker!(
    /// RXVGA1 gain (RFB_TIA_RXFE)
    Rxvga1Gain, 0x76);
gen_register_marker!(
    /// RX front end termination
    RxFeTerm, 0x7c);
gen_register_marker!(
    /// Reserved test register holding LNA and RXVGA1 power downs
    RxFePower, 0x7d);


gen_relative_marker!(
    /// NINT[8:1]
    PllNint, 0);
gen_relative_marker!(
    /// NINT[0], NFRAC[22:16]
    PllNfracHigh, 1);
gen_relative_marker!(
    /// NFRAC[15:8]
    PllNfracMid, 2);
gen_relative_marker!(
    /// NFRAC[7:0]
    PllNfracLow, 3);
gen_relative_marker!(
    /// PLL enable and DSM dither
    PllCtl, 4);
gen_relative_marker!(
    /// FREQSEL and output buffer select
    PllFreqSel, 5);
gen_relative_marker!(
    /// Charge pump current
    PllIchp, 6);
gen_relative_marker!(
    /// Charge pump up offset current
    PllOffUp, 7);
gen_relative_marker!(
    /// Charge pump down offset current
    PllOffDown, 8);
gen_relative_marker!(
    /// VCO capacitor trim
    PllVcoCap, 9);
gen_relative_marker!(
    /// VTUNE comparators
    PllVtune, 10);

gen_relative_marker!(
    /// LPF bandwidth and enable
    LpfCtl, 4);
gen_relative_marker!(
    /// LPF bypass and DC offset level
    LpfBypassCtl, 5);

gen_relative_marker!(
    /// DC_REGVAL, calibration result of the addressed submodule
    DcRegVal, 0);
gen_relative_marker!(
    /// DC calibration status
    DcStatus, 1);
gen_relative_marker!(
    /// DC_CNTVAL, value to load
    DcCntVal, 2);
gen_relative_marker!(
    /// DC calibration control
    DcCalCtl, 3);


gen_bitfield_flag!(
    /// Soft reset, active low
    , [TopCtl], SoftResetN, 5
);

gen_bitfield_flag!(
    /// Top level enable; cleared to power the chip down
    , [TopCtl], ChipEnable, 4
);

gen_bitfield_flag!(
    /// TX subsystem enable (STXEN)
    , [TopCtl], TxEnable, 3
);

gen_bitfield_flag!(
    /// RX subsystem enable (SRXEN)
    , [TopCtl], RxEnable, 2
);

gen_bitfield_flag!(
    /// Four wire serial port mode (TFWMODE)
    , [TopCtl], SpiFourWire, 1
);


gen_bitfield_struct!(
    /// LBRFEN[3:0]
    ///  0000 - RF loopback disabled
    ///  0001 - TXMIX output connected to LNA1 path
    ///  0010 - TXMIX output connected to LNA2 path
    ///  0011 - TXMIX output connected to LNA3 path
    ///  else - Reserved
    , [LoopbackCtl], LbRfEn, 4, 0
);

gen_bitfield_flag!(
    /// TX BB loopback signal connected to the RX output pins
    , [LoopbackCtl], LbenOpin, 4
);

gen_bitfield_flag!(
    /// TX BB loopback signal connected to the RXVGA2 input
    , [LoopbackCtl], LbenVga2In, 5
);

gen_bitfield_flag!(
    /// TX BB loopback signal connected to the RXLPF input
    , [LoopbackCtl], LbenLpfIn, 6
);


gen_bitfield_flag!(
    /// CLK_EN[0], TX DSM SPI clock
    , [ClkEn], TxDsmClk, 0
);

gen_bitfield_flag!(
    /// CLK_EN[1], TX LPF DC calibration clock
    , [ClkEn], TxLpfDcCalClk, 1
);

gen_bitfield_flag!(
    /// CLK_EN[2], RX DSM SPI clock
    , [ClkEn], RxDsmClk, 2
);

gen_bitfield_flag!(
    /// CLK_EN[3], RX LPF DC calibration clock
    , [ClkEn], RxLpfDcCalClk, 3
);

gen_bitfield_flag!(
    /// CLK_EN[4], RXVGA2 DC calibration clock
    , [ClkEn], Rxvga2DcCalClk, 4
);

gen_bitfield_flag!(
    /// CLK_EN[5], LPF tuning calibration clock
    , [ClkEn], LpfCalClk, 5
);

gen_bitfield_flag!(
    /// ADC input taken from the external pins instead of RXVGA2
    , [ClkEn], ExternalAdcInput, 7
);


gen_bitfield_flag!(
    /// RF loopback switch powered up
    , [RfLoopSwitch], LoopbackSwitch, 0
);


gen_bitfield_flag!(
    /// DAC off / minimum DC output, needed during TX LPF calibration
    , [TxDacCtl], TxDacQuiet, 7
);

gen_bitfield_flag!(
    /// DC calibration comparator power down
    , [TxLpfDcComp, RxLpfDcComp], DcCompPowerDown, 7
);


gen_bitfield_flag!(
    /// TX RF front end enable
    , [TxRfCtl], TxRfEnable, 1
);


gen_bitfield_struct!(
    /// VGA1GAIN code, gain + 35
    , [Txvga1Gain], Txvga1Code, 5, 0
);


gen_bitfield_struct!(
    /// PA_EN[2:0]
    ///  000 - PA1 and PA2 off
    ///  010 - PA1 on
    ///  100 - PA2 on
    , [PaCtl], PaEn, 3, 2
);

gen_bitfield_flag!(
    /// AUX PA power down
    , [PaCtl], AuxPaPowerDown, 1
);

gen_bitfield_flag!(
    /// Envelope/peak detector power down
    , [PaCtl], PeakDetectPowerDown, 0
);


gen_bitfield_struct!(
    /// VGA2GAIN code, 1 dB per code, 25 and up are 25 dB
    , [Txvga2Gain], Txvga2Code, 5, 3
);


gen_bitfield_enum!(
    /// LOOPBBEN[1:0], TX baseband loopback source
    , [BbLoopCtl], LoopBbEn, 2, 2, {
        /// All baseband loops opened
        Open = 0,
        /// TX loopback path connected from TXLPF output
        TxLpf = 1,
        /// TX loopback path connected from TXVGA1 output
        TxVga1 = 2,
        /// TX loopback path connected from envelope/peak detector output
        EnvPeak = 3,
    }
);


gen_bitfield_flag!(
    /// RXVGA2 enable
    , [Rxvga2Ctl], Rxvga2Enable, 1
);

gen_bitfield_flag!(
    /// RXVGA2 gain decode: set for direct control of the stage gains
    , [Rxvga2Ctl], Rxvga2Decode, 0
);


gen_bitfield_struct!(
    /// RXVGA2 gain code, 3 dB per code
    , [Rxvga2Gain], Rxvga2Code, 5, 0
);


gen_bitfield_struct!(
    /// VGA2GAINA
    , [Rxvga2StageGain], Vga2GainA, 4, 0
);

gen_bitfield_struct!(
    /// VGA2GAINB
    , [Rxvga2StageGain], Vga2GainB, 4, 4
);


gen_bitfield_struct!(
    /// RXVGA2 DC comparators power down, both set to power down
    , [Rxvga2DcComp], Rxvga2DcCompPowerDown, 2, 6
);


gen_bitfield_flag!(
    /// RX front end enable
    , [RxFeCtl], RxFeEnable, 0
);

gen_bitfield_flag!(
    /// LNA decode test bit, set to power the LNAs down
    , [RxFeCtl], LnaDecodePowerDown, 1
);


gen_bitfield_flag!(
    /// Cleared to connect the LNA to the external pads and terminate internally
    , [RxFeIn], LnaPadConnect, 7
);


gen_bitfield_enum!(
    /// LNA gain mode
    , [LnaCtl], LnaGain, 2, 6, {
        /// Not a valid setting, reads back as an error
        Unknown = 0,
        Bypass = 1,
        Mid = 2,
        Max = 3,
    }
);

gen_bitfield_enum!(
    /// Active LNA
    , [LnaCtl], LnaSelect, 2, 4, {
        None = 0,
        Lna1 = 1,
        Lna2 = 2,
        Lna3 = 3,
    }
);


gen_bitfield_struct!(
    /// RXVGA1 gain code, 0 to 127, meaningful up to 120
    , [Rxvga1Gain], Rxvga1Code, 7, 0
);


gen_bitfield_flag!(
    /// RX front end internal termination
    , [RxFeTerm], RxFeTerminate, 2
);


gen_bitfield_flag!(
    /// RXVGA1 power down
    , [RxFePower], Rxvga1PowerDown, 3
);

gen_bitfield_flag!(
    /// LNA power down
    , [RxFePower], LnaPowerDown, 0
);


gen_bitfield_struct!(
    /// Whole register, NINT[8:1]
    , [PllNint], NintHigh, 8, 0
);

gen_bitfield_struct!(
    /// NINT[0]
    , [PllNfracHigh], NintLsb, 1, 7
);

gen_bitfield_struct!(
    /// NFRAC[22:16]
    , [PllNfracHigh], NfracHigh, 7, 0
);

gen_bitfield_struct!(
    /// Whole register, NFRAC[15:8] or NFRAC[7:0]
    , [PllNfracMid, PllNfracLow], NfracByte, 8, 0
);


gen_bitfield_flag!(
    /// DSM dither enable
    , [PllCtl], DitherEnable, 7
);

gen_bitfield_struct!(
    /// Number of dithered bits minus one
    , [PllCtl], DitherBits, 3, 4
);

gen_bitfield_flag!(
    /// PLL enable
    , [PllCtl], PllEnable, 3
);


gen_bitfield_struct!(
    /// FREQSEL band code, see the band table
    , [PllFreqSel], FreqSel, 6, 2
);

gen_bitfield_struct!(
    /// SELOUT, PLL output buffer
    ///  00 - all buffers off
    ///  01 - low band buffer
    ///  10 - high band buffer
    ///  11 - RF loopback buffer
    , [PllFreqSel], SelOut, 2, 0
);


gen_bitfield_struct!(
    /// Charge pump currents
    , [PllIchp, PllOffUp, PllOffDown], ChargePumpCurrent, 5, 0
);


gen_bitfield_struct!(
    /// VCOCAP trim code
    , [PllVcoCap], VcoCap, 6, 0
);


gen_bitfield_enum!(
    /// VTUNE[1:0], VCO tuning voltage comparators
    , [PllVtune], Vtune, 2, 6, {
        /// Tuning voltage inside the window
        Normal = 0,
        /// Tuning voltage below the window, VCOCAP too high
        Low = 1,
        /// Tuning voltage above the window, VCOCAP too low
        High = 2,
    }
);


gen_bitfield_struct!(
    /// LPF bandwidth table index
    , [LpfCtl], LpfBandwidthCode, 4, 2
);

gen_bitfield_flag!(
    /// LPF enable
    , [LpfCtl], LpfEnable, 1
);

gen_bitfield_flag!(
    /// LPF bypass
    , [LpfBypassCtl], LpfBypass, 6
);

gen_bitfield_struct!(
    /// LPF DC offset level, target of the LPF tuning calibration
    , [LpfBypassCtl], LpfDcLevel, 6, 0
);


gen_bitfield_struct!(
    /// DC_REGVAL
    , [DcRegVal], DcValue, 6, 0
);

gen_bitfield_flag!(
    /// DC_CLBR_DONE, active low
    , [DcStatus], DcClbrBusy, 1
);

gen_bitfield_struct!(
    /// DC_CNTVAL
    , [DcCntVal], DcCount, 6, 0
);

gen_bitfield_struct!(
    /// DC_ADDR, submodule address
    , [DcCalCtl], DcAddr, 3, 0
);

gen_bitfield_flag!(
    /// DC_SRESET, active low
    , [DcCalCtl], DcResetN, 3
);

gen_bitfield_flag!(
    /// DC_LOAD strobe
    , [DcCalCtl], DcLoad, 4
);

gen_bitfield_flag!(
    /// DC_START_CLBR strobe
    , [DcCalCtl], DcStartClbr, 5
);
