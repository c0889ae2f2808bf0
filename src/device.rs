//! LMS6002D device context, register access and subsystem control

use core::convert::TryFrom;

use crate::errors::*;
use crate::interface::RegisterInterface;
use crate::register::*;
use crate::tables::*;

/// Highest register address
pub const ADDR_MAX: u8 = 0x7f;

/// TX or RX half of the transceiver
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Module {
    Rx,
    Tx,
}

impl Module {
    /// PLL register block base
    #[inline]
    pub fn pll_base(self: Self) -> u8 {
        match self {
            Module::Tx => 0x10,
            Module::Rx => 0x20,
        }
    }

    /// LPF register block base
    #[inline]
    pub fn lpf_base(self: Self) -> u8 {
        match self {
            Module::Tx => 0x30,
            Module::Rx => 0x50,
        }
    }
}

impl TryFrom<u8> for Module {
    type Error = Error;

    fn try_from(x: u8) -> Result<Self, Error> {
        match x {
            0 => Ok(Module::Rx),
            1 => Ok(Module::Tx),
            _ => Err(Error::InvalidArgument),
        }
    }
}

/// Power amplifier selection, at most one is powered
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PaSelect {
    None,
    Aux,
    Pa1,
    Pa2,
}

impl TryFrom<u8> for PaSelect {
    type Error = Error;

    fn try_from(x: u8) -> Result<Self, Error> {
        match x {
            0 => Ok(PaSelect::None),
            1 => Ok(PaSelect::Aux),
            2 => Ok(PaSelect::Pa1),
            3 => Ok(PaSelect::Pa2),
            _ => Err(Error::InvalidArgument),
        }
    }
}

/// LPF operating mode, encoded across the LPF enable and bypass bits
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LpfMode {
    /// Enabled, not bypassed
    Normal,
    /// Powered down and bypassed
    Bypassed,
    /// Powered down, not bypassed
    Disabled,
}

impl TryFrom<u8> for LpfMode {
    type Error = Error;

    fn try_from(x: u8) -> Result<Self, Error> {
        match x {
            0 => Ok(LpfMode::Normal),
            1 => Ok(LpfMode::Bypassed),
            2 => Ok(LpfMode::Disabled),
            _ => Err(Error::InvalidArgument),
        }
    }
}

/// ADC input source
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sampling {
    /// RXVGA2 drives the ADC
    Internal,
    /// External pins drive the ADC, RXVGA2 is off
    External,
    /// Inconsistent register combination
    Unknown,
}

impl TryFrom<u8> for Sampling {
    type Error = Error;

    fn try_from(x: u8) -> Result<Self, Error> {
        match x {
            0 => Ok(Sampling::Internal),
            1 => Ok(Sampling::External),
            _ => Err(Error::InvalidArgument),
        }
    }
}

/// Register values read by [`Lms6002d::dump_registers`]
#[derive(Debug,Copy,Clone)]
pub struct RegisterDump {
    values: [u8; REGISTER_DUMP_LEN],
}

impl RegisterDump {
    /// `(group name, address, value)` in dump order
    pub fn iter(self: &Self) -> impl Iterator<Item = (&'static str, u8, u8)> + '_ {
        dump_addrs()
            .zip(self.values.iter())
            .map(|((group, addr), v)| (group, addr, *v))
    }

    /// Value of `addr`, if it is part of the dump
    pub fn get(self: &Self, addr: u8) -> Option<u8> {
        self.iter().find(|(_, a, _)| *a == addr).map(|(_, _, v)| v)
    }
}


/// LMS6002D device.
///
/// Owns the register transport. Every operation is a blocking sequence of
/// register transactions with no cross-register atomicity; callers sharing a
/// device between threads must hold their own lock for the duration of each
/// call.
pub struct Lms6002d<I> {
    iface: I,
}

impl<I> Lms6002d<I>
where I: RegisterInterface,
{
    /// Creates the device, nothing is written.
    pub fn new(iface: I) -> Self {
        Lms6002d { iface }
    }

    /// Gives the transport back
    pub fn release(self: Self) -> I {
        self.iface
    }

    pub fn interface(self: &mut Self) -> &mut I {
        &mut self.iface
    }

    /// Reads one register
    pub fn read(self: &mut Self, addr: u8) -> Result<u8, Error> {
        if addr > ADDR_MAX {
            return Err(Error::InvalidArgument);
        }
        self.iface.read_register(addr).map_err(|_| Error::Io)
    }

    /// Writes one register
    pub fn write(self: &mut Self, addr: u8, value: u8) -> Result<(), Error> {
        if addr > ADDR_MAX {
            return Err(Error::InvalidArgument);
        }
        trace!("LMS[{:#x}] <- {:#x}", addr, value);
        self.iface.write_register(addr, value).map_err(|_| Error::Io)
    }

    /// Read-modify-write, sets `mask` bits
    pub fn set_bits(self: &mut Self, addr: u8, mask: u8) -> Result<(), Error> {
        let v = self.read(addr)?;
        self.write(addr, v | mask)
    }

    /// Read-modify-write, clears `mask` bits
    pub fn clear_bits(self: &mut Self, addr: u8, mask: u8) -> Result<(), Error> {
        let v = self.read(addr)?;
        self.write(addr, v & !mask)
    }

    #[inline]
    pub(crate) fn load<R: Register>(self: &mut Self) -> Result<Reg<R>, Error> {
        self.read(R::ADDR).map(Reg::new)
    }

    #[inline]
    pub(crate) fn store<R: Register>(self: &mut Self, r: Reg<R>) -> Result<(), Error> {
        self.write(R::ADDR, r.w)
    }

    #[inline]
    pub(crate) fn modify<R, F>(self: &mut Self, f: F) -> Result<(), Error>
    where R: Register,
          F: FnOnce(Reg<R>) -> Reg<R>,
    {
        let r = self.load::<R>()?;
        self.store(f(r))
    }

    #[inline]
    pub(crate) fn load_rel<R: Relative>(self: &mut Self, base: u8) -> Result<Reg<R>, Error> {
        self.read(base + R::OFFSET).map(Reg::new)
    }

    #[inline]
    pub(crate) fn store_rel<R: Relative>(self: &mut Self, base: u8, r: Reg<R>) -> Result<(), Error> {
        self.write(base + R::OFFSET, r.w)
    }

    #[inline]
    pub(crate) fn modify_rel<R, F>(self: &mut Self, base: u8, f: F) -> Result<(), Error>
    where R: Relative,
          F: FnOnce(Reg<R>) -> Reg<R>,
    {
        let r = self.load_rel::<R>(base)?;
        self.store_rel(base, f(r))
    }


    /// Soft reset of the whole chip
    pub fn soft_reset(self: &mut Self) -> Result<(), Error> {
        let r = Reg::<TopCtl>::new(0).set(ChipEnable(true)).set(SpiFourWire(true));
        self.store(r.set(SoftResetN(false)))?;
        self.store(r.set(SoftResetN(true)))
    }

    /// Top level power down
    pub fn power_down(self: &mut Self) -> Result<(), Error> {
        self.modify::<TopCtl, _>(|r| r.set(ChipEnable(false)))
    }

    /// RX subsystem enable
    pub fn rx_enable(self: &mut Self, enable: bool) -> Result<(), Error> {
        self.modify::<TopCtl, _>(|r| r.set(RxEnable(enable)))
    }

    /// TX subsystem enable
    pub fn tx_enable(self: &mut Self, enable: bool) -> Result<(), Error> {
        self.modify::<TopCtl, _>(|r| r.set(TxEnable(enable)))
    }

    /// TX RF front end or RX front end enable
    pub fn enable_rffe(self: &mut Self, module: Module, enable: bool) -> Result<(), Error> {
        match module {
            Module::Tx => self.modify::<TxRfCtl, _>(|r| r.set(TxRfEnable(enable))),
            Module::Rx => self.modify::<RxFeCtl, _>(|r| r.set(RxFeEnable(enable))),
        }
    }

    /// PLL enable
    pub fn pll_enable(self: &mut Self, module: Module, enable: bool) -> Result<(), Error> {
        self.modify_rel::<PllCtl, _>(module.pll_base(), |r| r.set(PllEnable(enable)))
    }

    /// DSM dither on the PLL of `module`, `nbits` from 1 to 8
    pub fn dither_enable(self: &mut Self, module: Module, nbits: u8, enable: bool) -> Result<(), Error> {
        if !(1 ..= 8).contains(&nbits) {
            return Err(Error::InvalidArgument);
        }

        self.modify_rel::<PllCtl, _>(module.pll_base(), |r| {
            if enable {
                r.set(DitherEnable(true)).set(DitherBits(nbits - 1))
            } else {
                r.set(DitherEnable(false))
            }
        })
    }

    /// RXVGA1 enable.
    /// The enable bit is in a reserved register, documented on the
    /// limemicro-opensource list.
    pub fn rxvga1_enable(self: &mut Self, enable: bool) -> Result<(), Error> {
        self.modify::<RxFePower, _>(|r| r.set(Rxvga1PowerDown(!enable)))
    }

    /// RXVGA2 enable
    pub fn rxvga2_enable(self: &mut Self, enable: bool) -> Result<(), Error> {
        self.modify::<Rxvga2Ctl, _>(|r| r.set(Rxvga2Enable(enable)))
    }

    /// LNA power, through the test register and the LNA decode bit
    pub fn lna_power(self: &mut Self, enable: bool) -> Result<(), Error> {
        self.modify::<RxFePower, _>(|r| r.set(LnaPowerDown(!enable)))?;
        self.modify::<RxFeCtl, _>(|r| r.set(LnaDecodePowerDown(!enable)))
    }

    /// RF loopback switch power
    pub fn rf_loopback_switch(self: &mut Self, enable: bool) -> Result<(), Error> {
        self.modify::<RfLoopSwitch, _>(|r| r.set(LoopbackSwitch(enable)))
    }

    /// Envelope/peak detector power
    pub fn peakdetect_enable(self: &mut Self, enable: bool) -> Result<(), Error> {
        self.modify::<PaCtl, _>(|r| r.set(PeakDetectPowerDown(!enable)))
    }

    /// Selects one PA, or none. The other PAs are powered down.
    pub fn select_pa(self: &mut Self, pa: PaSelect) -> Result<(), Error> {
        self.modify::<PaCtl, _>(|r| {
            let r = r.set(PaEn(0)).set(AuxPaPowerDown(true));
            match pa {
                PaSelect::Aux => r.set(AuxPaPowerDown(false)),
                PaSelect::Pa1 => r.set(PaEn(0b010)),
                PaSelect::Pa2 => r.set(PaEn(0b100)),
                PaSelect::None => r,
            }
        })
    }

    /// Currently selected PA
    pub fn pa(self: &mut Self) -> Result<PaSelect, Error> {
        let r = self.load::<PaCtl>()?;
        let aux_off = r.get::<AuxPaPowerDown>().0;

        match (r.get::<PaEn>().0, aux_off) {
            (0, true) => Ok(PaSelect::None),
            (0, false) => Ok(PaSelect::Aux),
            (0b010, true) => Ok(PaSelect::Pa1),
            (0b100, true) => Ok(PaSelect::Pa2),
            (pa_en, _) => {
                debug!("Invalid PA configuration: PA_EN={}, AUX PD={}", pa_en, aux_off);
                Err(Error::UnexpectedState)
            }
        }
    }

    /// Selects the active LNA
    pub fn select_lna(self: &mut Self, lna: LnaSelect) -> Result<(), Error> {
        self.modify::<LnaCtl, _>(|r| r.set(lna))
    }

    /// Currently selected LNA
    pub fn lna(self: &mut Self) -> Result<LnaSelect, Error> {
        self.load::<LnaCtl>()?.try_get()
    }


    /// LPF enable, switches a bypassed LPF back to normal operation
    pub fn lpf_enable(self: &mut Self, module: Module, enable: bool) -> Result<(), Error> {
        let base = module.lpf_base();
        self.modify_rel::<LpfCtl, _>(base, |r| r.set(LpfEnable(enable)))?;

        let bypass = self.load_rel::<LpfBypassCtl>(base)?;
        if bypass.get::<LpfBypass>().0 {
            self.store_rel(base, bypass.set(LpfBypass(false)))?;
        }
        Ok(())
    }

    pub fn lpf_mode(self: &mut Self, module: Module) -> Result<LpfMode, Error> {
        let base = module.lpf_base();
        let ctl = self.load_rel::<LpfCtl>(base)?;
        let bypass = self.load_rel::<LpfBypassCtl>(base)?;

        match (ctl.get::<LpfEnable>().0, bypass.get::<LpfBypass>().0) {
            (true, false) => Ok(LpfMode::Normal),
            (false, true) => Ok(LpfMode::Bypassed),
            (false, false) => Ok(LpfMode::Disabled),
            (true, true) => {
                debug!("Invalid LPF configuration: {:#x}, {:#x}", ctl.w, bypass.w);
                Err(Error::UnexpectedState)
            }
        }
    }

    pub fn set_lpf_mode(self: &mut Self, module: Module, mode: LpfMode) -> Result<(), Error> {
        let base = module.lpf_base();
        let ctl = self.load_rel::<LpfCtl>(base)?;
        let bypass = self.load_rel::<LpfBypassCtl>(base)?;

        let (enable, bypassed) = match mode {
            LpfMode::Normal => (true, false),
            LpfMode::Bypassed => (false, true),
            LpfMode::Disabled => (false, false),
        };

        self.store_rel(base, ctl.set(LpfEnable(enable)))?;
        self.store_rel(base, bypass.set(LpfBypass(bypassed)))
    }

    pub fn set_bandwidth(self: &mut Self, module: Module, bw: LpfBandwidth) -> Result<(), Error> {
        self.modify_rel::<LpfCtl, _>(module.lpf_base(), |r| r.set(LpfBandwidthCode(bw.code())))
    }

    pub fn bandwidth(self: &mut Self, module: Module) -> Result<LpfBandwidth, Error> {
        let r = self.load_rel::<LpfCtl>(module.lpf_base())?;
        Ok(LpfBandwidth::from_code(r.get::<LpfBandwidthCode>().0))
    }

    /// Selects the narrowest LPF passing `hz`, returns the selected bandwidth
    pub fn set_bandwidth_hz(self: &mut Self, module: Module, hz: u32) -> Result<LpfBandwidth, Error> {
        let bw = LpfBandwidth::from_hz(hz);
        self.set_bandwidth(module, bw)?;
        Ok(bw)
    }


    /// Connects the ADC to RXVGA2 (internal) or to the external pins
    pub fn set_sampling(self: &mut Self, sampling: Sampling) -> Result<(), Error> {
        match sampling {
            Sampling::Internal => {
                self.modify::<ClkEn, _>(|r| r.set(ExternalAdcInput(false)))?;
                self.rxvga2_enable(true)
            }
            Sampling::External => {
                self.rxvga2_enable(false)?;
                self.modify::<ClkEn, _>(|r| r.set(ExternalAdcInput(true)))
            }
            Sampling::Unknown => Err(Error::InvalidArgument),
        }
    }

    pub fn sampling(self: &mut Self) -> Result<Sampling, Error> {
        let external = self.load::<ClkEn>()?.get::<ExternalAdcInput>().0;
        let rxvga2_on = self.load::<Rxvga2Ctl>()?.get::<Rxvga2Enable>().0;

        Ok(match (external, rxvga2_on) {
            (false, true) => Sampling::Internal,
            (true, false) => Sampling::External,
            _ => Sampling::Unknown,
        })
    }


    /// Reads every documented register
    pub fn dump_registers(self: &mut Self) -> Result<RegisterDump, Error> {
        let mut values = [0u8; REGISTER_DUMP_LEN];

        for ((_, addr), v) in dump_addrs().zip(values.iter_mut()) {
            match self.read(addr) {
                Ok(x) => {
                    debug!("LMS[{:#x}] = {:#x}", addr, x);
                    *v = x;
                }
                Err(e) => {
                    debug!("Failed to read LMS @ {:#x}", addr);
                    return Err(e);
                }
            }
        }

        Ok(RegisterDump { values })
    }
}
