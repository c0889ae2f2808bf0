//! PLL programming and VCO capacitor tuning

use crate::constants::*;
use crate::device::*;
use crate::errors::*;
use crate::frequency::*;
use crate::interface::RegisterInterface;
use crate::register::*;

impl<I> Lms6002d<I>
where I: RegisterInterface,
{
    /// Tunes the PLL of `module` to `hz`, clamped into the tunable range.
    ///
    /// The delta-sigma modulators are switched on for the duration of the
    /// update and always switched off again, even when programming fails.
    pub fn set_frequency(self: &mut Self, module: Module, hz: u32) -> Result<PllFrequency, Error> {
        let hz = clamp_frequency(hz);
        let f = PllFrequency::from_hz(hz);

        debug!("{:?} PLL: x={} nint={} nfrac={} freqsel={:#x}",
               module, f.x, f.nint, f.nfrac, f.freqsel);

        if let Err(e) = self.dsm_enable(true) {
            debug!("Failed to turn on DSMs");
            return Err(e);
        }

        let status = self.program_pll(module, hz, &f);
        let dsm_status = self.dsm_enable(false);

        status.and(dsm_status).map(|_| f)
    }

    /// Divider settings currently programmed into the PLL of `module`
    pub fn get_frequency(self: &mut Self, module: Module) -> Result<PllFrequency, Error> {
        let base = module.pll_base();

        let nint_high = self.load_rel::<PllNint>(base)?.get::<NintHigh>().0;
        let r1 = self.load_rel::<PllNfracHigh>(base)?;
        let mid = self.load_rel::<PllNfracMid>(base)?.get::<NfracByte>().0;
        let low = self.load_rel::<PllNfracLow>(base)?.get::<NfracByte>().0;
        let freqsel = self.load_rel::<PllFreqSel>(base)?.get::<FreqSel>().0;

        Ok(PllFrequency {
            x: vco_divider(freqsel)?,
            nint: (nint_high as u16) << 1 | r1.get::<NintLsb>().0 as u16,
            nfrac: (r1.get::<NfracHigh>().0 as u32) << 16 | (mid as u32) << 8 | low as u32,
            freqsel,
            reference: REFERENCE_HZ,
        })
    }

    /// Frequency currently programmed into the PLL of `module`, Hz
    pub fn frequency_hz(self: &mut Self, module: Module) -> Result<u32, Error> {
        self.get_frequency(module).map(|f| f.to_hz())
    }

    /// Picks the high or low band PA (TX) or LNA (RX) for `hz`.
    /// Does nothing while a loopback is engaged, the PA and LNA stay off.
    pub fn select_band(self: &mut Self, module: Module, hz: u32) -> Result<(), Error> {
        if self.loopback_enabled()? {
            return Ok(());
        }

        let high = hz >= BAND_HIGH;
        match module {
            Module::Tx => self.select_pa(if high { PaSelect::Pa2 } else { PaSelect::Pa1 }),
            Module::Rx => self.select_lna(if high { LnaSelect::Lna2 } else { LnaSelect::Lna1 }),
        }
    }


    fn dsm_enable(self: &mut Self, enable: bool) -> Result<(), Error> {
        self.modify::<ClkEn, _>(|r| r.set(TxDsmClk(enable)).set(RxDsmClk(enable)))
    }

    fn program_pll(self: &mut Self, module: Module, hz: u32, f: &PllFrequency) -> Result<(), Error> {
        let base = module.pll_base();

        self.write_pll_config(base, hz, f.freqsel)?;

        self.store_rel(base, Reg::<PllNint>::new(0)
                       .set(NintHigh((f.nint >> 1) as u8)))?;
        self.store_rel(base, Reg::<PllNfracHigh>::new(0)
                       .set(NintLsb((f.nint & 1) as u8))
                       .set(NfracHigh((f.nfrac >> 16) as u8)))?;
        self.store_rel(base, Reg::<PllNfracMid>::new(0)
                       .set(NfracByte((f.nfrac >> 8) as u8)))?;
        self.store_rel(base, Reg::<PllNfracLow>::new(0)
                       .set(NfracByte(f.nfrac as u8)))?;

        self.modify_rel::<PllIchp, _>(base, |r| r.set(ChargePumpCurrent(PLL_ICHP)))?;
        self.modify_rel::<PllOffUp, _>(base, |r| r.set(ChargePumpCurrent(PLL_OFFUP)))?;
        self.modify_rel::<PllOffDown, _>(base, |r| r.set(ChargePumpCurrent(PLL_OFFDOWN)))?;

        self.tune_vcocap(base)
    }

    /// FREQSEL and the PLL output buffer. The buffer selection belongs to the
    /// RF loopback while one is engaged.
    fn write_pll_config(self: &mut Self, base: u8, hz: u32, freqsel: u8) -> Result<(), Error> {
        let r = self.load_rel::<PllFreqSel>(base)?;

        let r = if self.loopback_enabled()? {
            r.set(FreqSel(freqsel))
        } else {
            let selout = if hz < BAND_HIGH { 1 } else { 2 };
            Reg::new(0).set(FreqSel(freqsel)).set(SelOut(selout))
        };

        self.store_rel(base, r)
    }

    /// Writes a VCOCAP code and reads back the VTUNE comparators
    fn vtune_at(self: &mut Self, base: u8, cap: Reg<PllVcoCap>, code: u8) -> Result<Vtune, Error> {
        self.store_rel(base, cap.set(VcoCap(code)))?;

        let r = self.load_rel::<PllVtune>(base)?;
        r.try_get::<Vtune>().map_err(|e| {
            error!("Invalid VTUNE value encountered: {:#x}", r.w >> 6);
            e
        })
    }

    /// Finds the VCOCAP code in the middle of the range where VTUNE reads
    /// normal: binary search for any locked code, then linear scans for
    /// both edges of the locked range.
    fn tune_vcocap(self: &mut Self, base: u8) -> Result<(), Error> {
        let cap = self.load_rel::<PllVcoCap>(base)?;

        let mut vcocap = VCOCAP_START;
        let mut step = VCOCAP_START >> 1;
        let mut vtune = Vtune::High;

        for _ in 0 .. VCOCAP_MAX_ITERATIONS {
            vtune = self.vtune_at(base, cap, vcocap)?;
            match vtune {
                Vtune::Normal => {
                    trace!("Found normal at VCOCAP: {}", vcocap);
                    break;
                }
                Vtune::High => {
                    trace!("Too high: {} -> {}", vcocap, vcocap + step);
                    vcocap += step;
                }
                Vtune::Low => {
                    trace!("Too low: {} -> {}", vcocap, vcocap - step);
                    vcocap -= step;
                }
            }
            step >>= 1;
        }

        if vtune != Vtune::Normal {
            debug!("VTUNE is not locked at the end of initial loop");
            return Err(Error::UnexpectedState);
        }

        let mut start = vcocap;
        while start > 0 {
            if self.vtune_at(base, cap, start - 1)? == Vtune::High {
                break;
            }
            start -= 1;
        }
        trace!("Found lower limit VCOCAP: {}", start);

        // Back to the converged code before scanning up
        let mut stop = vcocap;
        let mut vtune = self.vtune_at(base, cap, vcocap)?;
        while stop < VCOCAP_MAX && vtune != Vtune::Low {
            vtune = self.vtune_at(base, cap, stop + 1)?;
            if vtune != Vtune::Low {
                stop += 1;
            }
        }
        trace!("Found upper limit VCOCAP: {}", stop);

        vcocap = (start + stop) / 2;
        debug!("Goldilocks VCOCAP: {}", vcocap);

        match self.vtune_at(base, cap, vcocap)? {
            Vtune::Normal => Ok(()),
            vtune => {
                warn!("VCOCAP could not converge and VTUNE is not locked - {:?}", vtune);
                Err(Error::UnexpectedState)
            }
        }
    }
}
