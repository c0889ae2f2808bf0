//! Loopback paths
//!
//! A loopback is configured in three places: the path switches (0x08 and
//! 0x46), the RX side blocks and the TX side blocks. Transitions always go
//! through a quiesced state with both PA and LNA deselected and every path
//! switch open.

use core::convert::TryFrom;

use crate::device::*;
use crate::errors::*;
use crate::interface::RegisterInterface;
use crate::register::*;

/// Baseband loopback source
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BbSource {
    /// TX LPF output
    TxLpf,
    /// TXVGA1 output
    TxVga1,
}

/// Baseband loopback destination
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BbDest {
    /// RXVGA2 input, RX LPF disabled
    RxVga2,
    /// RX LPF input, RXVGA1 disabled
    RxLpf,
}

/// LNA path receiving the TX mixer output in RF loopback
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RfLna {
    Lna1,
    Lna2,
    Lna3,
}

impl RfLna {
    /// LBRFEN code, also the RX PLL output buffer feeding that LNA
    fn code(self: Self) -> u8 {
        match self {
            RfLna::Lna1 => 1,
            RfLna::Lna2 => 2,
            RfLna::Lna3 => 3,
        }
    }

    fn lna(self: Self) -> LnaSelect {
        match self {
            RfLna::Lna1 => LnaSelect::Lna1,
            RfLna::Lna2 => LnaSelect::Lna2,
            RfLna::Lna3 => LnaSelect::Lna3,
        }
    }
}

/// Loopback mode
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Loopback {
    /// Normal operation
    None,
    /// TX baseband looped into the RX baseband chain
    Baseband { source: BbSource, dest: BbDest },
    /// TX mixer output looped into one of the LNA paths
    Rf(RfLna),
}

impl Loopback {
    /// Every mode, in raw code order
    pub const ALL: [Loopback; 8] = [
        Loopback::None,
        Loopback::Baseband { source: BbSource::TxLpf, dest: BbDest::RxVga2 },
        Loopback::Baseband { source: BbSource::TxLpf, dest: BbDest::RxLpf },
        Loopback::Baseband { source: BbSource::TxVga1, dest: BbDest::RxVga2 },
        Loopback::Baseband { source: BbSource::TxVga1, dest: BbDest::RxLpf },
        Loopback::Rf(RfLna::Lna1),
        Loopback::Rf(RfLna::Lna2),
        Loopback::Rf(RfLna::Lna3),
    ];
}

impl TryFrom<u8> for Loopback {
    type Error = Error;

    fn try_from(x: u8) -> Result<Self, Error> {
        Loopback::ALL.get(x as usize).copied().ok_or(Error::InvalidArgument)
    }
}

impl From<Loopback> for u8 {
    fn from(mode: Loopback) -> u8 {
        Loopback::ALL.iter().position(|m| *m == mode).unwrap_or(0) as u8
    }
}


impl<I> Lms6002d<I>
where I: RegisterInterface,
{
    /// Switches to loopback `mode`, or back to normal operation.
    ///
    /// Leaving loopback re-programs both PLLs at their current frequency and
    /// re-selects the PA and LNA for it.
    pub fn set_loopback(self: &mut Self, mode: Loopback) -> Result<(), Error> {
        debug!("Setting loopback mode {:?}", mode);

        self.select_pa(PaSelect::None)?;
        self.select_lna(LnaSelect::None)?;

        self.loopback_path(Loopback::None)?;
        self.loopback_rx(mode)?;
        self.loopback_tx(mode)?;
        self.loopback_path(mode)
    }

    /// Decodes the loopback mode from the path switches.
    /// RF loopback takes priority; unrecognised combinations read as `None`.
    pub fn loopback(self: &mut Self) -> Result<Loopback, Error> {
        let lb = self.load::<LoopbackCtl>()?;
        let bb = self.load::<BbLoopCtl>()?;

        let rf = match lb.get::<LbRfEn>().0 & 0x7 {
            1 => Some(RfLna::Lna1),
            2 => Some(RfLna::Lna2),
            3 => Some(RfLna::Lna3),
            _ => None,
        };
        if let Some(lna) = rf {
            return Ok(Loopback::Rf(lna));
        }

        let dest = match (lb.get::<LbenOpin>().0, lb.get::<LbenVga2In>().0, lb.get::<LbenLpfIn>().0) {
            (false, true, false) => BbDest::RxVga2,
            (false, false, true) => BbDest::RxLpf,
            _ => return Ok(Loopback::None),
        };

        let source = match bb.try_get::<LoopBbEn>()? {
            LoopBbEn::TxLpf | LoopBbEn::EnvPeak => BbSource::TxLpf,
            LoopBbEn::TxVga1 => BbSource::TxVga1,
            LoopBbEn::Open => return Ok(Loopback::None),
        };

        Ok(Loopback::Baseband { source, dest })
    }

    pub fn loopback_enabled(self: &mut Self) -> Result<bool, Error> {
        self.loopback().map(|m| m != Loopback::None)
    }


    /// Path switches, baseband and RF loopback enables
    fn loopback_path(self: &mut Self, mode: Loopback) -> Result<(), Error> {
        let bb = self.load::<BbLoopCtl>()?.set(LoopBbEn::Open);
        let lb = self.load::<LoopbackCtl>()?
            .set(LbRfEn(0))
            .set(LbenOpin(false))
            .set(LbenVga2In(false))
            .set(LbenLpfIn(false));

        let (bb, lb) = match mode {
            Loopback::None => (bb, lb),
            Loopback::Baseband { source, dest } => {
                let bb = match source {
                    BbSource::TxLpf => bb.set(LoopBbEn::TxLpf),
                    BbSource::TxVga1 => bb.set(LoopBbEn::TxVga1),
                };
                let lb = match dest {
                    BbDest::RxVga2 => lb.set(LbenVga2In(true)),
                    BbDest::RxLpf => lb.set(LbenLpfIn(true)),
                };
                (bb, lb)
            }
            Loopback::Rf(lna) => (bb, lb.set(LbRfEn(lna.code()))),
        };

        self.store(bb)?;
        self.store(lb)
    }

    fn loopback_rx(self: &mut Self, mode: Loopback) -> Result<(), Error> {
        let lpf_disabled = self.lpf_mode(Module::Rx)? == LpfMode::Disabled;

        match mode {
            Loopback::Baseband { dest: BbDest::RxVga2, .. } => {
                self.rxvga2_enable(true)?;
                self.set_lpf_mode(Module::Rx, LpfMode::Disabled)?;
            }

            Loopback::Baseband { dest: BbDest::RxLpf, .. } => {
                self.rxvga1_enable(false)?;
                if lpf_disabled {
                    self.set_lpf_mode(Module::Rx, LpfMode::Normal)?;
                }
                self.rxvga2_enable(true)?;
            }

            Loopback::Rf(lna) => {
                self.lna_power(false)?;
                self.rxvga1_enable(true)?;
                if lpf_disabled {
                    self.set_lpf_mode(Module::Rx, LpfMode::Normal)?;
                }
                self.rxvga2_enable(true)?;

                // RX PLL output buffer feeds the looped back LNA
                self.modify_rel::<PllFreqSel, _>(Module::Rx.pll_base(), |r| r.set(SelOut(lna.code())))?;
                self.select_lna(lna.lna())?;

                self.rf_loopback_switch(true)?;
            }

            Loopback::None => {
                self.rxvga1_enable(true)?;
                if lpf_disabled {
                    self.set_lpf_mode(Module::Rx, LpfMode::Normal)?;
                }
                self.rxvga2_enable(true)?;

                self.rf_loopback_switch(false)?;
                self.lna_power(true)?;

                self.restore_band(Module::Rx)?;
            }
        }

        Ok(())
    }

    fn loopback_tx(self: &mut Self, mode: Loopback) -> Result<(), Error> {
        match mode {
            Loopback::Baseband { .. } => Ok(()),
            Loopback::Rf(_) => self.select_pa(PaSelect::Aux),
            Loopback::None => self.restore_band(Module::Tx),
        }
    }

    /// Re-applies the programmed frequency and its PA/LNA selection
    fn restore_band(self: &mut Self, module: Module) -> Result<(), Error> {
        let hz = self.frequency_hz(module)?;
        self.set_frequency(module, hz)?;
        self.select_band(module, hz)
    }
}
