//! Gain stages
//!
//! Every setter clamps into the stage range and returns the gain actually
//! programmed, clamping is never an error.

use crate::constants::*;
use crate::device::Lms6002d;
use crate::errors::*;
use crate::interface::RegisterInterface;
use crate::register::*;
use crate::tables::*;

/// Gain stage selector
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GainStage {
    Lna,
    Rxvga1,
    Rxvga2,
    Txvga1,
    Txvga2,
}

impl GainStage {
    /// Documented dB range, `None` for the enumerated LNA gain
    pub fn range(self: Self) -> Option<(i32, i32)> {
        match self {
            GainStage::Lna => None,
            GainStage::Rxvga1 => Some((RXVGA1_GAIN_MIN, RXVGA1_GAIN_MAX)),
            GainStage::Rxvga2 => Some((RXVGA2_GAIN_MIN, RXVGA2_GAIN_MAX)),
            GainStage::Txvga1 => Some((TXVGA1_GAIN_MIN, TXVGA1_GAIN_MAX)),
            GainStage::Txvga2 => Some((TXVGA2_GAIN_MIN, TXVGA2_GAIN_MAX)),
        }
    }
}

/// Gain of one stage, dB except for the LNA
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    Lna(LnaGain),
    Rxvga1(i32),
    Rxvga2(i32),
    Txvga1(i32),
    Txvga2(i32),
}

impl Gain {
    pub fn stage(self: &Self) -> GainStage {
        match self {
            Gain::Lna(_) => GainStage::Lna,
            Gain::Rxvga1(_) => GainStage::Rxvga1,
            Gain::Rxvga2(_) => GainStage::Rxvga2,
            Gain::Txvga1(_) => GainStage::Txvga1,
            Gain::Txvga2(_) => GainStage::Txvga2,
        }
    }
}

fn clamp_gain(name: &str, gain: i32, min: i32, max: i32) -> i32 {
    let clamped = gain.max(min).min(max);
    if clamped != gain {
        info!("Clamping {} gain to {}dB", name, clamped);
    }
    clamped
}


impl<I> Lms6002d<I>
where I: RegisterInterface,
{
    /// Programs one stage, returns the effective gain
    pub fn set_gain(self: &mut Self, gain: Gain) -> Result<Gain, Error> {
        match gain {
            Gain::Lna(g) => self.set_lna_gain(g).map(|_| Gain::Lna(g)),
            Gain::Rxvga1(g) => self.set_rxvga1_gain(g).map(Gain::Rxvga1),
            Gain::Rxvga2(g) => self.set_rxvga2_gain(g).map(Gain::Rxvga2),
            Gain::Txvga1(g) => self.set_txvga1_gain(g).map(Gain::Txvga1),
            Gain::Txvga2(g) => self.set_txvga2_gain(g).map(Gain::Txvga2),
        }
    }

    pub fn gain(self: &mut Self, stage: GainStage) -> Result<Gain, Error> {
        match stage {
            GainStage::Lna => self.lna_gain().map(Gain::Lna),
            GainStage::Rxvga1 => self.rxvga1_gain().map(Gain::Rxvga1),
            GainStage::Rxvga2 => self.rxvga2_gain().map(Gain::Rxvga2),
            GainStage::Txvga1 => self.txvga1_gain().map(Gain::Txvga1),
            GainStage::Txvga2 => self.txvga2_gain().map(Gain::Txvga2),
        }
    }


    /// LNA gain mode, `Unknown` is rejected
    pub fn set_lna_gain(self: &mut Self, gain: LnaGain) -> Result<(), Error> {
        if gain == LnaGain::Unknown {
            return Err(Error::InvalidArgument);
        }
        self.modify::<LnaCtl, _>(|r| r.set(gain))
    }

    pub fn lna_gain(self: &mut Self) -> Result<LnaGain, Error> {
        match self.load::<LnaCtl>()?.try_get::<LnaGain>()? {
            LnaGain::Unknown => Err(Error::UnexpectedState),
            g => Ok(g),
        }
    }

    /// RXVGA1 gain (RFB_TIA_RXFE mixer), coded through the RXVGA1 table
    pub fn set_rxvga1_gain(self: &mut Self, gain: i32) -> Result<i32, Error> {
        let gain = clamp_gain("RXVGA1", gain, RXVGA1_GAIN_MIN, RXVGA1_GAIN_MAX);
        let code = RXVGA1_LUT_VAL2CODE[gain as usize];
        self.store(Reg::<Rxvga1Gain>::new(0).set(Rxvga1Code(code)))?;
        Ok(gain)
    }

    pub fn rxvga1_gain(self: &mut Self) -> Result<i32, Error> {
        let code = self.load::<Rxvga1Gain>()?.get::<Rxvga1Code>().0;
        let code = code.min(RXVGA1_CODE_MAX);
        Ok(RXVGA1_LUT_CODE2VAL[code as usize] as i32)
    }

    /// RXVGA2 gain, 3 dB per code; requests between steps round down
    pub fn set_rxvga2_gain(self: &mut Self, gain: i32) -> Result<i32, Error> {
        let gain = clamp_gain("RXVGA2", gain, RXVGA2_GAIN_MIN, RXVGA2_GAIN_MAX);
        let code = (gain / RXVGA2_GAIN_STEP) as u8;
        self.store(Reg::<Rxvga2Gain>::new(0).set(Rxvga2Code(code)))?;
        Ok(code as i32 * RXVGA2_GAIN_STEP)
    }

    pub fn rxvga2_gain(self: &mut Self) -> Result<i32, Error> {
        let code = self.load::<Rxvga2Gain>()?.get::<Rxvga2Code>().0 as i32;
        Ok(code.min(RXVGA2_GAIN_MAX / RXVGA2_GAIN_STEP) * RXVGA2_GAIN_STEP)
    }

    /// TXVGA1 gain; register 0x41 holds nothing else, so no read-modify-write
    pub fn set_txvga1_gain(self: &mut Self, gain: i32) -> Result<i32, Error> {
        let gain = clamp_gain("TXVGA1", gain, TXVGA1_GAIN_MIN, TXVGA1_GAIN_MAX);
        self.write(Txvga1Gain::ADDR, (gain + TXVGA1_GAIN_OFFSET) as u8)?;
        Ok(gain)
    }

    pub fn txvga1_gain(self: &mut Self) -> Result<i32, Error> {
        let code = self.load::<Txvga1Gain>()?.get::<Txvga1Code>().0;
        Ok(code as i32 - TXVGA1_GAIN_OFFSET)
    }

    pub fn set_txvga2_gain(self: &mut Self, gain: i32) -> Result<i32, Error> {
        let gain = clamp_gain("TXVGA2", gain, TXVGA2_GAIN_MIN, TXVGA2_GAIN_MAX);
        self.modify::<Txvga2Gain, _>(|r| r.set(Txvga2Code(gain as u8)))?;
        Ok(gain)
    }

    pub fn txvga2_gain(self: &mut Self) -> Result<i32, Error> {
        let code = self.load::<Txvga2Gain>()?.get::<Txvga2Code>().0 as i32;
        Ok(code.min(TXVGA2_GAIN_MAX))
    }
}
