#![cfg_attr(not(test), no_std)]

//! [LMS6002D](https://limemicro.com/technology/lms6002d/) RF transceiver driver.
//!
//! Analog front-end control: PLL frequency synthesis and VCO tuning, gain
//! stages, loopback paths and DC offset calibration, all through the chip's
//! 8-bit register interface. How register bytes reach the chip is up to the
//! [`interface::RegisterInterface`] implementation handed to [`device::Lms6002d`].

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod constants;
pub mod errors;
pub mod interface;
pub mod register;
pub mod tables;
pub mod device;
pub mod gain;
pub mod frequency;
pub mod synth;
pub mod loopback;
pub mod calibration;

#[cfg(test)]
pub(crate) mod mock;

pub use calibration::{CalModule, DcCals};
pub use device::{Lms6002d, Module};
pub use errors::Error;
pub use frequency::PllFrequency;
pub use gain::{Gain, GainStage};
pub use interface::RegisterInterface;
pub use loopback::Loopback;
