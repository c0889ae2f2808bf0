//! Simulated register file for unit tests
//!
//! Plain memory for most registers, plus just enough chip behaviour for the
//! closed loop algorithms: VTUNE comparators derived from the programmed
//! VCOCAP and DC calibration blocks that finish after a configurable number
//! of polls.

use std::collections::VecDeque;

use embedded_hal::blocking::delay::DelayUs;

use crate::interface::RegisterInterface;

/// DC calibration result when nothing is scripted, also the power-on value
pub const DEFAULT_DC_VALUE: u8 = 17;

const DC_BLOCKS: [u8; 4] = [0x00, 0x30, 0x50, 0x60];

#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum Access {
    Read(u8),
    Write(u8, u8),
}

/// Injected transport failure
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub struct MockFault;

#[derive(Debug,Copy,Clone)]
struct DcRun {
    addr: u8,
    result: u8,
    busy_polls: Option<u32>,
}

pub struct MockRegisters {
    pub regs: [u8; 128],
    /// Successful accesses, in order
    pub log: Vec<Access>,

    pub fail_read: Option<u8>,
    pub fail_write: Option<u8>,

    /// VCOCAP codes with VTUNE in the window; below reads high, above low
    pub vco_window: Option<(u8, u8)>,
    /// Raw VTUNE register values, used before `vco_window`
    pub vtune_script: VecDeque<u8>,

    /// "Busy" polls before a DC calibration finishes, `None` never finishes
    pub dc_busy_polls: Option<u32>,
    /// Results of successive DC calibration starts
    pub dc_results: VecDeque<u8>,
    pub dc_starts: usize,

    dc_values: [[u8; 8]; 4],
    dc_runs: [Option<DcRun>; 4],
}

impl MockRegisters {
    pub fn new() -> Self {
        let mut regs = [0u8; 128];

        // LNA1 at max gain
        regs[0x75] = 0xd0;
        // both PLLs in a valid FREQSEL band, low band buffer
        regs[0x15] = (0x25 << 2) | 1;
        regs[0x25] = (0x25 << 2) | 1;

        MockRegisters {
            regs,
            log: Vec::new(),
            fail_read: None,
            fail_write: None,
            vco_window: Some((16, 48)),
            vtune_script: VecDeque::new(),
            dc_busy_polls: Some(0),
            dc_results: VecDeque::new(),
            dc_starts: 0,
            dc_values: [[DEFAULT_DC_VALUE; 8]; 4],
            dc_runs: [None; 4],
        }
    }

    /// Values written to `addr`, in order
    pub fn writes_to(&self, addr: u8) -> impl Iterator<Item = u8> + '_ {
        self.writes().filter(move |(a, _)| *a == addr).map(|(_, v)| v)
    }

    pub fn writes(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.log.iter().filter_map(|a| match a {
            Access::Write(addr, v) => Some((*addr, *v)),
            Access::Read(_) => None,
        })
    }

    /// DC calibration block and register offset
    fn dc_block(addr: u8) -> Option<(usize, u8)> {
        let offset = addr & 0x0f;
        if offset > 3 {
            return None;
        }
        DC_BLOCKS.iter()
            .position(|b| *b == addr & 0xf0)
            .map(|i| (i, offset))
    }

    fn vtune(&mut self, addr: u8) -> u8 {
        if let Some(v) = self.vtune_script.pop_front() {
            return v;
        }

        match self.vco_window {
            Some((lo, hi)) => {
                let code = self.regs[(addr - 1) as usize] & 0x3f;
                if code < lo {
                    0x80
                } else if code > hi {
                    0x40
                } else {
                    0x00
                }
            }
            None => self.regs[addr as usize],
        }
    }

    fn dc_status(&mut self, block: usize) -> u8 {
        match self.dc_runs[block] {
            None => 0x00,
            Some(DcRun { busy_polls: None, .. }) => 0x02,
            Some(DcRun { addr, result, busy_polls: Some(0) }) => {
                self.dc_values[block][addr as usize] = result & 0x3f;
                self.dc_runs[block] = None;
                0x00
            }
            Some(mut run) => {
                run.busy_polls = run.busy_polls.map(|n| n - 1);
                self.dc_runs[block] = Some(run);
                0x02
            }
        }
    }

    fn dc_control(&mut self, block: usize, value: u8) {
        let base = DC_BLOCKS[block] as usize;
        let addr = value & 0x07;

        if value & 0x10 != 0 {
            self.dc_values[block][addr as usize] = self.regs[base + 2] & 0x3f;
        }

        if value & 0x20 != 0 {
            self.dc_starts += 1;
            let result = self.dc_results.pop_front().unwrap_or(DEFAULT_DC_VALUE);
            self.dc_runs[block] = Some(DcRun { addr, result, busy_polls: self.dc_busy_polls });
        }
    }
}

impl RegisterInterface for MockRegisters {
    type Error = MockFault;

    fn read_register(&mut self, addr: u8) -> Result<u8, MockFault> {
        if self.fail_read == Some(addr) {
            return Err(MockFault);
        }
        self.log.push(Access::Read(addr));

        let v = match (addr, Self::dc_block(addr)) {
            (0x1a, _) | (0x2a, _) => self.vtune(addr),
            (_, Some((block, 0))) => {
                let sel = self.regs[DC_BLOCKS[block] as usize + 3] & 0x07;
                self.dc_values[block][sel as usize]
            }
            (_, Some((block, 1))) => self.dc_status(block),
            _ => self.regs[addr as usize],
        };

        Ok(v)
    }

    fn write_register(&mut self, addr: u8, value: u8) -> Result<(), MockFault> {
        if self.fail_write == Some(addr) {
            return Err(MockFault);
        }
        self.log.push(Access::Write(addr, value));
        self.regs[addr as usize] = value;

        if let Some((block, 3)) = Self::dc_block(addr) {
            self.dc_control(block, value);
        }

        Ok(())
    }
}


pub struct NoDelay;

impl DelayUs<u16> for NoDelay {
    fn delay_us(&mut self, _us: u16) {}
}

#[derive(Debug,Default)]
pub struct CountingDelay {
    pub calls: u32,
    pub total_us: u32,
}

impl DelayUs<u16> for CountingDelay {
    fn delay_us(&mut self, us: u16) {
        self.calls += 1;
        self.total_us += us as u32;
    }
}
