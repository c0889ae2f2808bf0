//! DC offset calibration
//!
//! Each calibration block (LPF tuning, TX LPF, RX LPF, RXVGA2) has the same
//! four register layout at its base address:
//! * +0 DC_REGVAL, result of the addressed submodule
//! * +1 status, DC_CLBR_DONE is active low in bit 1
//! * +2 DC_CNTVAL, value to load
//! * +3 control: DC_ADDR, DC_SRESET, DC_LOAD and DC_START_CLBR
//!
//! The RXVGA2 sequence follows Lime's "Improving RxVGA2 DC Offset Calibration
//! Stability" note; its submodules must run in increasing order.

use core::convert::TryFrom;

use embedded_hal::blocking::delay::DelayUs;

use crate::constants::*;
use crate::device::Lms6002d;
use crate::errors::*;
use crate::interface::RegisterInterface;
use crate::register::*;

/// Calibration target
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalModule {
    LpfTuning,
    TxLpf,
    RxLpf,
    Rxvga2,
}

impl CalModule {
    pub const ALL: [CalModule; 4] = [
        CalModule::LpfTuning, CalModule::TxLpf, CalModule::RxLpf, CalModule::Rxvga2,
    ];

    /// Calibration block base address
    pub fn base(self: Self) -> u8 {
        match self {
            CalModule::LpfTuning => 0x00,
            CalModule::TxLpf => 0x30,
            CalModule::RxLpf => 0x50,
            CalModule::Rxvga2 => 0x60,
        }
    }

    /// Number of submodules, calibrated in increasing address order
    pub fn submodules(self: Self) -> u8 {
        match self {
            CalModule::LpfTuning => 1,
            CalModule::TxLpf => 2,
            CalModule::RxLpf => 2,
            CalModule::Rxvga2 => 5,
        }
    }

    /// Calibration clock enable in CLK_EN
    fn clock(self: Self, r: Reg<ClkEn>, enable: bool) -> Reg<ClkEn> {
        match self {
            CalModule::LpfTuning => r.set(LpfCalClk(enable)),
            CalModule::TxLpf => r.set(TxLpfDcCalClk(enable)),
            CalModule::RxLpf => r.set(RxLpfDcCalClk(enable)),
            CalModule::Rxvga2 => r.set(Rxvga2DcCalClk(enable)),
        }
    }

    /// Calibrated with the RX front end terminated and at max gain
    fn uses_rx_frontend(self: Self) -> bool {
        match self {
            CalModule::RxLpf | CalModule::Rxvga2 => true,
            CalModule::LpfTuning | CalModule::TxLpf => false,
        }
    }
}

impl TryFrom<u8> for CalModule {
    type Error = Error;

    fn try_from(x: u8) -> Result<Self, Error> {
        CalModule::ALL.get(x as usize).copied().ok_or(Error::InvalidArgument)
    }
}


/// Raw DC calibration values, `None` leaves a value untouched on write
#[derive(Debug,Default,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DcCals {
    pub lpf_tuning: Option<u8>,
    pub tx_lpf_i: Option<u8>,
    pub tx_lpf_q: Option<u8>,
    pub rx_lpf_i: Option<u8>,
    pub rx_lpf_q: Option<u8>,
    pub dc_ref: Option<u8>,
    pub rxvga2a_i: Option<u8>,
    pub rxvga2a_q: Option<u8>,
    pub rxvga2b_i: Option<u8>,
    pub rxvga2b_q: Option<u8>,
}

impl DcCals {
    /// `(block, submodule address, value)` for every field
    fn entries(self: &Self) -> [(CalModule, u8, Option<u8>); 10] {
        [
            (CalModule::LpfTuning, 0, self.lpf_tuning),
            (CalModule::TxLpf, 0, self.tx_lpf_i),
            (CalModule::TxLpf, 1, self.tx_lpf_q),
            (CalModule::RxLpf, 0, self.rx_lpf_i),
            (CalModule::RxLpf, 1, self.rx_lpf_q),
            (CalModule::Rxvga2, 0, self.dc_ref),
            (CalModule::Rxvga2, 1, self.rxvga2a_i),
            (CalModule::Rxvga2, 2, self.rxvga2a_q),
            (CalModule::Rxvga2, 3, self.rxvga2b_i),
            (CalModule::Rxvga2, 4, self.rxvga2b_q),
        ]
    }
}


/// RX front end settings overridden while calibrating RX LPF or RXVGA2
struct RxBackup {
    fe_in: Reg<RxFeIn>,
    fe_term: Reg<RxFeTerm>,
    lna_gain: LnaGain,
    rxvga1_gain: i32,
    rxvga2_gain: i32,
}

/// State of one calibration run
struct CalibrationState {
    clk_en: Reg<ClkEn>,
    rx: Option<RxBackup>,
    rxvga1_curr_gain: i32,
    rxvga2_curr_gain: i32,
}


impl<I> Lms6002d<I>
where I: RegisterInterface,
{
    /// Runs DC offset calibration of `module`.
    ///
    /// Registers disturbed by the calibration are restored whether or not it
    /// succeeds. `delay` paces the "done" polls.
    pub fn calibrate_dc<D>(self: &mut Self, module: CalModule, delay: &mut D) -> Result<(), Error>
    where D: DelayUs<u16>,
    {
        let mut state = self.dc_cal_backup(module)?;

        let status = self.dc_cal_module_init(module, &mut state)
            .and_then(|_| self.dc_cal_converge(module, &mut state, delay));

        let deinit = self.dc_cal_module_deinit(module);
        let restore = self.dc_cal_restore(&state);

        status.and(deinit).and(restore)
    }

    /// Reads every DC calibration value
    pub fn get_dc_cals(self: &mut Self) -> Result<DcCals, Error> {
        let mut v = [0u8; 10];
        for ((module, addr, _), x) in DcCals::default().entries().iter().zip(v.iter_mut()) {
            *x = self.get_dc_cal_value(module.base(), *addr)?;
        }

        Ok(DcCals {
            lpf_tuning: Some(v[0]),
            tx_lpf_i: Some(v[1]),
            tx_lpf_q: Some(v[2]),
            rx_lpf_i: Some(v[3]),
            rx_lpf_q: Some(v[4]),
            dc_ref: Some(v[5]),
            rxvga2a_i: Some(v[6]),
            rxvga2a_q: Some(v[7]),
            rxvga2b_i: Some(v[8]),
            rxvga2b_q: Some(v[9]),
        })
    }

    /// Loads previously saved DC calibration values.
    /// Each block's calibration clock is enabled around its loads.
    pub fn set_dc_cals(self: &mut Self, cals: &DcCals) -> Result<(), Error> {
        let entries = cals.entries();

        if entries.iter().any(|(_, _, v)| v.map_or(false, |v| v > DC_CAL_VALUE_MAX)) {
            return Err(Error::InvalidArgument);
        }

        for module in CalModule::ALL.iter() {
            let mut values = entries.iter()
                .filter(|(m, _, _)| m == module)
                .filter_map(|(_, addr, v)| v.map(|v| (*addr, v)))
                .peekable();

            if values.peek().is_none() {
                continue;
            }

            self.modify::<ClkEn, _>(|r| module.clock(r, true))?;
            for (addr, v) in values {
                self.set_dc_cal_value(module.base(), addr, v)?;
            }
            self.modify::<ClkEn, _>(|r| module.clock(r, false))?;
        }

        Ok(())
    }


    fn set_dc_cal_value(self: &mut Self, base: u8, addr: u8, value: u8) -> Result<(), Error> {
        let ctl = Reg::<DcCalCtl>::new(0).set(DcResetN(true)).set(DcAddr(addr));

        self.store_rel(base, ctl)?;
        self.store_rel(base, Reg::<DcCntVal>::new(0).set(DcCount(value)))?;
        self.store_rel(base, ctl.set(DcLoad(true)))?;
        self.store_rel(base, ctl)?;

        self.load_rel::<DcRegVal>(base).map(|_| ())
    }

    fn get_dc_cal_value(self: &mut Self, base: u8, addr: u8) -> Result<u8, Error> {
        let ctl = Reg::<DcCalCtl>::new(0).set(DcResetN(true)).set(DcAddr(addr));
        self.store_rel(base, ctl)?;

        Ok(self.load_rel::<DcRegVal>(base)?.get::<DcValue>().0)
    }

    /// DC_CLBR_DONE poll
    fn dc_cal_done(self: &mut Self, base: u8) -> nb::Result<(), Error> {
        let status = self.load_rel::<DcStatus>(base)?;
        if status.get::<DcClbrBusy>().0 {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(())
        }
    }

    /// Calibrates one submodule starting from `cntval`.
    /// Not finishing within the poll budget is `UnexpectedState`.
    fn dc_cal_loop<D>(self: &mut Self, base: u8, addr: u8, cntval: u8, delay: &mut D) -> Result<u8, Error>
    where D: DelayUs<u16>,
    {
        debug!("Calibrating module {:#x}:{:#x}", base, addr);

        let ctl = self.load_rel::<DcCalCtl>(base)?.set(DcAddr(addr));
        self.store_rel(base, ctl)?;

        // Load DC_CNTVAL
        self.store_rel(base, Reg::<DcCntVal>::new(0).set(DcCount(cntval)))?;
        let ctl = ctl.set(DcLoad(true));
        self.store_rel(base, ctl)?;
        let ctl = ctl.set(DcLoad(false));
        self.store_rel(base, ctl)?;

        let ctl = ctl.set(DcStartClbr(true));
        self.store_rel(base, ctl)?;
        self.store_rel(base, ctl.set(DcStartClbr(false)))?;

        for _ in 0 .. DC_CAL_MAX_POLLS {
            match self.dc_cal_done(base) {
                Ok(()) => {
                    // DC_LOCK is not reliable, DC_REGVAL is (LMS FAQ 4.7)
                    let v = self.load_rel::<DcRegVal>(base)?.get::<DcValue>().0;
                    debug!("DC_REGVAL: {}", v);
                    return Ok(v);
                }
                Err(nb::Error::WouldBlock) => delay.delay_us(DC_CAL_POLL_DELAY_US),
                Err(nb::Error::Other(e)) => return Err(e),
            }
        }

        warn!("DC calibration loop did not converge");
        Err(Error::UnexpectedState)
    }

    fn dc_cal_backup(self: &mut Self, module: CalModule) -> Result<CalibrationState, Error> {
        let clk_en = self.load::<ClkEn>()?;

        let rx = if module.uses_rx_frontend() {
            Some(RxBackup {
                fe_in: self.load::<RxFeIn>()?,
                fe_term: self.load::<RxFeTerm>()?,
                lna_gain: self.lna_gain()?,
                rxvga1_gain: self.rxvga1_gain()?,
                rxvga2_gain: self.rxvga2_gain()?,
            })
        } else {
            None
        };

        Ok(CalibrationState {
            clk_en,
            rx,
            rxvga1_curr_gain: RXVGA1_GAIN_MAX,
            rxvga2_curr_gain: RXVGA2_GAIN_MAX,
        })
    }

    fn dc_cal_module_init(self: &mut Self, module: CalModule, state: &mut CalibrationState) -> Result<(), Error> {
        self.store(module.clock(state.clk_en, true))?;

        match module {
            CalModule::LpfTuning => {}

            CalModule::RxLpf | CalModule::Rxvga2 => {
                // DC comparators are only powered during calibration (LMS FAQ 5.26)
                if module == CalModule::Rxvga2 {
                    self.modify::<Rxvga2DcComp, _>(|r| r.set(Rxvga2DcCompPowerDown(0)))?;
                } else {
                    self.modify::<RxLpfDcComp, _>(|r| r.set(DcCompPowerDown(false)))?;
                }

                if let Some(rx) = &state.rx {
                    let fe_in = rx.fe_in.set(LnaPadConnect(false));
                    let fe_term = rx.fe_term.set(RxFeTerminate(true));
                    self.store(fe_in)?;
                    self.store(fe_term)?;
                }

                self.set_lna_gain(LnaGain::Max)?;

                state.rxvga1_curr_gain = RXVGA1_GAIN_MAX;
                self.set_rxvga1_gain(state.rxvga1_curr_gain)?;

                state.rxvga2_curr_gain = RXVGA2_GAIN_MAX;
                self.set_rxvga2_gain(state.rxvga2_curr_gain)?;
            }

            CalModule::TxLpf => {
                // DAC off or at minimum DC (LMS FAQ 4.1)
                self.modify::<TxDacCtl, _>(|r| r.set(TxDacQuiet(true)))?;
                self.modify::<TxLpfDcComp, _>(|r| r.set(DcCompPowerDown(false)))?;
            }
        }

        Ok(())
    }

    fn dc_cal_converge<D>(self: &mut Self, module: CalModule, state: &mut CalibrationState, delay: &mut D) -> Result<(), Error>
    where D: DelayUs<u16>,
    {
        loop {
            if self.dc_cal_module(module, delay)? {
                return Ok(());
            }

            if !self.dc_cal_retry_adjustment(module, state)? {
                debug!("DC Cal retry limit reached");
                warn!("DC Calibration ({:?}) failed to converge", module);
                return Err(Error::UnexpectedState);
            }
        }
    }

    /// One attempt over all submodules, stops at the first one that doesn't converge
    fn dc_cal_module<D>(self: &mut Self, module: CalModule, delay: &mut D) -> Result<bool, Error>
    where D: DelayUs<u16>,
    {
        for submodule in 0 .. module.submodules() {
            if !self.dc_cal_submodule(module, submodule, delay)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn dc_cal_submodule<D>(self: &mut Self, module: CalModule, submodule: u8, delay: &mut D) -> Result<bool, Error>
    where D: DelayUs<u16>,
    {
        if module == CalModule::Rxvga2 {
            self.rxvga2_submodule_setup(submodule)?;
        }

        let base = module.base();

        let mut value = match self.dc_cal_loop(base, submodule, DC_CAL_START_COUNT, delay) {
            Ok(v) => v,
            Err(Error::UnexpectedState) => return Ok(false),
            Err(e) => return Err(e),
        };

        if value == DC_CAL_SUSPECT_VALUE {
            debug!("DC_REGVAL suboptimal value - retrying DC cal loop");

            // Retry with DC_CNTVAL reset (LMS FAQ 4.7)
            value = match self.dc_cal_loop(base, submodule, 0, delay) {
                Ok(v) => v,
                Err(Error::UnexpectedState) => return Ok(false),
                Err(e) => return Err(e),
            };

            if value == 0 {
                debug!("Bad DC_REGVAL detected, keeping it");
                return Ok(true);
            }
        }

        if module == CalModule::LpfTuning {
            // LPF tuning result goes to both LPF DC levels
            self.modify_rel::<LpfBypassCtl, _>(0x30, |r| r.set(LpfDcLevel(value)))?;
            self.modify_rel::<LpfBypassCtl, _>(0x50, |r| r.set(LpfDcLevel(value)))?;
        }

        Ok(true)
    }

    /// RXVGA2 gain stage routing for each submodule:
    /// 0 is the DC reference, 1 and 2 stage A I/Q, 3 and 4 stage B I/Q.
    fn rxvga2_submodule_setup(self: &mut Self, submodule: u8) -> Result<(), Error> {
        let stages = Reg::<Rxvga2StageGain>::new(0);

        match submodule {
            0 => {
                // Back to power-on stage gains in case a later submodule failed
                self.modify::<Rxvga2Ctl, _>(|r| r.set(Rxvga2Decode(false)))?;
                self.store(stages.set(Vga2GainA(1)).set(Vga2GainB(0)))
            }
            1 => {
                self.modify::<Rxvga2Ctl, _>(|r| r.set(Rxvga2Decode(true)))?;
                self.store(stages.set(Vga2GainA(6)).set(Vga2GainB(0)))
            }
            3 => self.store(stages.set(Vga2GainA(0)).set(Vga2GainB(6))),
            2 | 4 => Ok(()),
            _ => Err(Error::UnexpectedState),
        }
    }

    /// Lowers the RX gains for another attempt.
    /// Returns false when there is nothing left to lower.
    fn dc_cal_retry_adjustment(self: &mut Self, module: CalModule, state: &mut CalibrationState) -> Result<bool, Error> {
        let rxvga2_adjustable = module == CalModule::Rxvga2;

        match module {
            CalModule::LpfTuning | CalModule::TxLpf => Ok(false),

            CalModule::RxLpf | CalModule::Rxvga2 => {
                if state.rxvga1_curr_gain > RXVGA1_GAIN_MIN {
                    state.rxvga1_curr_gain -= 1;
                    debug!("Retrying DC cal with RXVGA1={}", state.rxvga1_curr_gain);
                    self.set_rxvga1_gain(state.rxvga1_curr_gain)?;
                    Ok(true)
                } else if rxvga2_adjustable && state.rxvga2_curr_gain > RXVGA2_GAIN_MIN {
                    state.rxvga2_curr_gain -= RXVGA2_GAIN_STEP;
                    debug!("Retrying DC cal with RXVGA2={}", state.rxvga2_curr_gain);
                    self.set_rxvga2_gain(state.rxvga2_curr_gain)?;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
        }
    }

    /// Powers comparators down and puts back default routing.
    /// Every step runs, the first error is returned.
    fn dc_cal_module_deinit(self: &mut Self, module: CalModule) -> Result<(), Error> {
        match module {
            CalModule::LpfTuning => Ok(()),

            CalModule::RxLpf => {
                self.modify::<RxLpfDcComp, _>(|r| r.set(DcCompPowerDown(true)))
            }

            CalModule::Rxvga2 => {
                let stages = self.store(Reg::<Rxvga2StageGain>::new(0).set(Vga2GainA(1)).set(Vga2GainB(0)));
                let decode = self.modify::<Rxvga2Ctl, _>(|r| r.set(Rxvga2Decode(false)));
                let comp = self.modify::<Rxvga2DcComp, _>(|r| r.set(Rxvga2DcCompPowerDown(3)));
                stages.and(decode).and(comp)
            }

            CalModule::TxLpf => {
                let comp = self.modify::<TxLpfDcComp, _>(|r| r.set(DcCompPowerDown(true)));
                let dac = self.modify::<TxDacCtl, _>(|r| r.set(TxDacQuiet(false)));
                comp.and(dac)
            }
        }
    }

    /// Writes the backed up registers and gains back.
    /// Every step runs, the first error is returned.
    fn dc_cal_restore(self: &mut Self, state: &CalibrationState) -> Result<(), Error> {
        let mut status = self.store(state.clk_en);

        if let Some(rx) = &state.rx {
            status = status
                .and(self.store(rx.fe_in))
                .and(self.store(rx.fe_term))
                .and(self.set_lna_gain(rx.lna_gain))
                .and(self.set_rxvga1_gain(rx.rxvga1_gain).map(|_| ()))
                .and(self.set_rxvga2_gain(rx.rxvga2_gain).map(|_| ()));
        }

        status
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::*;

    fn device() -> Lms6002d<MockRegisters> {
        let mut dev = Lms6002d::new(MockRegisters::new());
        dev.set_lna_gain(LnaGain::Mid).unwrap();
        dev.set_rxvga1_gain(20).unwrap();
        dev.set_rxvga2_gain(9).unwrap();
        dev.interface().regs[0x09] = 0x40;
        dev.interface().regs[0x71] = 0x80;
        dev.interface().regs[0x7c] = 0x01;
        dev.interface().regs[0x5f] = 0x80;
        dev.interface().regs[0x6e] = 0xc0;
        dev.interface().regs[0x3f] = 0x80;
        dev.interface().log.clear();
        dev
    }

    fn assert_restored(dev: &mut Lms6002d<MockRegisters>) {
        assert_eq!(dev.interface().regs[0x09], 0x40);
        assert_eq!(dev.interface().regs[0x71], 0x80);
        assert_eq!(dev.interface().regs[0x7c], 0x01);
        assert_eq!(dev.lna_gain(), Ok(LnaGain::Mid));
        assert_eq!(dev.rxvga1_gain(), Ok(20));
        assert_eq!(dev.rxvga2_gain(), Ok(9));
    }

    #[test]
    fn every_module_converges() {
        for module in CalModule::ALL.iter() {
            let mut dev = device();
            assert_eq!(dev.calibrate_dc(*module, &mut NoDelay), Ok(()), "{:?}", module);
            assert_eq!(dev.interface().dc_starts, module.submodules() as usize);
            assert_restored(&mut dev);
        }
    }

    #[test]
    fn done_within_poll_budget() {
        let mut dev = device();
        dev.interface().dc_busy_polls = Some(DC_CAL_MAX_POLLS as u32 - 1);

        let mut delay = CountingDelay::default();
        assert_eq!(dev.calibrate_dc(CalModule::TxLpf, &mut delay), Ok(()));
        assert_eq!(delay.calls, 2 * (DC_CAL_MAX_POLLS as u32 - 1));
        assert_eq!(delay.total_us, delay.calls * DC_CAL_POLL_DELAY_US as u32);
    }

    #[test]
    fn poll_budget_exceeded() {
        let mut dev = device();
        dev.interface().dc_busy_polls = Some(DC_CAL_MAX_POLLS as u32);
        assert_eq!(dev.calibrate_dc(CalModule::TxLpf, &mut NoDelay), Err(Error::UnexpectedState));
        assert_eq!(dev.interface().dc_starts, 1);
    }

    #[test]
    fn never_done_exhausts_gain_retries() {
        // 1 attempt at max gain, RXVGA1 30 -> 5, then RXVGA2 30 -> 0 in 3 dB steps
        let attempts = [
            (CalModule::LpfTuning, 1),
            (CalModule::TxLpf, 1),
            (CalModule::RxLpf, 26),
            (CalModule::Rxvga2, 36),
        ];

        for (module, n) in attempts.iter() {
            let mut dev = device();
            dev.interface().dc_busy_polls = None;

            assert_eq!(dev.calibrate_dc(*module, &mut NoDelay), Err(Error::UnexpectedState));
            assert_eq!(dev.interface().dc_starts, *n, "{:?}", module);
            assert_restored(&mut dev);
        }
    }

    #[test]
    fn rxvga2_retry_lowers_gains() {
        let mut dev = device();
        dev.interface().dc_busy_polls = None;
        dev.calibrate_dc(CalModule::Rxvga2, &mut NoDelay).unwrap_err();

        let rxvga2: Vec<u8> = dev.interface().writes_to(0x65).collect();
        assert_eq!(rxvga2, vec![10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 3]);
    }

    #[test]
    fn suspect_value_is_retried_from_zero() {
        let mut dev = device();
        dev.interface().dc_results.extend([31, 12, 40].iter());

        assert_eq!(dev.calibrate_dc(CalModule::TxLpf, &mut NoDelay), Ok(()));
        assert_eq!(dev.interface().dc_starts, 3);

        let cntvals: Vec<u8> = dev.interface().writes_to(0x32).collect();
        assert_eq!(cntvals, vec![31, 0, 31]);

        let cals = dev.get_dc_cals().unwrap();
        assert_eq!(cals.tx_lpf_i, Some(12));
        assert_eq!(cals.tx_lpf_q, Some(40));
    }

    #[test]
    fn suspect_value_then_zero_is_accepted() {
        let mut dev = device();
        dev.interface().dc_results.extend([31, 0].iter());
        assert_eq!(dev.calibrate_dc(CalModule::LpfTuning, &mut NoDelay), Ok(()));
        assert_eq!(dev.interface().dc_starts, 2);
    }

    #[test]
    fn lpf_tuning_sets_both_lpf_dc_levels() {
        let mut dev = device();
        dev.interface().regs[0x35] = 0x40;
        dev.interface().regs[0x55] = 0x3f;
        dev.interface().dc_results.push_back(22);

        dev.calibrate_dc(CalModule::LpfTuning, &mut NoDelay).unwrap();
        assert_eq!(dev.interface().regs[0x35], 0x40 | 22);
        assert_eq!(dev.interface().regs[0x55], 22);

        // clock enabled during the run only
        let clk: Vec<u8> = dev.interface().writes_to(0x09).collect();
        assert_eq!(clk, vec![0x60, 0x40]);
    }

    #[test]
    fn rx_frontend_is_terminated_during_calibration() {
        let mut dev = device();
        dev.calibrate_dc(CalModule::RxLpf, &mut NoDelay).unwrap();

        let fe_in: Vec<u8> = dev.interface().writes_to(0x71).collect();
        assert_eq!(fe_in, vec![0x00, 0x80]);
        let fe_term: Vec<u8> = dev.interface().writes_to(0x7c).collect();
        assert_eq!(fe_term, vec![0x05, 0x01]);

        let comp: Vec<u8> = dev.interface().writes_to(0x5f).collect();
        assert_eq!(comp, vec![0x00, 0x80]);
    }

    #[test]
    fn rxvga2_stage_routing() {
        let mut dev = device();
        dev.calibrate_dc(CalModule::Rxvga2, &mut NoDelay).unwrap();

        let stages: Vec<u8> = dev.interface().writes_to(0x68).collect();
        assert_eq!(stages, vec![0x01, 0x06, 0x60, 0x01]);
        assert_eq!(dev.interface().regs[0x64] & 0x01, 0);
        assert_eq!(dev.interface().regs[0x6e] & 0xc0, 0xc0);

        let addrs: Vec<u8> = dev.interface().writes_to(0x63).map(|v| v & 0x07).collect();
        assert!(addrs.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(addrs.last(), Some(&4));
    }

    #[test]
    fn tx_lpf_quiets_the_dac() {
        let mut dev = device();
        dev.interface().regs[0x36] = 0x01;
        dev.calibrate_dc(CalModule::TxLpf, &mut NoDelay).unwrap();

        let dac: Vec<u8> = dev.interface().writes_to(0x36).collect();
        assert_eq!(dac, vec![0x81, 0x01]);
        assert_eq!(dev.interface().regs[0x3f], 0x80);
    }

    #[test]
    fn io_error_still_restores() {
        let mut dev = device();
        dev.interface().fail_write = Some(0x52);

        assert_eq!(dev.calibrate_dc(CalModule::RxLpf, &mut NoDelay), Err(Error::Io));
        assert_eq!(dev.interface().dc_starts, 0);
        assert_eq!(dev.interface().regs[0x5f], 0x80);
        assert_restored(&mut dev);
    }

    #[test]
    fn deinit_runs_every_step_after_failure() {
        let mut dev = device();
        dev.interface().fail_write = Some(0x68);

        assert_eq!(dev.calibrate_dc(CalModule::Rxvga2, &mut NoDelay), Err(Error::Io));
        assert_eq!(dev.interface().dc_starts, 0);
        assert_eq!(dev.interface().regs[0x64] & 0x01, 0);
        assert_eq!(dev.interface().regs[0x6e], 0xc0);
        assert_restored(&mut dev);
    }

    #[test]
    fn backup_failure_touches_nothing() {
        let mut dev = device();
        dev.interface().regs[0x75] = 0x10;
        assert_eq!(dev.calibrate_dc(CalModule::RxLpf, &mut NoDelay), Err(Error::UnexpectedState));
        assert_eq!(dev.interface().writes().count(), 0);
    }

    #[test]
    fn dc_cals_round_trip() {
        let mut dev = device();
        let cals = DcCals {
            lpf_tuning: Some(7),
            tx_lpf_q: Some(63),
            rxvga2b_i: Some(0),
            ..DcCals::default()
        };
        dev.set_dc_cals(&cals).unwrap();

        // untouched blocks keep their clocks alone
        assert_eq!(dev.interface().writes_to(0x09).count(), 6);
        assert_eq!(dev.interface().regs[0x09], 0x40);

        let back = dev.get_dc_cals().unwrap();
        assert_eq!(back.lpf_tuning, Some(7));
        assert_eq!(back.tx_lpf_q, Some(63));
        assert_eq!(back.rxvga2b_i, Some(0));
        assert_eq!(back.rx_lpf_i, Some(DEFAULT_DC_VALUE));
    }

    #[test]
    fn dc_cals_range_checked_first() {
        let mut dev = device();
        let cals = DcCals { rx_lpf_i: Some(1), dc_ref: Some(64), ..DcCals::default() };
        assert_eq!(dev.set_dc_cals(&cals), Err(Error::InvalidArgument));
        assert!(dev.interface().log.is_empty());
    }

    #[test]
    fn raw_module_codes() {
        assert_eq!(CalModule::try_from(3), Ok(CalModule::Rxvga2));
        assert_eq!(CalModule::try_from(4), Err(Error::InvalidArgument));
    }
}
