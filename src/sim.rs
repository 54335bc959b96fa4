//! A simulated scan chain for tests, reachable both as a `Cable` and as a set of
//! `embedded-hal` pins.
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};

use crate::cable::{push_bit, Cable};
use crate::error::{Error, Result};
use crate::statemachine::JtagState;

const IDCODE: u64 = 0b1;

pub struct SimDevice {
    idcode: Option<u32>,
    irlen: usize,
    ir: u64,
    instruction: u64,
    dr: u64,
    drlen: usize,
}

impl SimDevice {
    pub fn new(idcode: Option<u32>, irlen: usize) -> Self {
        let mut device = Self { idcode, irlen, ir: 0, instruction: 0, dr: 0, drlen: 1 };
        device.reset();
        device
    }

    fn bypass(&self) -> u64 {
        (1 << self.irlen) - 1
    }

    fn reset(&mut self) {
        self.instruction = if self.idcode.is_some() { IDCODE } else { self.bypass() };
    }

    fn capture_dr(&mut self) {
        match self.idcode {
            Some(id) if self.instruction == IDCODE => {
                self.dr = id as u64;
                self.drlen = 32;
            }
            _ => {
                self.dr = 0;
                self.drlen = 1;
            }
        }
    }

    fn shift(reg: &mut u64, len: usize, tdi: bool) -> bool {
        let out = *reg & 1 == 1;
        *reg = (*reg >> 1) | ((tdi as u64) << (len - 1));
        out
    }
}

pub struct SimChain {
    devices: Vec<SimDevice>,
    state: JtagState,
    clocks: usize,
}

impl SimChain {
    /// `devices[0]` drives TDO, the last device receives TDI.
    pub fn new(devices: Vec<SimDevice>) -> Self {
        Self { devices, state: JtagState::Reset, clocks: 0 }
    }

    pub fn state(&self) -> JtagState {
        self.state
    }

    pub fn clocks(&self) -> usize {
        self.clocks
    }

    /// Level currently driven on TDO.  The line idles high outside the shift states.
    pub fn tdo(&self) -> bool {
        match (self.state, self.devices.first()) {
            (JtagState::ShiftDR, Some(d)) => d.dr & 1 == 1,
            (JtagState::ShiftIR, Some(d)) => d.ir & 1 == 1,
            _ => true,
        }
    }

    /// One TCK rising edge.
    pub fn clock(&mut self, tms: bool, tdi: bool) {
        self.clocks += 1;
        match self.state {
            JtagState::CaptureDR => self.devices.iter_mut().for_each(SimDevice::capture_dr),
            JtagState::CaptureIR => self.devices.iter_mut().for_each(|d| d.ir = 0b01),
            JtagState::ShiftDR => {
                let mut carry = tdi;
                for d in self.devices.iter_mut().rev() {
                    carry = SimDevice::shift(&mut d.dr, d.drlen, carry);
                }
            }
            JtagState::ShiftIR => {
                let mut carry = tdi;
                for d in self.devices.iter_mut().rev() {
                    carry = SimDevice::shift(&mut d.ir, d.irlen, carry);
                }
            }
            _ => {}
        }

        self.state = self.state.next(tms);
        match self.state {
            JtagState::Reset => self.devices.iter_mut().for_each(SimDevice::reset),
            JtagState::UpdateIR => self.devices.iter_mut().for_each(|d| d.instruction = d.ir),
            _ => {}
        }
    }
}

/// A `Cable` wired straight into a `SimChain`.
pub struct SimCable {
    pub chain: SimChain,
    /// Clocks left before every further clock fails like a dead GPIO line
    pub fail_after: Option<usize>,
}

impl SimCable {
    pub fn new(devices: Vec<SimDevice>) -> Self {
        Self { chain: SimChain::new(devices), fail_after: None }
    }

    fn clock(&mut self, tms: bool, tdi: bool) -> Result<bool> {
        match self.fail_after {
            Some(0) => return Err(Error::Pin(ErrorKind::Other)),
            Some(left) => self.fail_after = Some(left - 1),
            None => {}
        }
        let tdo = self.chain.tdo();
        self.chain.clock(tms, tdi);
        Ok(tdo)
    }
}

impl Cable for SimCable {
    fn change_mode(&mut self, tms: &[bool], tdi: bool) -> Result<()> {
        for &t in tms {
            self.clock(t, tdi)?;
        }
        Ok(())
    }

    fn read_data(&mut self, bits: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        for i in 0..bits {
            let tdo = self.clock(false, true)?;
            push_bit(&mut buf, i, tdo);
        }
        Ok(buf)
    }

    fn read_write_data(&mut self, data: &[u8], bits: u8, pause_after: bool) -> Result<Vec<u8>> {
        crate::cable::check_shift(data, bits)?;
        let total = (data.len() - 1) * 8 + bits as usize;
        let mut buf = Vec::new();
        for i in 0..total {
            let tdi = (data[i / 8] >> (i % 8)) & 1 == 1;
            let last = i == total - 1;
            let tdo = self.clock(last && pause_after, tdi)?;
            push_bit(&mut buf, i, tdo);
        }
        if pause_after {
            self.clock(false, true)?;
        }
        Ok(buf)
    }
}

/// Signal levels on a simulated header, with the chain hanging off it.
pub struct Bench {
    pub chain: SimChain,
    pub tms: bool,
    pub tdi: bool,
    pub tck: bool,
    tdo: bool,
    pub rising_edges: usize,
}

#[derive(Clone, Copy, PartialEq)]
enum Line {
    Tms,
    Tck,
    Tdi,
}

pub struct SimOutput {
    bench: Rc<RefCell<Bench>>,
    line: Line,
}

pub struct SimInput {
    bench: Rc<RefCell<Bench>>,
}

/// Returns the shared bench plus (tck, tdi, tdo, tms) pins.
pub fn bench(devices: Vec<SimDevice>) -> (Rc<RefCell<Bench>>, SimOutput, SimOutput, SimInput, SimOutput) {
    let chain = SimChain::new(devices);
    let tdo = chain.tdo();
    let bench = Rc::new(RefCell::new(Bench {
        chain,
        tms: false,
        tdi: false,
        tck: false,
        tdo,
        rising_edges: 0,
    }));
    let out = |line| SimOutput { bench: bench.clone(), line };
    let (tck, tdi, tms) = (out(Line::Tck), out(Line::Tdi), out(Line::Tms));
    let tdo = SimInput { bench: bench.clone() };
    (bench, tck, tdi, tdo, tms)
}

impl SimOutput {
    fn set(&mut self, level: bool) {
        let mut b = self.bench.borrow_mut();
        match self.line {
            Line::Tms => b.tms = level,
            Line::Tdi => b.tdi = level,
            Line::Tck => {
                if level && !b.tck {
                    let (tms, tdi) = (b.tms, b.tdi);
                    b.chain.clock(tms, tdi);
                    b.rising_edges += 1;
                } else if !level && b.tck {
                    // TDO only changes on the falling edge
                    b.tdo = b.chain.tdo();
                }
                b.tck = level;
            }
        }
    }
}

impl ErrorType for SimOutput {
    type Error = Infallible;
}

impl OutputPin for SimOutput {
    fn set_low(&mut self) -> core::result::Result<(), Infallible> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Infallible> {
        self.set(true);
        Ok(())
    }
}

impl ErrorType for SimInput {
    type Error = Infallible;
}

impl InputPin for SimInput {
    fn is_high(&mut self) -> core::result::Result<bool, Infallible> {
        Ok(self.bench.borrow().tdo)
    }

    fn is_low(&mut self) -> core::result::Result<bool, Infallible> {
        Ok(!self.bench.borrow().tdo)
    }
}

/// Adds up requested delays instead of waiting.
#[derive(Default)]
pub struct SimDelay {
    pub total_ns: Rc<RefCell<u64>>,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.total_ns.borrow_mut() += ns as u64;
    }
}
