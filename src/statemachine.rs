//! This provides a higher-level interface than the `Cable` trait.  Specifically, it keeps track of
//! the state of the JTAG state machine, and allows setting the state to any desired state.
//! `JtagSM` will get to that state by the most efficient path, based on the current state.
use alloc::vec;
use alloc::vec::Vec;

use log::debug;

use crate::cable::Cable;
use crate::error::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    Data,
    Instruction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JtagState {
    Reset = 0,
    Idle = 1,
    SelectDR = 2,
    CaptureDR = 3,
    ShiftDR = 4,
    Exit1DR = 5,
    PauseDR = 6,
    Exit2DR = 7,
    UpdateDR = 8,
    SelectIR = 9,
    CaptureIR = 10,
    ShiftIR = 11,
    Exit1IR = 12,
    PauseIR = 13,
    Exit2IR = 14,
    UpdateIR = 15,
}

/// TMS sequence that reaches Test-Logic-Reset from anywhere and then settles in Run-Test/Idle
const RESET_SEQUENCE: [bool; 6] = [true, true, true, true, true, false];

impl JtagState {
    /// The state the TAP controller moves to on a TCK rising edge with the given TMS level.
    pub fn next(self, tms: bool) -> JtagState {
        use JtagState::*;
        match (self, tms) {
            (Reset, false) => Idle,
            (Reset, true) => Reset,
            (Idle, false) => Idle,
            (Idle, true) => SelectDR,

            (SelectDR, false) => CaptureDR,
            (SelectDR, true) => SelectIR,
            (CaptureDR, false) | (ShiftDR, false) | (Exit2DR, false) => ShiftDR,
            (CaptureDR, true) | (ShiftDR, true) => Exit1DR,
            (Exit1DR, false) | (PauseDR, false) => PauseDR,
            (Exit1DR, true) | (Exit2DR, true) => UpdateDR,
            (PauseDR, true) => Exit2DR,

            (SelectIR, false) => CaptureIR,
            (SelectIR, true) => Reset,
            (CaptureIR, false) | (ShiftIR, false) | (Exit2IR, false) => ShiftIR,
            (CaptureIR, true) | (ShiftIR, true) => Exit1IR,
            (Exit1IR, false) | (PauseIR, false) => PauseIR,
            (Exit1IR, true) | (Exit2IR, true) => UpdateIR,
            (PauseIR, true) => Exit2IR,

            (UpdateDR, false) | (UpdateIR, false) => Idle,
            (UpdateDR, true) | (UpdateIR, true) => SelectDR,
        }
    }

    fn shift(reg: Register) -> JtagState {
        match reg {
            Register::Data => JtagState::ShiftDR,
            Register::Instruction => JtagState::ShiftIR,
        }
    }

    fn pause(reg: Register) -> JtagState {
        match reg {
            Register::Data => JtagState::PauseDR,
            Register::Instruction => JtagState::PauseIR,
        }
    }
}

/// Shortest TMS sequence leading from `from` to `to`, found breadth first.
pub fn tms_path(from: JtagState, to: JtagState) -> Vec<bool> {
    let mut prev: [Option<(JtagState, bool)>; 16] = [None; 16];
    let mut seen = [false; 16];
    let mut queue = [JtagState::Reset; 16];
    let (mut head, mut tail) = (0, 1);
    queue[0] = from;
    seen[from as usize] = true;

    while head < tail && !seen[to as usize] {
        let state = queue[head];
        head += 1;
        for tms in [false, true] {
            let next = state.next(tms);
            if !seen[next as usize] {
                seen[next as usize] = true;
                prev[next as usize] = Some((state, tms));
                queue[tail] = next;
                tail += 1;
            }
        }
    }

    let mut path = Vec::new();
    let mut at = to;
    while let Some((state, tms)) = prev[at as usize] {
        path.push(tms);
        at = state;
    }
    path.reverse();
    path
}

pub struct JtagSM<C> {
    pub cable: C,
    state: JtagState,
    /// Set when a cable error left the TAPs somewhere other than `state`
    lost: bool,
}

impl<C: Cable> JtagSM<C> {
    /// Create a JTAG state machine using an existing `Cable`.  The chain is reset and left in
    /// Run-Test/Idle.
    pub fn new(mut cable: C) -> Result<Self> {
        cable.change_mode(&RESET_SEQUENCE, true)?;
        Ok(Self {
            cable,
            state: JtagState::Idle,
            lost: false,
        })
    }

    /// The tracked TAP state.  Not trustworthy while `is_lost` is true.
    pub fn state(&self) -> JtagState {
        self.state
    }

    /// Whether a failed cable operation left the TAP state unknown.  The next mode change resets
    /// the chain first.
    pub fn is_lost(&self) -> bool {
        self.lost
    }

    /// Note a cable failure partway through clocking; the TAPs may have moved.
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.lost = true;
        }
        result
    }

    pub fn into_cable(self) -> C {
        self.cable
    }

    /// Reset the scan chain by driving TMS high for 5 clocks, then go to Run-Test/Idle.  Every
    /// TAP loads IDCODE (or BYPASS) as its instruction.
    pub fn mode_reset(&mut self) -> Result<()> {
        let result = self.cable.change_mode(&RESET_SEQUENCE, true);
        self.track(result)?;
        self.state = JtagState::Idle;
        self.lost = false;
        Ok(())
    }

    /// Use TMS to get into `state` by the most efficient path.  If an earlier cable error left
    /// the state unknown, the chain is reset first.
    pub fn change_mode(&mut self, state: JtagState) -> Result<()> {
        if self.lost {
            debug!("TAP state lost, resetting");
            self.mode_reset()?;
        }
        if self.state == state {
            return Ok(());
        }

        let path = tms_path(self.state, state);
        debug!("path from {:?} to {:?}: {:?}", self.state, state, path);
        let result = self.cable.change_mode(&path, true);
        self.track(result)?;
        self.state = state;
        Ok(())
    }

    /// Clock TCK `cycles` times in Run-Test/Idle
    pub fn run_test(&mut self, cycles: usize) -> Result<()> {
        self.change_mode(JtagState::Idle)?;
        if cycles > 0 {
            let result = self.cable.change_mode(&vec![false; cycles], true);
            self.track(result)?;
        }
        Ok(())
    }

    /// Read `bits` from either the instruction or data register
    pub fn read_reg(&mut self, reg: Register, bits: usize) -> Result<Vec<u8>> {
        self.change_mode(JtagState::shift(reg))?;
        let result = self.cable.read_data(bits);
        self.track(result)
    }

    /// Write `data` into either the instruction or data register.  `bits` indicates how many bits
    /// of the last byte should be written (8 indicates that the entire byte should be written).
    /// The mode will either be ShiftIR / ShiftDR if `pause_after` is false, or PauseIR / PauseDR
    /// if `pause_after` is true.  This allows for setting the register with multiple calls to
    /// `write_reg`, which may be more convenient than manual bit-shifting.
    pub fn write_reg(&mut self, reg: Register, data: &[u8], bits: u8, pause_after: bool) -> Result<()> {
        self.change_mode(JtagState::shift(reg))?;
        let result = self.cable.write_data(data, bits, pause_after);
        self.track(result)?;
        if pause_after {
            self.state = JtagState::pause(reg);
        }
        Ok(())
    }

    /// Similar to `write_reg` except it returns the bits that were shifted out during writing.
    pub fn read_write_reg(
        &mut self,
        reg: Register,
        data: &[u8],
        bits: u8,
        pause_after: bool,
    ) -> Result<Vec<u8>> {
        self.change_mode(JtagState::shift(reg))?;
        let result = self.cable.read_write_data(data, bits, pause_after);
        let data = self.track(result)?;
        if pause_after {
            self.state = JtagState::pause(reg);
        }
        Ok(data)
    }
}
