//! Ways of driving the JTAG lines.  Anything that can toggle TMS/TCK/TDI and sample TDO
//! implements the `Cable` trait; `gpio` does it by bit-banging `embedded-hal` pins, and `cdev`
//! provides such pins on Linux hosts.
use alloc::vec::Vec;

use crate::error::{Error, Result};

pub mod gpio;
#[cfg(feature = "std")]
pub mod cdev;

pub trait Cable {
    /// Clock out a series of TMS values to change the state of the JTAG chain.  `tdi` controls
    /// the state of the TDI line during mode changes.
    fn change_mode(&mut self, tms: &[bool], tdi: bool) -> Result<()>;
    /// Shift in bits from the TDO line.  `bits` is the total number of bits to read.  Should be
    /// called with state = ShiftIR or ShiftDR, and will remain in that state.  Should clock out
    /// all ones.
    fn read_data(&mut self, bits: usize) -> Result<Vec<u8>>;
    /// Shift out bits on the TDI line.  `bits` is the number of bits to send from the last byte.
    /// Should be called with state = ShiftIR or ShiftDR.  State won't change unless `pause_after`
    /// is true, in which case it will be PauseIR or PauseDR on exit.
    fn write_data(&mut self, data: &[u8], bits: u8, pause_after: bool) -> Result<()> {
        self.read_write_data(data, bits, pause_after).map(|_| ())
    }
    /// Same as `write_data`, returning the bits seen on TDO while shifting.
    fn read_write_data(&mut self, data: &[u8], bits: u8, pause_after: bool) -> Result<Vec<u8>>;
}

impl<C: Cable + ?Sized> Cable for alloc::boxed::Box<C> {
    fn change_mode(&mut self, tms: &[bool], tdi: bool) -> Result<()> {
        (**self).change_mode(tms, tdi)
    }

    fn read_data(&mut self, bits: usize) -> Result<Vec<u8>> {
        (**self).read_data(bits)
    }

    fn write_data(&mut self, data: &[u8], bits: u8, pause_after: bool) -> Result<()> {
        (**self).write_data(data, bits, pause_after)
    }

    fn read_write_data(&mut self, data: &[u8], bits: u8, pause_after: bool) -> Result<Vec<u8>> {
        (**self).read_write_data(data, bits, pause_after)
    }
}

/// Reject shifts the cables can't express: nothing to send, or a partial byte outside 1..=8.
pub(crate) fn check_shift(data: &[u8], bits: u8) -> Result<()> {
    if data.is_empty() {
        return Err(Error::EmptyData);
    }
    if bits == 0 || bits > 8 {
        return Err(Error::BitCount(bits));
    }
    Ok(())
}

/// Set bit `index` of an LSB-first packed buffer, growing it a byte at a time.
pub(crate) fn push_bit(buf: &mut Vec<u8>, index: usize, bit: bool) {
    if index % 8 == 0 {
        buf.push(0);
    }
    if bit {
        buf[index / 8] |= 1 << (index % 8);
    }
}
