//! JTAG over bit-banged GPIO for the MATRIX Creator board.
//!
//! The MATRIX Creator wires its FPGA's JTAG port to four pins of the Raspberry Pi header.  Which
//! four depends on the board revision; `board` holds the known pin sets as `PinMap` values and
//! lets one be picked at run time, by name or as an explicit `tms,tck,tdi,tdo` list.
//!
//! At the lowest level a `Cable` toggles TMS, TCK and TDI and samples TDO.  `cable::gpio` does
//! that on any four `embedded-hal` pins, and with the `std` feature `cable::cdev` supplies such
//! pins on Linux by BCM number, through the GPIO character device.
//!
//! The next higher level of abstraction is the `JtagSM`, which keeps track of the state of the
//! TAPs.  You tell it which state you want (e.g., Reset or Idle) and it gets there with the
//! fewest number of TMS clocks.  You can also read and write the instruction and data registers.
//! On top of that, `chain` discovers the devices on the scan chain, their ID codes and their
//! instruction register lengths.
//!
//! # Example
//! ```no_run
//! use matrix_jtag::board::Variant;
//! use matrix_jtag::cable::cdev;
//! use matrix_jtag::chain::Chain;
//! use matrix_jtag::statemachine::JtagSM;
//!
//! # fn main() -> matrix_jtag::Result<()> {
//! let cable = cdev::open(cdev::DEFAULT_CHIP, &Variant::Fast.pins(), 1000)?;
//! let mut jtag = JtagSM::new(cable)?;
//! let chain = Chain::detect(&mut jtag)?;
//! for device in &chain.devices {
//!     println!("{:?}", device);
//! }
//! # Ok(())
//! # }
//! ```

#![no_std]

#[cfg(any(test, feature = "std"))]
extern crate std;

extern crate alloc;

pub mod board;
pub mod cable;
pub mod chain;
pub mod error;
pub mod statemachine;

#[cfg(test)]
mod sim;

pub use error::{Error, Result};
