//! GPIO lines through the Linux character device interface (`/dev/gpiochipN`), addressed by
//! line offset, which on the Raspberry Pi header is the BCM number.  `open` requests the four
//! JTAG lines in one go and wires them into a bit-banging `Gpio` cable.
use alloc::format;
use alloc::rc::Rc;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};
use gpiocdev::line::{Offset, Value};
use gpiocdev::Request;
use log::{info, warn};

use crate::board::PinMap;
use crate::cable::gpio::Gpio;
use crate::error::Result;

/// The chip carrying the 40-pin header on most Raspberry Pi models
pub const DEFAULT_CHIP: &str = "/dev/gpiochip0";

const CONSUMER: &str = "matrix-jtag";

/// Path of `/dev/gpiochipN`
pub fn chip_path(chip: u32) -> PathBuf {
    PathBuf::from(format!("/dev/gpiochip{}", chip))
}

/// A failed get or set on a requested line.
#[derive(Debug)]
pub struct LineError(pub gpiocdev::Error);

impl embedded_hal::digital::Error for LineError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

fn level(high: bool) -> Value {
    if high {
        Value::Active
    } else {
        Value::Inactive
    }
}

/// One line out of a shared request.  The kernel releases the lines when the last handle to the
/// request is dropped.
pub struct CdevPin {
    request: Rc<Request>,
    offset: Offset,
}

impl CdevPin {
    pub fn offset(&self) -> Offset {
        self.offset
    }

    fn set(&mut self, high: bool) -> core::result::Result<(), LineError> {
        self.request.set_value(self.offset, level(high)).map_err(|e| {
            warn!("GPIO{} write failed: {}", self.offset, e);
            LineError(e)
        })
    }

    fn get(&mut self) -> core::result::Result<bool, LineError> {
        match self.request.value(self.offset) {
            Ok(value) => Ok(value == Value::Active),
            Err(e) => {
                warn!("GPIO{} read failed: {}", self.offset, e);
                Err(LineError(e))
            }
        }
    }
}

impl ErrorType for CdevPin {
    type Error = LineError;
}

impl OutputPin for CdevPin {
    fn set_low(&mut self) -> core::result::Result<(), LineError> {
        self.set(false)
    }

    fn set_high(&mut self) -> core::result::Result<(), LineError> {
        self.set(true)
    }
}

impl InputPin for CdevPin {
    fn is_high(&mut self) -> core::result::Result<bool, LineError> {
        self.get()
    }

    fn is_low(&mut self) -> core::result::Result<bool, LineError> {
        self.get().map(|high| !high)
    }
}

/// Busy-waits; `thread::sleep` can't do sub-microsecond half periods.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpinDelay;

impl DelayNs for SpinDelay {
    fn delay_ns(&mut self, ns: u32) {
        let start = Instant::now();
        let wait = Duration::from_nanos(ns as u64);
        while start.elapsed() < wait {
            core::hint::spin_loop();
        }
    }
}

pub type CdevCable = Gpio<CdevPin, CdevPin, CdevPin, CdevPin, SpinDelay>;

/// Request the lines of `pins` on `chip` and bit-bang JTAG on them at `freq_khz`.  TMS, TCK and
/// TDI start out low.
pub fn open(chip: impl Into<PathBuf>, pins: &PinMap, freq_khz: u32) -> Result<CdevCable> {
    pins.validate()?;
    let chip = chip.into();
    info!("opening JTAG on {} at {} kHz via {}", pins, freq_khz, chip.display());

    let outputs = [pins.tms as Offset, pins.tck as Offset, pins.tdi as Offset];
    let request = Request::builder()
        .on_chip(chip)
        .with_consumer(CONSUMER)
        .with_lines(&outputs)
        .as_output(Value::Inactive)
        .with_line(pins.tdo as Offset)
        .as_input()
        .request()?;

    let request = Rc::new(request);
    let pin = |offset: u8| CdevPin { request: request.clone(), offset: offset as Offset };
    Gpio::new(freq_khz, pin(pins.tck), pin(pins.tdi), pin(pins.tdo), pin(pins.tms), SpinDelay)
}
