use alloc::string::String;

use embedded_hal::digital::ErrorKind;
use thiserror::Error;

use crate::board::Signal;

#[derive(Error, Debug)]
pub enum Error {
    #[error("GPIO pin error: {0:?}")]
    Pin(ErrorKind),
    #[error("GPIO{pin} is assigned to both {first:?} and {second:?}")]
    DuplicatePin { pin: u8, first: Signal, second: Signal },
    #[error("GPIO{pin} for {signal:?} is not on the header (max GPIO{max})")]
    PinOutOfRange { signal: Signal, pin: u8, max: u8 },
    #[error("unknown pin set {0:?}")]
    UnknownVariant(String),
    #[error("pin list {0:?} is not four comma separated GPIO numbers (tms,tck,tdi,tdo)")]
    InvalidPinList(String),
    #[error("clock frequency must be non-zero")]
    InvalidFrequency,
    #[error("no data to shift")]
    EmptyData,
    #[error("bit count {0} is not in 1..=8")]
    BitCount(u8),
    #[error("more than {0} devices on the scan chain")]
    ChainTooLong(usize),
    #[error("found {idcodes} devices but {irlens} instruction registers")]
    ChainMismatch { idcodes: usize, irlens: usize },
    #[cfg(feature = "std")]
    #[error("GPIO character device: {0}")]
    Gpio(#[from] gpiocdev::Error),
}

impl Error {
    /// Convert any `embedded-hal` pin error into ours.
    pub fn pin<E: embedded_hal::digital::Error>(err: E) -> Self {
        Error::Pin(err.kind())
    }
}

pub type Result<T> = core::result::Result<T, Error>;
