//! Pin assignments for the MATRIX Creator JTAG header.
//!
//! The board routes its FPGA's JTAG port to four GPIO pins on the Raspberry Pi header.  Which
//! four depends on the board revision, so the known sets are collected in `Variant` and any of
//! them (or a custom set) can be picked at run time.  Pin numbers are BCM numbers, not physical
//! header positions.
use core::fmt;
use core::str::FromStr;

use alloc::string::ToString;

use crate::error::{Error, Result};

/// Highest BCM pin broken out on the 40-pin header.
pub const MAX_HEADER_PIN: u8 = 27;

/// Environment variable consulted by `PinMap::from_env`.
pub const PINS_ENV: &str = "MATRIX_JTAG_PINS";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Signal {
    /// Mode select
    Tms,
    /// Clock
    Tck,
    /// Data into the chain
    Tdi,
    /// Data out of the chain
    Tdo,
}

impl Signal {
    pub const ALL: [Signal; 4] = [Signal::Tms, Signal::Tck, Signal::Tdi, Signal::Tdo];
}

/// The GPIO pin driving each JTAG signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinMap {
    pub tms: u8,
    pub tck: u8,
    pub tdi: u8,
    pub tdo: u8,
}

/// First revision wiring.
pub const MATRIX_CREATOR_ORIGINAL: PinMap = PinMap::new(4, 17, 27, 22);
/// Current wiring, and the default.
pub const MATRIX_CREATOR_FAST: PinMap = PinMap::new(26, 16, 21, 20);
pub const MATRIX_CREATOR_SLOW: PinMap = PinMap::new(25, 11, 10, 9);

impl PinMap {
    /// Pins are given in the order TMS, TCK, TDI, TDO.
    pub const fn new(tms: u8, tck: u8, tdi: u8, tdo: u8) -> Self {
        Self { tms, tck, tdi, tdo }
    }

    pub fn pin(&self, signal: Signal) -> u8 {
        match signal {
            Signal::Tms => self.tms,
            Signal::Tck => self.tck,
            Signal::Tdi => self.tdi,
            Signal::Tdo => self.tdo,
        }
    }

    /// The pins in TMS, TCK, TDI, TDO order
    pub fn as_array(&self) -> [u8; 4] {
        [self.tms, self.tck, self.tdi, self.tdo]
    }

    /// Check that every pin is on the header and that no pin is used twice.
    pub fn validate(&self) -> Result<()> {
        for (i, &first) in Signal::ALL.iter().enumerate() {
            let pin = self.pin(first);
            if pin > MAX_HEADER_PIN {
                return Err(Error::PinOutOfRange { signal: first, pin, max: MAX_HEADER_PIN });
            }
            for &second in &Signal::ALL[i + 1..] {
                if self.pin(second) == pin {
                    return Err(Error::DuplicatePin { pin, first, second });
                }
            }
        }
        Ok(())
    }

    /// Read the pin set from `MATRIX_JTAG_PINS`, falling back to the default variant only when
    /// the variable is unset.
    #[cfg(feature = "std")]
    pub fn from_env() -> Result<Self> {
        use std::env::VarError;

        match std::env::var(PINS_ENV) {
            Ok(value) => value.parse(),
            Err(VarError::NotPresent) => Ok(Variant::default().pins()),
            Err(VarError::NotUnicode(value)) => {
                Err(Error::InvalidPinList(value.to_string_lossy().into_owned()))
            }
        }
    }
}

impl Default for PinMap {
    fn default() -> Self {
        Variant::default().pins()
    }
}

impl fmt::Display for PinMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TMS={} TCK={} TDI={} TDO={}", self.tms, self.tck, self.tdi, self.tdo)
    }
}

/// Accepts either a variant name or four comma separated pin numbers (`tms,tck,tdi,tdo`).
impl FromStr for PinMap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if !s.contains(',') {
            return Ok(s.parse::<Variant>()?.pins());
        }

        let mut pins = [0u8; 4];
        let mut fields = s.split(',');
        for pin in pins.iter_mut() {
            let field = fields.next().ok_or_else(|| Error::InvalidPinList(s.to_string()))?;
            *pin = field.trim().parse().map_err(|_| Error::InvalidPinList(s.to_string()))?;
        }
        if fields.next().is_some() {
            return Err(Error::InvalidPinList(s.to_string()));
        }

        let map = PinMap::new(pins[0], pins[1], pins[2], pins[3]);
        map.validate()?;
        Ok(map)
    }
}

/// Known MATRIX Creator pin sets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Variant {
    Original,
    #[default]
    Fast,
    Slow,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Original, Variant::Fast, Variant::Slow];

    pub fn pins(self) -> PinMap {
        match self {
            Variant::Original => MATRIX_CREATOR_ORIGINAL,
            Variant::Fast => MATRIX_CREATOR_FAST,
            Variant::Slow => MATRIX_CREATOR_SLOW,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Variant::Original => "original",
            Variant::Fast => "fast",
            Variant::Slow => "slow",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("original") || s.eq_ignore_ascii_case("a") {
            Ok(Variant::Original)
        } else if s.eq_ignore_ascii_case("fast") || s.eq_ignore_ascii_case("b") {
            Ok(Variant::Fast)
        } else if s.eq_ignore_ascii_case("slow") || s.eq_ignore_ascii_case("c") {
            Ok(Variant::Slow)
        } else {
            Err(Error::UnknownVariant(s.to_string()))
        }
    }
}
