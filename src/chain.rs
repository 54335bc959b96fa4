//! Scan-chain discovery.  After a reset every TAP puts either its IDCODE or its one-bit BYPASS
//! register between TDI and TDO, and every instruction register captures a pattern ending in
//! `01`.  Both are enough to count the devices on the chain and learn their IR lengths without
//! knowing anything about them beforehand.
use alloc::vec::Vec;
use core::fmt;

use log::{debug, info};

use crate::cable::Cable;
use crate::error::{Error, Result};
use crate::statemachine::{JtagSM, Register};

/// Give up past this many devices; usually a sign TDO is stuck low.
pub const MAX_DEVICES: usize = 32;

/// A 32-bit IEEE 1149.1 device identification code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IdCode(pub u32);

impl IdCode {
    pub fn version(&self) -> u8 {
        (self.0 >> 28) as u8
    }

    pub fn part(&self) -> u16 {
        (self.0 >> 12) as u16
    }

    /// JEP106 manufacturer code, continuation bank in the upper four bits
    pub fn manufacturer(&self) -> u16 {
        ((self.0 >> 1) & 0x7ff) as u16
    }

    pub fn is_valid(&self) -> bool {
        self.0 & 1 == 1 && self.manufacturer() & 0x7f != 0x7f
    }
}

impl fmt::Display for IdCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Device {
    /// `None` for a TAP that comes out of reset in BYPASS
    pub idcode: Option<IdCode>,
    pub irlen: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Chain {
    /// Ordered from the TAP nearest TDO to the one nearest TDI.
    pub devices: Vec<Device>,
}

impl Chain {
    /// Work out the devices on the chain and their instruction register lengths.  Leaves the
    /// chain reset.
    pub fn detect<C: Cable>(sm: &mut JtagSM<C>) -> Result<Self> {
        let idcodes = scan_idcodes(sm)?;
        let irlens = detect_ir_lengths(sm)?;
        sm.mode_reset()?;

        if idcodes.len() != irlens.len() {
            return Err(Error::ChainMismatch { idcodes: idcodes.len(), irlens: irlens.len() });
        }

        let devices: Vec<Device> = idcodes
            .into_iter()
            .zip(irlens)
            .map(|(idcode, irlen)| Device { idcode, irlen })
            .collect();
        for (i, d) in devices.iter().enumerate() {
            match d.idcode {
                Some(id) => info!("tap {}: idcode {} irlen {}", i, id, d.irlen),
                None => info!("tap {}: no idcode, irlen {}", i, d.irlen),
            }
        }
        Ok(Chain { devices })
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Read every TAP's data register straight out of reset.  A leading 1 bit means a 32-bit IDCODE,
/// a 0 is a BYPASS register.  The scan ends when a whole word of the ones we feed in on TDI comes
/// back out.
pub fn scan_idcodes<C: Cable>(sm: &mut JtagSM<C>) -> Result<Vec<Option<IdCode>>> {
    sm.mode_reset()?;

    let mut ids = Vec::new();
    loop {
        let bit = sm.read_reg(Register::Data, 1)?;
        if bit[0] & 1 == 0 {
            debug!("tap {} is in bypass", ids.len());
            ids.push(None);
        } else {
            let bits = sm.read_reg(Register::Data, 31)?;
            let mut word = [0u8; 4];
            word.copy_from_slice(&bits[..4]);
            // Add back the one we read
            let idcode = (u32::from_le_bytes(word) << 1) | 1;
            if idcode == u32::MAX {
                break;
            }
            debug!("tap {} idcode {:#010x}", ids.len(), idcode);
            ids.push(Some(IdCode(idcode)));
        }

        if ids.len() > MAX_DEVICES {
            return Err(Error::ChainTooLong(MAX_DEVICES));
        }
    }
    Ok(ids)
}

/// Measure each instruction register from the Capture-IR pattern: every IR shifts out a 1
/// followed by zeros, so the distance between consecutive ones is one IR's length.  Two ones in
/// a row mean we're into the fill from TDI.
///
/// Only works for devices whose capture value is zero above the mandatory `01`.
pub fn detect_ir_lengths<C: Cable>(sm: &mut JtagSM<C>) -> Result<Vec<usize>> {
    sm.mode_reset()?;

    let mut irlens = Vec::new();
    // zeros seen since the last one
    let mut run: Option<usize> = None;
    for _ in 0..MAX_DEVICES * 64 {
        let bit = sm.read_reg(Register::Instruction, 1)?;
        if bit[0] & 1 == 1 {
            match run {
                Some(0) => return Ok(irlens),
                Some(zeros) => {
                    debug!("found IR len {}", zeros + 1);
                    irlens.push(zeros + 1);
                }
                None => {}
            }
            run = Some(0);
        } else if let Some(zeros) = run.as_mut() {
            *zeros += 1;
        }

        if irlens.len() > MAX_DEVICES {
            break;
        }
    }
    Err(Error::ChainTooLong(MAX_DEVICES))
}
