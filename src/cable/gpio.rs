//! Bit-bang JTAG over four GPIO pins.  Any pins implementing the `embedded-hal` digital traits
//! will do, so the same cable runs on a microcontroller or, through `cdev`, on a Linux host such
//! as the Raspberry Pi carrying a MATRIX Creator.
use alloc::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::cable::{check_shift, push_bit, Cable};
use crate::error::{Error, Result};

pub struct Gpio<Tck, Tdi, Tdo, Tms, Delay>
where
    Tck: OutputPin,
    Tdi: OutputPin,
    Tdo: InputPin,
    Tms: OutputPin,
    Delay: DelayNs,
{
    half_period: u32,
    delay: Delay,
    tck: Tck,
    tdi: Tdi,
    tdo: Tdo,
    tms: Tms,
}

impl<Tck, Tdi, Tdo, Tms, Delay> Gpio<Tck, Tdi, Tdo, Tms, Delay>
where
    Tck: OutputPin,
    Tdi: OutputPin,
    Tdo: InputPin,
    Tms: OutputPin,
    Delay: DelayNs,
{
    /// Build a cable clocking TCK at roughly `freq_khz`.  TCK is driven low straight away.
    pub fn new(freq_khz: u32, mut tck: Tck, tdi: Tdi, tdo: Tdo, tms: Tms, delay: Delay) -> Result<Self> {
        if freq_khz == 0 {
            return Err(Error::InvalidFrequency);
        }
        let period_ns = 1_000_000 / freq_khz;
        let half_period = period_ns / 2;
        tck.set_low().map_err(Error::pin)?;
        Ok(Gpio { half_period, delay, tck, tdi, tdo, tms })
    }

    pub fn half_period_ns(&self) -> u32 {
        self.half_period
    }

    /// Give the pins and delay back, in the order `new` takes them.
    pub fn release(self) -> (Tck, Tdi, Tdo, Tms, Delay) {
        (self.tck, self.tdi, self.tdo, self.tms, self.delay)
    }

    /// Run one TCK cycle and return the TDO level sampled on the rising edge.
    fn clock(&mut self, tms: bool, tdi: bool) -> Result<bool> {
        // clock starts low; TMS and TDI have to settle before the rising edge
        self.tms.set_state(PinState::from(tms)).map_err(Error::pin)?;
        self.tdi.set_state(PinState::from(tdi)).map_err(Error::pin)?;

        self.tck.set_high().map_err(Error::pin)?;
        let tdo = self.tdo.is_high().map_err(Error::pin)?;

        self.delay.delay_ns(self.half_period);
        self.tck.set_low().map_err(Error::pin)?;
        self.delay.delay_ns(self.half_period);
        Ok(tdo)
    }
}

impl<Tck, Tdi, Tdo, Tms, Delay> Cable for Gpio<Tck, Tdi, Tdo, Tms, Delay>
where
    Tck: OutputPin,
    Tdi: OutputPin,
    Tdo: InputPin,
    Tms: OutputPin,
    Delay: DelayNs,
{
    fn change_mode(&mut self, tms: &[bool], tdi: bool) -> Result<()> {
        for &t in tms {
            self.clock(t, tdi)?;
        }
        Ok(())
    }

    fn read_data(&mut self, bits: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(bits.div_ceil(8));
        for i in 0..bits {
            let tdo = self.clock(false, true)?;
            push_bit(&mut buf, i, tdo);
        }
        Ok(buf)
    }

    fn read_write_data(&mut self, data: &[u8], bits: u8, pause_after: bool) -> Result<Vec<u8>> {
        check_shift(data, bits)?;

        // every byte goes out whole except the last, of which only `bits` are sent, LSB first
        let total = (data.len() - 1) * 8 + bits as usize;
        let mut buf = Vec::with_capacity(data.len());
        for i in 0..total {
            let tdi = (data[i / 8] >> (i % 8)) & 1 == 1;
            // TMS high on the final bit leaves Shift for Exit1
            let tms = pause_after && i == total - 1;
            let tdo = self.clock(tms, tdi)?;
            push_bit(&mut buf, i, tdo);
        }

        if pause_after {
            // Exit1 -> Pause
            self.clock(false, true)?;
        }
        Ok(buf)
    }
}
