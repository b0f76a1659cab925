//! Bit-banged 1-Wire bus master
//!
//! Standard-speed timings from Maxim application note 126. The pin must be
//! open-drain with an external pull-up (4.7 kΩ): driving it high releases
//! the line, reading it samples the wire.

use coldwatch_core::traits::SensorError;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Byte-level access to a 1-Wire bus
pub trait OneWireBus {
    /// Issue a reset pulse; `true` if any device answered with presence
    fn reset(&mut self) -> Result<bool, SensorError>;

    /// Write one byte, least significant bit first
    fn write_byte(&mut self, byte: u8) -> Result<(), SensorError>;

    /// Read one byte, least significant bit first
    fn read_byte(&mut self) -> Result<u8, SensorError>;
}

/// 1-Wire master on one open-drain GPIO
pub struct BitBangOneWire<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> BitBangOneWire<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// Take the pin and release the bus
    pub fn new(mut pin: P, delay: D) -> Result<Self, SensorError> {
        pin.set_high().map_err(|_| SensorError::ConversionError)?;
        Ok(Self { pin, delay })
    }

    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }

    fn drive_low(&mut self) -> Result<(), SensorError> {
        self.pin.set_low().map_err(|_| SensorError::ConversionError)
    }

    fn let_go(&mut self) -> Result<(), SensorError> {
        self.pin.set_high().map_err(|_| SensorError::ConversionError)
    }

    fn sample(&mut self) -> Result<bool, SensorError> {
        self.pin.is_high().map_err(|_| SensorError::ConversionError)
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), SensorError> {
        self.drive_low()?;
        if bit {
            self.delay.delay_us(6);
            self.let_go()?;
            self.delay.delay_us(64);
        } else {
            self.delay.delay_us(60);
            self.let_go()?;
            self.delay.delay_us(10);
        }
        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool, SensorError> {
        self.drive_low()?;
        self.delay.delay_us(6);
        self.let_go()?;
        self.delay.delay_us(9);
        let bit = self.sample()?;
        self.delay.delay_us(55);
        Ok(bit)
    }
}

impl<P, D> OneWireBus for BitBangOneWire<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn reset(&mut self) -> Result<bool, SensorError> {
        // A bus held low cannot be reset
        if !self.sample()? {
            return Err(SensorError::NotPresent);
        }

        self.drive_low()?;
        self.delay.delay_us(480);
        self.let_go()?;
        self.delay.delay_us(70);
        let present = !self.sample()?;
        self.delay.delay_us(410);
        Ok(present)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), SensorError> {
        for i in 0..8 {
            self.write_bit(byte & (1 << i) != 0)?;
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, SensorError> {
        let mut byte = 0u8;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }
}
