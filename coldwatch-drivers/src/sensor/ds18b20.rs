//! DS18B20 digital temperature probe
//!
//! Single probe on the bus, addressed with Skip ROM. Conversions run in the
//! background: each [`read`](TemperatureSensor::read) returns the result of
//! the previous conversion and starts the next one, so the sample period
//! must be at least the conversion time (750 ms at 12 bits).

use coldwatch_core::traits::{SensorError, TemperatureSensor};
use coldwatch_core::Temperature;

use super::onewire::OneWireBus;

/// Address the only device on the bus
pub const CMD_SKIP_ROM: u8 = 0xCC;

/// Start a temperature conversion
pub const CMD_CONVERT_T: u8 = 0x44;

/// Read the 9-byte scratchpad
pub const CMD_READ_SCRATCHPAD: u8 = 0xBE;

/// Register value before the first conversion completes (85 °C)
pub const POWER_ON_RAW: u16 = 0x0550;

/// Scratchpad length including the CRC byte
pub const SCRATCHPAD_LEN: usize = 9;

/// Lowest temperature the probe can report
const MIN_TEMP: Temperature = Temperature::from_celsius(-55);

/// Highest temperature the probe can report
const MAX_TEMP: Temperature = Temperature::from_celsius(125);

/// Dallas/Maxim CRC-8 (x^8 + x^5 + x^4 + 1, reflected)
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut b = byte;
        for _ in 0..8 {
            let mix = (crc ^ b) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            b >>= 1;
        }
    }
    crc
}

/// A CRC-checked scratchpad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Scratchpad {
    bytes: [u8; SCRATCHPAD_LEN],
}

impl Scratchpad {
    /// Validate a scratchpad read off the bus
    pub fn from_bytes(bytes: [u8; SCRATCHPAD_LEN]) -> Result<Self, SensorError> {
        // A shorted bus reads all zeros, which carries a valid CRC
        if bytes.iter().all(|&b| b == 0) {
            return Err(SensorError::NotPresent);
        }
        if crc8(&bytes[..8]) != bytes[8] {
            return Err(SensorError::CrcMismatch);
        }
        Ok(Self { bytes })
    }

    /// Conversion register, with bits undefined at the configured resolution cleared
    pub fn raw(&self) -> u16 {
        let raw = u16::from_le_bytes([self.bytes[0], self.bytes[1]]);
        let undefined_bits = 12 - self.resolution_bits();
        raw & !((1u16 << undefined_bits) - 1)
    }

    /// Configured resolution, 9 to 12 bits
    pub fn resolution_bits(&self) -> u8 {
        9 + ((self.bytes[4] >> 5) & 0x03)
    }

    /// Decoded temperature
    ///
    /// The power-on value means no conversion has completed yet.
    pub fn temperature(&self) -> Result<Temperature, SensorError> {
        let raw = self.raw();
        if raw == POWER_ON_RAW {
            return Err(SensorError::NotReady);
        }
        let t = Temperature::from_ds18b20_raw(raw);
        if t < MIN_TEMP || t > MAX_TEMP {
            return Err(SensorError::OutOfRange);
        }
        Ok(t)
    }
}

/// DS18B20 on a dedicated 1-Wire bus
pub struct Ds18b20<B> {
    bus: B,
}

impl<B: OneWireBus> Ds18b20<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Start a background conversion
    pub fn start_conversion(&mut self) -> Result<(), SensorError> {
        self.select()?;
        self.bus.write_byte(CMD_CONVERT_T)
    }

    /// Read and validate the scratchpad
    pub fn read_scratchpad(&mut self) -> Result<Scratchpad, SensorError> {
        self.select()?;
        self.bus.write_byte(CMD_READ_SCRATCHPAD)?;
        let mut bytes = [0u8; SCRATCHPAD_LEN];
        for b in bytes.iter_mut() {
            *b = self.bus.read_byte()?;
        }
        Scratchpad::from_bytes(bytes)
    }

    pub fn release(self) -> B {
        self.bus
    }

    fn select(&mut self) -> Result<(), SensorError> {
        if !self.bus.reset()? {
            return Err(SensorError::NotPresent);
        }
        self.bus.write_byte(CMD_SKIP_ROM)
    }
}

impl<B: OneWireBus> TemperatureSensor for Ds18b20<B> {
    fn read(&mut self) -> Result<Temperature, SensorError> {
        let scratchpad = self.read_scratchpad();
        if let Err(e) = &scratchpad {
            debug!("scratchpad read failed: {}", e);
        }
        // Keep conversions going even when this read failed
        self.start_conversion()?;
        scratchpad?.temperature()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::{Deque, Vec};

    /// Captured from a probe at 25.0625 °C, 12-bit
    const SCRATCHPAD_25C: [u8; 9] = [0x91, 0x01, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0x70];

    /// Power-on contents
    const SCRATCHPAD_POWER_ON: [u8; 9] = [0x50, 0x05, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0x1C];

    /// Bus with one probe that serves a fixed scratchpad
    struct FakeBus {
        present: bool,
        written: Vec<u8, 32>,
        reads: Deque<u8, 32>,
        scratchpad: [u8; 9],
    }

    impl FakeBus {
        fn new(scratchpad: [u8; 9]) -> Self {
            Self {
                present: true,
                written: Vec::new(),
                reads: Deque::new(),
                scratchpad,
            }
        }
    }

    impl OneWireBus for FakeBus {
        fn reset(&mut self) -> Result<bool, SensorError> {
            Ok(self.present)
        }

        fn write_byte(&mut self, byte: u8) -> Result<(), SensorError> {
            self.written.push(byte).unwrap();
            if byte == CMD_READ_SCRATCHPAD {
                for &b in &self.scratchpad {
                    self.reads.push_back(b).unwrap();
                }
            }
            Ok(())
        }

        fn read_byte(&mut self) -> Result<u8, SensorError> {
            Ok(self.reads.pop_front().unwrap_or(0xFF))
        }
    }

    #[test]
    fn test_crc8_reference_rom() {
        // ROM code from Maxim application note 27
        assert_eq!(crc8(&[0x02, 0x1C, 0xB8, 0x01, 0x00, 0x00, 0x00]), 0xA2);
        assert_eq!(crc8(&SCRATCHPAD_25C), 0);
    }

    #[test]
    fn test_decode_scratchpad() {
        let sp = Scratchpad::from_bytes(SCRATCHPAD_25C).unwrap();
        assert_eq!(sp.resolution_bits(), 12);
        assert_eq!(sp.raw(), 0x0191);
        assert_eq!(sp.temperature(), Ok(Temperature::from_sixteenths(401)));
    }

    #[test]
    fn test_low_resolution_masks_undefined_bits() {
        let mut bytes = SCRATCHPAD_25C;
        bytes[4] = 0x1F; // 9-bit
        bytes[8] = crc8(&bytes[..8]);
        let sp = Scratchpad::from_bytes(bytes).unwrap();
        assert_eq!(sp.resolution_bits(), 9);
        assert_eq!(sp.temperature(), Ok(Temperature::from_celsius(25)));
    }

    #[test]
    fn test_power_on_value_not_ready() {
        let sp = Scratchpad::from_bytes(SCRATCHPAD_POWER_ON).unwrap();
        assert_eq!(sp.temperature(), Err(SensorError::NotReady));
    }

    #[test]
    fn test_bad_crc_rejected() {
        let mut bytes = SCRATCHPAD_25C;
        bytes[0] ^= 0x01;
        assert_eq!(Scratchpad::from_bytes(bytes), Err(SensorError::CrcMismatch));
        assert_eq!(Scratchpad::from_bytes([0xFF; 9]), Err(SensorError::CrcMismatch));
        assert_eq!(Scratchpad::from_bytes([0x00; 9]), Err(SensorError::NotPresent));
    }

    #[test]
    fn test_read_then_restart_conversion() {
        let mut probe = Ds18b20::new(FakeBus::new(SCRATCHPAD_25C));
        assert_eq!(probe.read(), Ok(Temperature::from_sixteenths(401)));
        let bus = probe.release();
        assert_eq!(
            &bus.written[..],
            &[CMD_SKIP_ROM, CMD_READ_SCRATCHPAD, CMD_SKIP_ROM, CMD_CONVERT_T]
        );
    }

    #[test]
    fn test_first_read_after_boot() {
        let mut probe = Ds18b20::new(FakeBus::new(SCRATCHPAD_POWER_ON));
        assert_eq!(probe.read(), Err(SensorError::NotReady));
        // A conversion was still started for the next read
        assert_eq!(probe.release().written.last(), Some(&CMD_CONVERT_T));
    }

    #[test]
    fn test_missing_probe() {
        let mut bus = FakeBus::new(SCRATCHPAD_25C);
        bus.present = false;
        let mut probe = Ds18b20::new(bus);
        assert_eq!(probe.read(), Err(SensorError::NotPresent));
    }
}
