//! Temperature sensor trait

use crate::temperature::Temperature;

/// Errors that can occur with temperature sensing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// No device answered on the bus
    NotPresent,
    /// Device present but no conversion has completed yet
    NotReady,
    /// Data failed its integrity check
    CrcMismatch,
    /// Reading out of the sensor's physical range
    OutOfRange,
    /// ADC or bus transfer failed
    ConversionError,
}

/// Trait for temperature sensors
///
/// Implementations handle the specific sensor type (digital one-wire
/// probe, on-die diode, simulation).
pub trait TemperatureSensor {
    /// Read the current temperature
    ///
    /// Takes `&mut self` because bus transfers and ADC reads typically
    /// require mutable access.
    fn read(&mut self) -> Result<Temperature, SensorError>;

    /// Read the current temperature in tenths of a degree
    fn read_celsius_x10(&mut self) -> Result<i32, SensorError> {
        self.read().map(Temperature::celsius_x10)
    }

    /// Check if the sensor reading is valid
    fn is_valid(&mut self) -> bool {
        self.read().is_ok()
    }
}

impl<T: TemperatureSensor + ?Sized> TemperatureSensor for &mut T {
    fn read(&mut self) -> Result<Temperature, SensorError> {
        (**self).read()
    }
}
