//! RP2040 on-die temperature sensor
//!
//! The sensor sits on ADC channel 4. Per the datasheet (section 4.9.5):
//! T = 27 - (V_sense - 0.706) / 0.001721
//!
//! Accuracy is a few degrees and the reading tracks the die, not the air,
//! so this is a fallback for boards without a probe.

use coldwatch_core::traits::{SensorError, TemperatureSensor};
use coldwatch_core::temperature::{Temperature, SCALE};

/// ADC full scale (12-bit)
pub const ADC_COUNTS: i64 = 4096;

/// ADC reference in microvolts
pub const VREF_UV: i64 = 3_300_000;

/// Sense voltage at 27 °C, microvolts
const V27_UV: i64 = 706_000;

/// Slope in microvolts per degree
const SLOPE_UV_PER_C: i64 = 1_721;

const MIN_TEMP: Temperature = Temperature::from_celsius(-40);
const MAX_TEMP: Temperature = Temperature::from_celsius(125);

/// ADC reading trait for platform abstraction
pub trait AdcReader {
    /// Read one 12-bit conversion (0-4095)
    fn read_raw(&mut self) -> Result<u16, SensorError>;
}

/// Die sensor behind an [`AdcReader`]
pub struct DieSensor<A> {
    adc: A,
}

impl<A> DieSensor<A> {
    pub fn new(adc: A) -> Self {
        Self { adc }
    }

    /// Convert a raw conversion to a temperature
    pub fn convert(raw: u16) -> Result<Temperature, SensorError> {
        if i64::from(raw) >= ADC_COUNTS {
            return Err(SensorError::ConversionError);
        }
        let v_uv = i64::from(raw) * VREF_UV / ADC_COUNTS;
        let scale = i64::from(SCALE);
        let sixteenths = 27 * scale - (v_uv - V27_UV) * scale / SLOPE_UV_PER_C;

        let t = i32::try_from(sixteenths)
            .map(Temperature::from_sixteenths)
            .map_err(|_| SensorError::OutOfRange)?;
        if t < MIN_TEMP || t > MAX_TEMP {
            return Err(SensorError::OutOfRange);
        }
        Ok(t)
    }
}

impl<A: AdcReader> TemperatureSensor for DieSensor<A> {
    fn read(&mut self) -> Result<Temperature, SensorError> {
        let raw = self.adc.read_raw()?;
        Self::convert(raw)
    }
}
