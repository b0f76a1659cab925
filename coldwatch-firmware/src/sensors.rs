//! Temperature source selected by `[sampling] sensor`

use coldwatch_core::traits::{SensorError, TemperatureSensor};
use coldwatch_core::Temperature;
use coldwatch_drivers::sensor::{
    AdcReader, BitBangOneWire, DieSensor, Ds18b20, DoorState, SimulatedSensor,
};
use embassy_rp::adc::{Adc, Blocking, Channel};
use embassy_rp::gpio::OutputOpenDrain;
use embassy_time::Delay;

/// DS18B20 on GPIO2 with an external 4.7k pull-up
pub type Probe = Ds18b20<BitBangOneWire<OutputOpenDrain<'static>, Delay>>;

/// Readings per simulated door phase
pub const SIMULATED_PHASE: u32 = 30;

/// ADC channel 4, the on-die diode
pub struct DieAdc {
    adc: Adc<'static, Blocking>,
    channel: Channel<'static>,
}

impl DieAdc {
    pub fn new(adc: Adc<'static, Blocking>, channel: Channel<'static>) -> Self {
        Self { adc, channel }
    }
}

impl AdcReader for DieAdc {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        self.adc
            .blocking_read(&mut self.channel)
            .map_err(|_| SensorError::ConversionError)
    }
}

/// Whichever sensor the configuration picked
pub enum AnySensor {
    Probe(Probe),
    Die(DieSensor<DieAdc>),
    Simulated(SimulatedSensor),
}

impl AnySensor {
    pub fn simulated(seed: u32) -> Self {
        AnySensor::Simulated(SimulatedSensor::cycling(
            seed,
            DoorState::Closed,
            SIMULATED_PHASE,
        ))
    }
}

impl TemperatureSensor for AnySensor {
    fn read(&mut self) -> Result<Temperature, SensorError> {
        match self {
            AnySensor::Probe(probe) => probe.read(),
            AnySensor::Die(die) => die.read(),
            AnySensor::Simulated(sim) => sim.read(),
        }
    }
}
