//! Temperature sensors

pub mod ds18b20;
pub mod onewire;
pub mod rp2040;
pub mod simulated;

pub use ds18b20::{crc8, Ds18b20, Scratchpad};
pub use onewire::{BitBangOneWire, OneWireBus};
pub use rp2040::{AdcReader, DieSensor};
pub use simulated::{DoorState, SimulatedSensor};
