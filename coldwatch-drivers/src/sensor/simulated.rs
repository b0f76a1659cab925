//! Synthetic refrigerator readings
//!
//! Whole-degree readings drawn from a band that depends on the door: 23 to
//! 26 °C while closed, 10 to 15 °C while open. An optional schedule flips
//! the door every `n` readings so a bench board exercises both outcomes.

use coldwatch_core::traits::{SensorError, TemperatureSensor};
use coldwatch_core::Temperature;

/// Door position driving the simulated band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DoorState {
    Closed,
    Open,
}

impl DoorState {
    /// Inclusive band of whole degrees
    pub const fn band(self) -> (i16, i16) {
        match self {
            DoorState::Closed => (23, 26),
            DoorState::Open => (10, 15),
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            DoorState::Closed => DoorState::Open,
            DoorState::Open => DoorState::Closed,
        }
    }
}

/// Pseudo-random sensor (xorshift32)
pub struct SimulatedSensor {
    rng: u32,
    door: DoorState,
    /// Readings per door phase, if cycling
    phase_len: Option<u32>,
    remaining: u32,
}

impl SimulatedSensor {
    /// Door stays where it is put
    pub fn new(seed: u32, door: DoorState) -> Self {
        Self {
            // Zero is a fixed point of xorshift
            rng: if seed == 0 { 0x2545_F491 } else { seed },
            door,
            phase_len: None,
            remaining: 0,
        }
    }

    /// Door flips every `readings` readings, starting in `door`
    pub fn cycling(seed: u32, door: DoorState, readings: u32) -> Self {
        let readings = readings.max(1);
        Self {
            phase_len: Some(readings),
            remaining: readings,
            ..Self::new(seed, door)
        }
    }

    pub fn door(&self) -> DoorState {
        self.door
    }

    pub fn set_door(&mut self, door: DoorState) {
        self.door = door;
        if let Some(len) = self.phase_len {
            self.remaining = len;
        }
    }

    fn next_random(&mut self) -> u32 {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        x
    }

    fn advance_schedule(&mut self) {
        let Some(len) = self.phase_len else {
            return;
        };
        if self.remaining == 0 {
            self.door = self.door.toggled();
            self.remaining = len;
            debug!("simulated door now {}", self.door);
        }
        self.remaining -= 1;
    }
}

impl TemperatureSensor for SimulatedSensor {
    fn read(&mut self) -> Result<Temperature, SensorError> {
        self.advance_schedule();
        let (low, high) = self.door.band();
        let span = (high - low + 1) as u32;
        let offset = (self.next_random() % span) as i16;
        Ok(Temperature::from_celsius(low + offset))
    }
}
