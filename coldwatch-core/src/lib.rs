//! Board-agnostic core logic for the appliance monitor
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Fixed-point temperature value
//! - Windowed anomaly detection against a one-shot baseline
//! - MQTT publishing over the AT transport
//! - Station session state machine (WiFi and broker bring-up)
//! - Configuration types and the embedded config parser
//! - Sensor abstraction trait

#![no_std]
#![deny(unsafe_code)]

// Logging shim macros, visible to every module below
#[macro_use]
extern crate coldwatch_hal;

pub mod anomaly;
pub mod config;
pub mod station;
pub mod telemetry;
pub mod temperature;
pub mod traits;

#[cfg(test)]
mod testing;

pub use temperature::Temperature;
