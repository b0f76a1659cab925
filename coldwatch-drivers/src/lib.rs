//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the sensor trait
//! defined in coldwatch-core:
//!
//! - DS18B20 digital probe on a bit-banged 1-Wire bus
//! - RP2040 on-die temperature diode via the ADC
//! - Simulated appliance for bench testing without a probe

#![no_std]
#![deny(unsafe_code)]

// Logging shim macros, visible to every module below
#[macro_use]
extern crate coldwatch_hal;

pub mod sensor;
