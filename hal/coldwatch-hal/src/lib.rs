//! Coldwatch Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits that the AT command
//! transport is written against. Chip-specific code (the RP2040 firmware,
//! host-side fakes in tests) implements them, so the protocol and the
//! application logic never touch a peripheral directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  coldwatch-core (station, publisher)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  coldwatch-at (channel, transport)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  coldwatch-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  firmware     │       │  test fakes   │
//! │  (embassy-rp) │       │  (host)       │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::SerialLink`] - Polled, byte-at-a-time serial link
//! - [`tick::TickSource`] - Periodic tick counter used to bound waits
//!
//! It also carries the `defmt` logging shim (`trace!` through `error!`)
//! used by the other coldwatch library crates.

#![no_std]
#![deny(unsafe_code)]

mod fmt;

pub mod tick;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use tick::TickSource;
pub use uart::{IoLink, LinkError, SerialLink, UartConfig};
