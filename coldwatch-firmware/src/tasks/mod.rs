//! Embassy async tasks

pub mod station;

pub use station::{station_task, ModemStation};
