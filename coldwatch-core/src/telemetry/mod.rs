//! MQTT telemetry over the AT transport
//!
//! The publisher turns station events into ESP-AT commands. It owns the
//! retry policy: the transport below it never retries.

pub mod publisher;

pub use publisher::{PublishError, Publisher, MAX_PAYLOAD_LEN};
