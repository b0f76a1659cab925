//! Configuration type definitions
//!
//! These types represent the station configuration. The firmware embeds it
//! as TOML at build time and parses it with [`super::toml`] at boot.

use heapless::String;

use crate::anomaly::{DEFAULT_MIN_BASELINE, DEFAULT_THRESHOLD_PERCENT};
use crate::temperature::Temperature;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum SSID length (802.11)
pub const MAX_SSID_LEN: usize = 32;

/// Maximum WPA2 passphrase length
pub const MAX_PASSPHRASE_LEN: usize = 64;

/// Maximum broker host name length
pub const MAX_HOST_LEN: usize = 64;

/// Maximum MQTT client identifier length (MQTT 3.1)
pub const MAX_CLIENT_ID_LEN: usize = 23;

/// Maximum MQTT topic length
pub const MAX_TOPIC_LEN: usize = 64;

/// WiFi access point credentials
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WifiConfig {
    pub ssid: String<MAX_SSID_LEN>,
    pub passphrase: String<MAX_PASSPHRASE_LEN>,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: fixed("MyNetwork"),
            passphrase: fixed("SuperSecretPassword"),
        }
    }
}

/// MQTT broker and topics
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MqttConfig {
    /// Broker host name or IPv4 address
    pub host: String<MAX_HOST_LEN>,
    /// Broker TCP port
    pub port: u16,
    pub client_id: String<MAX_CLIENT_ID_LEN>,
    /// Let the modem reconnect to the broker on its own
    pub reconnect: bool,
    /// Topic receiving "OK"/"CHECK"
    pub status_topic: String<MAX_TOPIC_LEN>,
    /// Topic receiving the window mean temperature
    pub temperature_topic: String<MAX_TOPIC_LEN>,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: fixed("192.168.0.1"),
            port: 1883,
            client_id: fixed("forgot-001"),
            reconnect: false,
            status_topic: fixed("home/sensors/forgot/refrigerator/1"),
            temperature_topic: fixed("home/sensors/temperature/refrigerator/1"),
        }
    }
}

/// Anomaly detector tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectorConfig {
    /// Drop below baseline that counts as an anomaly (percent, exclusive)
    pub threshold_percent: u8,
    /// Smallest baseline magnitude accepted
    pub min_baseline: Temperature,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold_percent: DEFAULT_THRESHOLD_PERCENT,
            min_baseline: DEFAULT_MIN_BASELINE,
        }
    }
}

/// AT transport behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransportSettings {
    /// Reply budget in milliseconds (the firmware ticks at 1 kHz)
    pub timeout_ms: u32,
    /// Log every command and reply
    pub verbose: bool,
    /// Re-issues of a timed-out configuration command
    pub retry_attempts: u8,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout_ms: coldwatch_at::DEFAULT_TIMEOUT_TICKS,
            verbose: false,
            retry_attempts: 3,
        }
    }
}

impl TransportSettings {
    pub fn transport_config(&self) -> coldwatch_at::TransportConfig {
        coldwatch_at::TransportConfig {
            timeout_ticks: self.timeout_ms,
            verbose: self.verbose,
        }
    }
}

/// Which temperature source the station samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SensorKind {
    /// DS18B20 probe on the 1-Wire pin
    #[default]
    Ds18b20,
    /// Microcontroller die sensor
    Die,
    /// Synthetic readings for bench testing
    Simulated,
}

impl SensorKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ds18b20" => Some(Self::Ds18b20),
            "die" => Some(Self::Die),
            "simulated" => Some(Self::Simulated),
            _ => None,
        }
    }
}

/// Sampling schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SamplingConfig {
    /// Time between sensor reads
    pub period_ms: u32,
    /// Consecutive failed publishes before the session is considered lost
    pub max_failed_publishes: u8,
    pub sensor: SensorKind,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            period_ms: 1000,
            max_failed_publishes: 3,
            sensor: SensorKind::Ds18b20,
        }
    }
}

/// Complete station configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StationConfig {
    pub wifi: WifiConfig,
    pub mqtt: MqttConfig,
    pub detector: DetectorConfig,
    pub transport: TransportSettings,
    pub sampling: SamplingConfig,
}

/// Build a default string; values are compile-time constants that fit
fn fixed<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
