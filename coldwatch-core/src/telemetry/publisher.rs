//! Network bring-up and MQTT publishing

use core::fmt::Write;

use coldwatch_at::{command, AtClient, Command, TransportError};
use heapless::String;

use crate::anomaly::Classification;
use crate::config::{MqttConfig, StationConfig, WifiConfig};
use crate::temperature::Temperature;

/// Longest payload text the publisher formats itself
pub const MAX_PAYLOAD_LEN: usize = 16;

/// Errors raised while talking to the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PublishError {
    /// The modem answered `ERROR`
    Rejected,
    /// No reply to any of the attempts made
    Timeout { attempts: u8 },
    /// The command could not be built or carried
    Transport(TransportError),
}

impl From<TransportError> for PublishError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Rejected => PublishError::Rejected,
            TransportError::Timeout => PublishError::Timeout { attempts: 1 },
            other => PublishError::Transport(other),
        }
    }
}

/// Turns station events into ESP-AT commands
///
/// Configuration commands (mode, join, MQTT setup, connect, leave) are
/// idempotent and are re-issued on timeout up to `retry_attempts` more
/// times. A rejected command is never retried, nor is one the link could
/// not transmit. Publishes are sent once: a missed reading is skipped, not
/// queued. A reply too long to store in full still counts by its outcome.
pub struct Publisher<C> {
    client: C,
    wifi: WifiConfig,
    mqtt: MqttConfig,
    retry_attempts: u8,
}

impl<C: AtClient> Publisher<C> {
    pub fn new(client: C, config: &StationConfig) -> Self {
        Self {
            client,
            wifi: config.wifi.clone(),
            mqtt: config.mqtt.clone(),
            retry_attempts: config.transport.retry_attempts,
        }
    }

    /// Station mode, then join the access point
    pub fn join_network(&mut self) -> Result<(), PublishError> {
        self.configure(&command::station_mode()?)?;
        let join = command::join_access_point(&self.wifi.ssid, &self.wifi.passphrase)?;
        self.configure(&join)?;
        info!("joined access point {=str}", self.wifi.ssid.as_str());
        Ok(())
    }

    /// MQTT user configuration, then connect to the broker
    pub fn connect_broker(&mut self) -> Result<(), PublishError> {
        self.configure(&command::mqtt_user_config(&self.mqtt.client_id)?)?;
        let connect = command::mqtt_connect(&self.mqtt.host, self.mqtt.port, self.mqtt.reconnect)?;
        self.configure(&connect)?;
        info!(
            "connected to broker {=str}:{}",
            self.mqtt.host.as_str(),
            self.mqtt.port
        );
        Ok(())
    }

    /// Publish `OK` or `CHECK` on the status topic
    pub fn publish_classification(
        &mut self,
        classification: Classification,
    ) -> Result<(), PublishError> {
        let publish = command::mqtt_publish(&self.mqtt.status_topic, classification.payload())?;
        self.publish(&publish)
    }

    /// Publish a one-decimal temperature on the temperature topic
    pub fn publish_temperature(&mut self, temperature: Temperature) -> Result<(), PublishError> {
        // At most 12 characters ("-134217728.0")
        let mut payload: String<MAX_PAYLOAD_LEN> = String::new();
        write!(payload, "{}", temperature).map_err(|_| {
            PublishError::Transport(TransportError::CommandTooLong {
                len: MAX_PAYLOAD_LEN + 1,
            })
        })?;
        let publish = command::mqtt_publish(&self.mqtt.temperature_topic, &payload)?;
        self.publish(&publish)
    }

    /// Disconnect from the access point
    pub fn leave_network(&mut self) -> Result<(), PublishError> {
        self.configure(&command::disconnect_access_point()?)?;
        info!("left access point");
        Ok(())
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    pub fn into_client(self) -> C {
        self.client
    }

    fn configure(&mut self, command: &Command) -> Result<(), PublishError> {
        let attempts = self.retry_attempts.saturating_add(1);
        for attempt in 1..=attempts {
            match self.client.exchange(command)?.into_result() {
                Ok(()) => return Ok(()),
                Err(TransportError::Timeout) => {
                    warn!(
                        "no reply to {=str} (attempt {}/{})",
                        command.as_str(),
                        attempt,
                        attempts
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(PublishError::Timeout { attempts })
    }

    fn publish(&mut self, command: &Command) -> Result<(), PublishError> {
        self.client.exchange(command)?.into_result()?;
        Ok(())
    }
}
