//! Events that trigger session transitions

/// Events that can trigger session transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Station mode set and access point joined
    NetworkJoined,
    /// MQTT configured and broker connected
    BrokerConnected,
    /// Too many consecutive publishes failed
    LinkLost,
    /// Access point left on request
    NetworkLeft,
}
