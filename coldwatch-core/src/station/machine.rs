//! Session state machine definition

use super::events::Event;

/// Network session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// Not associated with an access point
    #[default]
    Offline,
    /// Joined the access point, broker not connected
    Associated,
    /// Broker connected, publishing
    Online,
}

impl SessionState {
    /// Check if window results can be published
    pub fn can_publish(&self) -> bool {
        matches!(self, SessionState::Online)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use SessionState::*;

        match (self, event) {
            (Offline, NetworkJoined) => Associated,

            (Associated, BrokerConnected) => Online,
            (Associated, LinkLost) => Offline,
            (Associated, NetworkLeft) => Offline,

            (Online, LinkLost) => Offline,
            (Online, NetworkLeft) => Offline,

            // Default: stay in current state
            _ => self,
        }
    }
}
