//! Station: detector, publisher and session state in one owner

use coldwatch_at::AtClient;

use super::events::Event;
use super::machine::SessionState;
use crate::anomaly::{AnomalyDetector, DetectorError, WindowReport, DEFAULT_WINDOW};
use crate::config::StationConfig;
use crate::telemetry::{PublishError, Publisher};
use crate::temperature::Temperature;

/// What happened to one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleOutcome {
    /// Window still filling
    Collecting,
    /// Window completed and both topics were published
    Published(WindowReport),
    /// Window completed but was not published (offline or publish failed)
    Unpublished(WindowReport),
}

/// One monitored appliance
///
/// Owns the detector, the publisher, and the session state. All methods
/// run to completion on the caller's control loop.
pub struct Station<C, const N: usize = DEFAULT_WINDOW> {
    publisher: Publisher<C>,
    detector: AnomalyDetector<N>,
    state: SessionState,
    failed_publishes: u8,
    max_failed_publishes: u8,
}

impl<C: AtClient, const N: usize> Station<C, N> {
    pub fn new(client: C, config: &StationConfig) -> Self {
        Self {
            publisher: Publisher::new(client, config),
            detector: AnomalyDetector::new(&config.detector),
            state: SessionState::Offline,
            failed_publishes: 0,
            max_failed_publishes: config.sampling.max_failed_publishes.max(1),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn detector(&self) -> &AnomalyDetector<N> {
        &self.detector
    }

    pub fn publisher_mut(&mut self) -> &mut Publisher<C> {
        &mut self.publisher
    }

    /// Run whichever bring-up steps are still missing
    ///
    /// Stops at the first step that fails; the next call starts from there.
    pub fn service(&mut self) -> SessionState {
        if self.state == SessionState::Offline {
            match self.publisher.join_network() {
                Ok(()) => self.apply(Event::NetworkJoined),
                Err(e) => {
                    warn!("network join failed: {}", e);
                    return self.state;
                }
            }
        }

        if self.state == SessionState::Associated {
            match self.publisher.connect_broker() {
                Ok(()) => self.apply(Event::BrokerConnected),
                Err(e) => warn!("broker connect failed: {}", e),
            }
        }

        self.state
    }

    /// Feed one reading; publish when it completes a window
    ///
    /// Publishing is skipped while not online. A publish failure is counted;
    /// after `max_failed_publishes` consecutive failures the session drops
    /// back to `Offline` so [`service`](Self::service) rebuilds it.
    pub fn on_sample(&mut self, sample: Temperature) -> Result<SampleOutcome, DetectorError> {
        let Some(report) = self.detector.record(sample)? else {
            return Ok(SampleOutcome::Collecting);
        };

        if !self.state.can_publish() {
            debug!("window complete while {}, not published", self.state);
            return Ok(SampleOutcome::Unpublished(report));
        }

        match self.publish(&report) {
            Ok(()) => {
                self.failed_publishes = 0;
                Ok(SampleOutcome::Published(report))
            }
            Err(e) => {
                self.failed_publishes = self.failed_publishes.saturating_add(1);
                warn!(
                    "publish failed ({}/{}): {}",
                    self.failed_publishes,
                    self.max_failed_publishes,
                    e
                );
                if self.failed_publishes >= self.max_failed_publishes {
                    self.failed_publishes = 0;
                    self.apply(Event::LinkLost);
                }
                Ok(SampleOutcome::Unpublished(report))
            }
        }
    }

    /// Leave the access point
    pub fn shutdown(&mut self) -> Result<(), PublishError> {
        if self.state == SessionState::Offline {
            return Ok(());
        }
        self.publisher.leave_network()?;
        self.apply(Event::NetworkLeft);
        Ok(())
    }

    fn publish(&mut self, report: &WindowReport) -> Result<(), PublishError> {
        self.publisher.publish_classification(report.classification)?;
        self.publisher.publish_temperature(report.mean)
    }

    fn apply(&mut self, event: Event) {
        let next = self.state.transition(event);
        if next != self.state {
            info!("session {} -> {}", self.state, next);
        }
        self.state = next;
    }
}
