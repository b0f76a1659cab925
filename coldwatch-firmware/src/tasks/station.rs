//! Sampling and publishing loop
//!
//! Every AT exchange blocks the task until the modem answers or the reply
//! budget runs out; received bytes are buffered by the UART interrupt in
//! the meantime. The station is the only task, so nothing else is starved.

use coldwatch_at::{command, AtClient, TransmitState, TransportError};
use coldwatch_core::station::{SampleOutcome, Station};
use coldwatch_core::traits::{SensorError, TemperatureSensor};
use defmt::*;
use embassy_time::{Duration, Ticker, Timer};

use crate::modem::ModemTransport;
use crate::sensors::AnySensor;

/// Station driving the modem UART
pub type ModemStation = Station<ModemTransport>;

/// Pause between modem pings at boot
const MODEM_RETRY_SECS: u64 = 1;

#[embassy_executor::task]
pub async fn station_task(mut station: ModemStation, mut sensor: AnySensor, period_ms: u32) {
    info!("Station task started");

    wait_for_modem(&mut station).await;
    station.service();

    let mut ticker = Ticker::every(Duration::from_millis(u64::from(period_ms)));

    loop {
        ticker.next().await;

        let sample = match sensor.read() {
            Ok(t) => t,
            Err(SensorError::NotReady) => {
                debug!("sensor conversion pending");
                continue;
            }
            Err(e) => {
                warn!("sensor read failed: {}", e);
                continue;
            }
        };
        trace!("sample {}", sample.celsius_x10());

        match station.on_sample(sample) {
            Ok(SampleOutcome::Collecting) => {}
            Ok(SampleOutcome::Published(report)) => {
                info!(
                    "window mean {} ({} bp) -> {=str}",
                    report.mean.celsius_x10(),
                    report.deviation_bp,
                    report.classification.payload()
                );
            }
            Ok(SampleOutcome::Unpublished(report)) => {
                warn!(
                    "window {=str} not published ({})",
                    report.classification.payload(),
                    station.state()
                );
            }
            Err(e) => warn!("window discarded: {}", e),
        }

        if !station.state().can_publish() {
            station.service();
        }
    }
}

/// Block until the modem answers a bare `AT`
async fn wait_for_modem(station: &mut ModemStation) {
    loop {
        match ping_modem(station.publisher_mut().client_mut()) {
            Ok(()) => {
                info!("Modem responding");
                return;
            }
            Err(e) => {
                warn!("Modem not responding: {}", e);
                Timer::after_secs(MODEM_RETRY_SECS).await;
            }
        }
    }
}

fn ping_modem(client: &mut ModemTransport) -> Result<(), TransportError> {
    client
        .exchange(&command::attention()?)
        .and_then(TransmitState::into_result)
}
