//! Coldwatch - Appliance Temperature Watch Firmware
//!
//! Main firmware binary for RP2040 boards wired to an ESP-AT WiFi modem.
//! Samples a temperature sensor, compares each window against the first
//! one, and publishes `OK` or `CHECK` over MQTT.

#![no_std]
#![no_main]

use coldwatch_at::CommandTransport;
use coldwatch_core::config::SensorKind;
use coldwatch_core::station::Station;
use coldwatch_drivers::sensor::{BitBangOneWire, DieSensor, Ds18b20};
use coldwatch_hal::{IoLink, UartConfig as LinkConfig};
use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, OutputOpenDrain};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::{Delay, Instant};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use crate::modem::{MillisClock, ModemPort};
use crate::sensors::{AnySensor, DieAdc};

mod config;
mod modem;
mod sensors;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
// TX holds a whole command; RX holds a burst of unsolicited lines
static TX_BUF: StaticCell<[u8; 512]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 1024]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Coldwatch firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::load();
    info!(
        "Station: ssid={=str} broker={=str}:{} period={}ms",
        config.wifi.ssid.as_str(),
        config.mqtt.host.as_str(),
        config.mqtt.port,
        config.sampling.period_ms
    );

    // Setup UART0 for the modem (GPIO0 TX, GPIO1 RX)
    let link = LinkConfig::default();
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = link.baudrate;

    let tx_buf = TX_BUF.init([0u8; 512]);
    let rx_buf = RX_BUF.init([0u8; 1024]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    info!(
        "UART initialized for modem: {} baud, {}us per char",
        link.baudrate,
        link.char_time_us()
    );

    let transport = CommandTransport::new(
        IoLink::new(ModemPort::new(uart)),
        MillisClock::new(),
        config.transport.transport_config(),
    );
    let station = Station::new(transport, &config);

    // Sensor pin assignments are board-specific (1-Wire on GPIO2)
    let sensor = match config.sampling.sensor {
        SensorKind::Ds18b20 => {
            let pin = OutputOpenDrain::new(p.PIN_2, Level::High);
            match BitBangOneWire::new(pin, Delay) {
                Ok(bus) => AnySensor::Probe(Ds18b20::new(bus)),
                Err(e) => {
                    error!("1-Wire bus unusable ({}), simulating readings", e);
                    AnySensor::simulated(seed())
                }
            }
        }
        SensorKind::Die => {
            let adc = Adc::new_blocking(p.ADC, Default::default());
            let channel = Channel::new_temp_sensor(p.ADC_TEMP_SENSOR);
            AnySensor::Die(DieSensor::new(DieAdc::new(adc, channel)))
        }
        SensorKind::Simulated => AnySensor::simulated(seed()),
    };
    info!("Sensor: {}", config.sampling.sensor);

    spawner
        .spawn(tasks::station_task(
            station,
            sensor,
            config.sampling.period_ms,
        ))
        .unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Seed for simulated readings; boot timing varies enough for a bench
fn seed() -> u32 {
    Instant::now().as_ticks() as u32
}
