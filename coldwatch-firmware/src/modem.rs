//! ESP-AT modem wiring
//!
//! UART0 on GPIO0 (TX) and GPIO1 (RX) at 115200 8N1, buffered by the
//! UART interrupt so replies keep arriving while the station loop waits.

use coldwatch_at::CommandTransport;
use coldwatch_hal::{IoLink, TickSource};
use embassy_rp::uart::{BufferedUart, Error as UartError};
use embassy_time::{Duration, Instant};
use embedded_io::{ErrorType, Read, ReadReady, Write, WriteReady};

/// Transport over the modem UART, ticking in milliseconds
pub type ModemTransport = CommandTransport<IoLink<ModemPort>, MillisClock>;

/// Buffered UART with write readiness
///
/// The transmit ring is larger than any single AT command, so a write of
/// one byte only waits when a previous command is still draining.
pub struct ModemPort {
    uart: BufferedUart,
}

impl ModemPort {
    pub fn new(uart: BufferedUart) -> Self {
        Self { uart }
    }
}

impl ErrorType for ModemPort {
    type Error = UartError;
}

impl Read for ModemPort {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.uart.read(buf)
    }
}

impl ReadReady for ModemPort {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        self.uart.read_ready()
    }
}

impl Write for ModemPort {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.uart.write(buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.uart.flush()
    }
}

impl WriteReady for ModemPort {
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// 1 kHz tick source over the embassy time driver
pub struct MillisClock {
    last: Instant,
}

impl MillisClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }
}

impl TickSource for MillisClock {
    fn elapsed_ticks(&mut self) -> u32 {
        let ms = self.last.elapsed().as_millis();
        // Carry the sub-millisecond remainder into the next call
        self.last += Duration::from_millis(ms);
        u32::try_from(ms).unwrap_or(u32::MAX)
    }

    fn restart(&mut self) {
        self.last = Instant::now();
    }
}
