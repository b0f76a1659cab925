//! UART serial link abstractions
//!
//! The AT transport moves one byte per pump from a single cooperative
//! loop, so the link is polled: it reports readiness and never blocks.

use embedded_io::{ErrorKind, Read, ReadReady, Write, WriteReady};

/// Errors reported by the physical serial link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Framing error (bad stop bit)
    Framing,
    /// Receiver overrun, a byte was lost in hardware
    Overrun,
    /// Parity mismatch
    Parity,
    /// Any other peripheral fault
    Other,
}

/// Polled serial link
///
/// Implemented by the firmware over the real UART and by host-side fakes
/// in tests.
pub trait SerialLink {
    /// Whether the transmitter can accept another byte right now
    fn tx_ready(&mut self) -> Result<bool, LinkError>;

    /// Hand one byte to the transmitter
    ///
    /// Only called after [`tx_ready`](Self::tx_ready) returned `true`.
    fn write_byte(&mut self, byte: u8) -> Result<(), LinkError>;

    /// Take one received byte, if one is waiting
    fn read_byte(&mut self) -> Result<Option<u8>, LinkError>;
}

impl<T: SerialLink + ?Sized> SerialLink for &mut T {
    fn tx_ready(&mut self) -> Result<bool, LinkError> {
        (**self).tx_ready()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), LinkError> {
        (**self).write_byte(byte)
    }

    fn read_byte(&mut self) -> Result<Option<u8>, LinkError> {
        (**self).read_byte()
    }
}

/// Adapter exposing an `embedded-io` port as a [`SerialLink`]
///
/// Readiness is taken from [`ReadReady`]/[`WriteReady`], so reads and
/// writes issued through the adapter never block.
pub struct IoLink<T> {
    inner: T,
}

impl<T> IoLink<T> {
    /// Wrap an `embedded-io` port
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Access the wrapped port
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Unwrap the port
    pub fn into_inner(self) -> T {
        self.inner
    }
}

fn map_io_error<E: embedded_io::Error>(e: E) -> LinkError {
    match e.kind() {
        ErrorKind::InvalidData => LinkError::Framing,
        ErrorKind::OutOfMemory => LinkError::Overrun,
        _ => LinkError::Other,
    }
}

impl<T> SerialLink for IoLink<T>
where
    T: Read + Write + ReadReady + WriteReady,
{
    fn tx_ready(&mut self) -> Result<bool, LinkError> {
        self.inner.write_ready().map_err(map_io_error)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), LinkError> {
        match self.inner.write(&[byte]) {
            Ok(1) => Ok(()),
            Ok(_) => Err(LinkError::Other),
            Err(e) => Err(map_io_error(e)),
        }
    }

    fn read_byte(&mut self) -> Result<Option<u8>, LinkError> {
        if !self.inner.read_ready().map_err(map_io_error)? {
            return Ok(None);
        }
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) => Err(map_io_error(e)),
        }
    }
}

/// UART line configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    /// ESP-AT factory settings: 115200 8N1, no flow control
    fn default() -> Self {
        Self {
            baudrate: 115_200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl UartConfig {
    /// Bits on the wire per character, including start and stop bits
    pub fn frame_bits(&self) -> u32 {
        let data = match self.data_bits {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
            DataBits::Nine => 9,
        };
        let parity = match self.parity {
            Parity::None => 0,
            Parity::Even | Parity::Odd => 1,
        };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        1 + data + parity + stop
    }

    /// Time one character occupies on the wire, in microseconds (rounded up)
    ///
    /// The control loop must pump at least this often to never leave a
    /// received byte waiting in the peripheral.
    pub fn char_time_us(&self) -> u32 {
        let bits = self.frame_bits() as u64 * 1_000_000;
        let baud = self.baudrate.max(1) as u64;
        bits.div_ceil(baud) as u32
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
    Nine,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}
