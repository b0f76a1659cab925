//! Cooperative byte channel over a polled serial link.
//!
//! The channel owns the transmit and receive ring buffers for one physical
//! link and moves bytes between them and the link whenever [`ByteChannel::pump`]
//! is called. There is no interrupt handler and no locking: the single
//! control loop that owns the channel must pump often enough that no
//! received byte waits in the peripheral long enough to be lost.
//!
//! Neither buffer ever overwrites unread data. A full transmit buffer
//! rejects [`ByteChannel::enqueue`]; a full receive buffer rejects the
//! incoming byte. Both surface as [`ChannelError::Overflow`].

use coldwatch_hal::{LinkError, SerialLink};
use heapless::{Deque, Vec};

use crate::matcher::{Reply, ResponseMatcher};

/// Transmit buffer capacity in bytes
pub const TX_BUFFER_SIZE: usize = 256;

/// Receive buffer capacity in bytes
pub const RX_BUFFER_SIZE: usize = 256;

/// Most bytes [`ByteChannel::drain_link`] discards in one call
///
/// A link that never runs dry (a modem stuck in a boot log loop) must not
/// keep the control loop from sending.
pub const DRAIN_LIMIT: usize = 4 * RX_BUFFER_SIZE;

/// Identifies one of the two channel buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Buffer {
    Transmit,
    Receive,
}

/// Errors raised while moving bytes through the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelError {
    /// A buffer was full; the byte was rejected, nothing was overwritten
    Overflow(Buffer),
    /// The physical link reported a fault
    Link(LinkError),
}

impl From<LinkError> for ChannelError {
    fn from(e: LinkError) -> Self {
        ChannelError::Link(e)
    }
}

/// Transmit/receive ring buffers bound to one serial link
pub struct ByteChannel<L> {
    link: L,
    tx: Deque<u8, TX_BUFFER_SIZE>,
    rx: Deque<u8, RX_BUFFER_SIZE>,
    matcher: ResponseMatcher,
}

impl<L: SerialLink> ByteChannel<L> {
    /// Create a channel with empty buffers
    pub fn new(link: L) -> Self {
        Self {
            link,
            tx: Deque::new(),
            rx: Deque::new(),
            matcher: ResponseMatcher::new(),
        }
    }

    /// Append one byte to the transmit buffer
    ///
    /// Fails with `Overflow(Transmit)` when the buffer is full; the caller
    /// is expected to [`pump`](Self::pump) and retry.
    pub fn enqueue(&mut self, byte: u8) -> Result<(), ChannelError> {
        self.tx
            .push_back(byte)
            .map_err(|_| ChannelError::Overflow(Buffer::Transmit))
    }

    /// Move at most one byte in each direction
    ///
    /// Sends the oldest pending transmit byte if the link is ready, then
    /// stores any received byte and feeds it to the reply matcher.
    ///
    /// Returns the reply recognized so far. A byte rejected because the
    /// receive buffer is full is still fed to the matcher, so the reply
    /// terminator is never missed; the overflow is reported as an error and
    /// the latched reply is returned by the next pump.
    pub fn pump(&mut self) -> Result<Option<Reply>, ChannelError> {
        if let Some(&byte) = self.tx.front() {
            if self.link.tx_ready()? {
                self.link.write_byte(byte)?;
                self.tx.pop_front();
            }
        }

        if let Some(byte) = self.link.read_byte()? {
            let stored = self.rx.push_back(byte).is_ok();
            let reply = self.matcher.feed(byte);
            if !stored {
                return Err(ChannelError::Overflow(Buffer::Receive));
            }
            return Ok(reply);
        }

        Ok(self.matcher.latched())
    }

    /// Read and discard whatever the link already holds
    ///
    /// Bytes that arrived before a command was sent (a late reply to an
    /// abandoned command, unsolicited status lines) belong to no exchange.
    /// They never reach the receive buffer or the matcher. Stops when the
    /// link reports nothing more, or after [`DRAIN_LIMIT`] bytes; returns
    /// how many were dropped.
    pub fn drain_link(&mut self) -> Result<usize, ChannelError> {
        let mut dropped = 0;
        while dropped < DRAIN_LIMIT {
            match self.link.read_byte()? {
                Some(_) => dropped += 1,
                None => break,
            }
        }
        Ok(dropped)
    }

    /// Pop the oldest unread received byte
    pub fn read(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    /// Copy of the unread received bytes, keeping only the trailing `max_len`
    ///
    /// The head of a reply is usually the command echo; the tail carries the
    /// terminator and any diagnostic line, so truncation drops from the front.
    pub fn tail(&self, max_len: usize) -> Vec<u8, RX_BUFFER_SIZE> {
        let skip = self.rx.len().saturating_sub(max_len);
        self.rx.iter().skip(skip).copied().collect()
    }

    /// Drop every unread received byte
    pub fn discard_received(&mut self) {
        self.rx.clear();
    }

    /// Drop every byte not yet handed to the link
    pub fn discard_pending(&mut self) {
        self.tx.clear();
    }

    /// Number of unread received bytes
    pub fn received_len(&self) -> usize {
        self.rx.len()
    }

    /// Number of bytes still waiting to be transmitted
    pub fn pending_tx(&self) -> usize {
        self.tx.len()
    }

    /// Whether another byte fits in the transmit buffer
    pub fn can_enqueue(&self) -> bool {
        !self.tx.is_full()
    }

    /// Reply recognized since the last matcher reset
    pub fn reply(&self) -> Option<Reply> {
        self.matcher.latched()
    }

    /// Clear reply recognition progress
    pub fn reset_matcher(&mut self) {
        self.matcher.reset();
    }

    /// Access the underlying link
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Release the underlying link
    pub fn into_link(self) -> L {
        self.link
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Link that echoes every transmitted byte back to the receiver
    struct Loopback {
        pending: Deque<u8, 4>,
        ready: bool,
    }

    impl Loopback {
        fn new() -> Self {
            Self {
                pending: Deque::new(),
                ready: true,
            }
        }
    }

    impl SerialLink for Loopback {
        fn tx_ready(&mut self) -> Result<bool, LinkError> {
            Ok(self.ready && !self.pending.is_full())
        }

        fn write_byte(&mut self, byte: u8) -> Result<(), LinkError> {
            self.pending.push_back(byte).map_err(|_| LinkError::Overrun)
        }

        fn read_byte(&mut self) -> Result<Option<u8>, LinkError> {
            Ok(self.pending.pop_front())
        }
    }

    #[test]
    fn test_enqueue_rejects_when_full() {
        let mut channel = ByteChannel::new(Loopback::new());
        for i in 0..TX_BUFFER_SIZE {
            channel.enqueue(i as u8).unwrap();
        }
        assert!(!channel.can_enqueue());
        assert_eq!(
            channel.enqueue(0xFF),
            Err(ChannelError::Overflow(Buffer::Transmit))
        );
        assert_eq!(channel.pending_tx(), TX_BUFFER_SIZE);

        // One pump frees one slot
        channel.pump().unwrap();
        assert!(channel.enqueue(0xFF).is_ok());
    }

    #[test]
    fn test_pump_holds_bytes_while_link_busy() {
        let mut channel = ByteChannel::new(Loopback::new());
        channel.link_mut().ready = false;
        channel.enqueue(b'A').unwrap();

        channel.pump().unwrap();
        assert_eq!(channel.pending_tx(), 1);
        assert_eq!(channel.read(), None);

        channel.link_mut().ready = true;
        channel.pump().unwrap();
        assert_eq!(channel.pending_tx(), 0);
        assert_eq!(channel.read(), Some(b'A'));
    }

    #[test]
    fn test_loopback_preserves_order() {
        let mut channel = ByteChannel::new(Loopback::new());
        for &b in b"AT+CWQAP\r\n" {
            channel.enqueue(b).unwrap();
        }
        while channel.pending_tx() > 0 {
            channel.pump().unwrap();
        }

        let mut out: Vec<u8, 16> = Vec::new();
        while let Some(b) = channel.read() {
            out.push(b).unwrap();
        }
        assert_eq!(&out[..], b"AT+CWQAP\r\n");
    }

    #[test]
    fn test_pump_reports_reply() {
        let mut channel = ByteChannel::new(Loopback::new());
        for &b in b"OK\r\n" {
            channel.enqueue(b).unwrap();
        }
        let mut last = None;
        for _ in 0..4 {
            last = channel.pump().unwrap();
        }
        assert_eq!(last, Some(Reply::Ok));

        // Latched until reset, even with nothing new arriving
        assert_eq!(channel.pump().unwrap(), Some(Reply::Ok));
        channel.reset_matcher();
        assert_eq!(channel.pump().unwrap(), None);
    }

    #[test]
    fn test_receive_overflow_rejects_byte() {
        let mut channel = ByteChannel::new(Loopback::new());
        let mut sent = 0usize;
        while sent < RX_BUFFER_SIZE {
            channel.enqueue(b'x').unwrap();
            channel.pump().unwrap();
            sent += 1;
        }
        assert_eq!(channel.received_len(), RX_BUFFER_SIZE);

        channel.enqueue(b'y').unwrap();
        assert_eq!(
            channel.pump(),
            Err(ChannelError::Overflow(Buffer::Receive))
        );
        // Unread data survived untouched
        assert_eq!(channel.received_len(), RX_BUFFER_SIZE);
        assert!(channel.tail(RX_BUFFER_SIZE).iter().all(|&b| b == b'x'));
    }

    #[test]
    fn test_overflowed_terminator_still_recognized() {
        let mut channel = ByteChannel::new(Loopback::new());
        for _ in 0..RX_BUFFER_SIZE - 2 {
            channel.enqueue(b'.').unwrap();
            channel.pump().unwrap();
        }
        for &b in b"OK\r\n" {
            channel.enqueue(b).unwrap();
            let _ = channel.pump();
        }
        assert_eq!(channel.reply(), Some(Reply::Ok));
    }

    #[test]
    fn test_drain_link_bypasses_buffer_and_matcher() {
        let mut channel = ByteChannel::new(Loopback::new());
        // Loopback holds what was written until it is read back
        for &b in b"OK\r\n" {
            channel.link_mut().write_byte(b).unwrap();
        }

        assert_eq!(channel.drain_link(), Ok(4));
        assert_eq!(channel.received_len(), 0);
        assert_eq!(channel.reply(), None);
        assert_eq!(channel.pump().unwrap(), None);
        assert_eq!(channel.drain_link(), Ok(0));
    }

    #[test]
    fn test_drain_link_is_bounded() {
        struct Babbler;

        impl SerialLink for Babbler {
            fn tx_ready(&mut self) -> Result<bool, LinkError> {
                Ok(true)
            }

            fn write_byte(&mut self, _byte: u8) -> Result<(), LinkError> {
                Ok(())
            }

            fn read_byte(&mut self) -> Result<Option<u8>, LinkError> {
                Ok(Some(b'.'))
            }
        }

        let mut channel = ByteChannel::new(Babbler);
        assert_eq!(channel.drain_link(), Ok(DRAIN_LIMIT));
    }

    #[test]
    fn test_tail_keeps_trailing_bytes() {
        let mut channel = ByteChannel::new(Loopback::new());
        for &b in b"echo\r\nOK\r\n" {
            channel.enqueue(b).unwrap();
            channel.pump().unwrap();
        }
        assert_eq!(&channel.tail(4)[..], b"OK\r\n");
        assert_eq!(&channel.tail(100)[..], b"echo\r\nOK\r\n");
        assert!(channel.tail(0).is_empty());

        // tail() does not consume
        assert_eq!(channel.received_len(), 10);
        channel.discard_received();
        assert_eq!(channel.received_len(), 0);
    }
}
