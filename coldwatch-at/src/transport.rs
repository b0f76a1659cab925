//! Single in-flight AT command transport.
//!
//! Lifecycle of the one outstanding command:
//!
//! ```text
//! Idle ──send──▶ Awaiting ──OK\r\n────▶ Completed ──consumed──▶ Idle
//!                   │    ──ERROR\r\n─▶ Failed    ──consumed──▶ Idle
//!                   └────timeout─────▶ TimedOut  ──consumed──▶ Idle
//! ```
//!
//! There is no transition out of a terminal state other than consumption.
//! The transport never retries; a timed-out or rejected command is handed
//! back to the caller as an ordinary outcome.

use coldwatch_hal::{LinkError, SerialLink, TickSource};
use heapless::Vec;

use crate::channel::{Buffer, ByteChannel, ChannelError, RX_BUFFER_SIZE};
use crate::command::Command;
use crate::matcher::Reply;

/// Longest command payload accepted, excluding the line terminator
pub const MAX_COMMAND_LEN: usize = 255;

/// Terminator appended to every command
pub const LINE_TERMINATOR: &[u8; 2] = b"\r\n";

/// Default response budget in ticks (3 s at a 1 kHz tick)
pub const DEFAULT_TIMEOUT_TICKS: u32 = 3000;

/// Whether `send` waits for the reply terminator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponsePolicy {
    /// Return as soon as the command is queued
    FireAndForget,
    /// Pump until `OK`, `ERROR`, or the timeout budget runs out
    WaitForResponse,
}

/// State of the single outstanding command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitState {
    /// Nothing outstanding
    Idle,
    /// Command sent, no terminator seen yet
    Awaiting,
    /// `OK` received
    Completed,
    /// `ERROR` received
    Failed,
    /// No terminator within the timeout budget
    TimedOut,
}

impl TransmitState {
    /// Whether this state ends an exchange
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransmitState::Completed | TransmitState::Failed | TransmitState::TimedOut
        )
    }

    /// Treat anything other than `Completed` as an error
    ///
    /// `Idle` and `Awaiting` map to `Ok` as well: neither is a failure,
    /// the outcome is simply not known yet.
    pub fn into_result(self) -> Result<(), TransportError> {
        match self {
            TransmitState::Idle | TransmitState::Awaiting | TransmitState::Completed => Ok(()),
            TransmitState::Failed => Err(TransportError::Rejected),
            TransmitState::TimedOut => Err(TransportError::Timeout),
        }
    }
}

/// Errors surfaced by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Command longer than [`MAX_COMMAND_LEN`]; nothing was sent
    CommandTooLong { len: usize },
    /// A channel buffer was full
    BufferOverflow(Buffer),
    /// The reply outgrew the receive buffer
    ///
    /// The exchange still resolved: `outcome` is the consumed terminal
    /// state. Only the stored reply text is incomplete; its oldest bytes
    /// were kept and the rest dropped.
    ReplyOverflow { outcome: TransmitState },
    /// The link never drained the transmit buffer within the timeout budget;
    /// the partial command was dropped and no reply is pending
    TransmitStalled,
    /// The serial link reported a fault
    Link(LinkError),
    /// The modem answered `ERROR`
    Rejected,
    /// The modem did not answer within the timeout budget
    Timeout,
}

impl From<ChannelError> for TransportError {
    fn from(e: ChannelError) -> Self {
        match e {
            ChannelError::Overflow(buffer) => TransportError::BufferOverflow(buffer),
            ChannelError::Link(link) => TransportError::Link(link),
        }
    }
}

impl From<LinkError> for TransportError {
    fn from(e: LinkError) -> Self {
        TransportError::Link(e)
    }
}

/// Transport behavior resolved at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransportConfig {
    /// Response budget in ticks of the transport's tick source
    pub timeout_ticks: u32,
    /// Log every command and reply, not just failures
    pub verbose: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_ticks: DEFAULT_TIMEOUT_TICKS,
            verbose: false,
        }
    }
}

/// Anything that can carry AT commands to a modem
///
/// Implemented by [`CommandTransport`]; the application layer is written
/// against this trait so it can be exercised without a serial link.
pub trait AtClient {
    /// Send a raw command line (without terminator)
    fn send(
        &mut self,
        command: &[u8],
        policy: ResponsePolicy,
    ) -> Result<TransmitState, TransportError>;

    /// Trailing `max_len` bytes of the most recent reply
    fn last_response(&self, max_len: usize) -> Vec<u8, RX_BUFFER_SIZE>;

    /// Send a built command and wait for its reply
    fn execute(&mut self, command: &Command) -> Result<TransmitState, TransportError> {
        self.send(command.as_bytes(), ResponsePolicy::WaitForResponse)
    }

    /// Like [`execute`](Self::execute), but a reply that only outgrew the
    /// receive buffer still yields the state it resolved to
    fn exchange(&mut self, command: &Command) -> Result<TransmitState, TransportError> {
        match self.execute(command) {
            Err(TransportError::ReplyOverflow { outcome }) => Ok(outcome),
            other => other,
        }
    }
}

/// AT command transport over one serial link
///
/// Owns the link's [`ByteChannel`] and the state of the one outstanding
/// command. Only one command may be in flight: calling `send` while the
/// previous command is still `Awaiting` is a programming error.
pub struct CommandTransport<L, T> {
    channel: ByteChannel<L>,
    ticks: T,
    config: TransportConfig,
    state: TransmitState,
    rx_overflowed: bool,
}

impl<L: SerialLink, T: TickSource> CommandTransport<L, T> {
    /// Create a transport over `link`, timing waits with `ticks`
    pub fn new(link: L, ticks: T, config: TransportConfig) -> Self {
        Self {
            channel: ByteChannel::new(link),
            ticks,
            config,
            state: TransmitState::Idle,
            rx_overflowed: false,
        }
    }

    /// Current state, without consuming it
    pub fn state(&self) -> TransmitState {
        self.state
    }

    /// Transport configuration
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Send one command
    ///
    /// Validates the length, discards any stale received bytes (both those
    /// already buffered and those still waiting in the link), queues the
    /// command plus `\r\n`, and marks the command `Awaiting`. With
    /// [`ResponsePolicy::WaitForResponse`] it then pumps until the command
    /// resolves and returns the consumed terminal state; with
    /// [`ResponsePolicy::FireAndForget`] it returns `Awaiting` at once.
    pub fn send(
        &mut self,
        command: &[u8],
        policy: ResponsePolicy,
    ) -> Result<TransmitState, TransportError> {
        if command.len() > MAX_COMMAND_LEN {
            warn!("AT command rejected: {} bytes", command.len());
            return Err(TransportError::CommandTooLong { len: command.len() });
        }
        debug_assert!(
            self.state != TransmitState::Awaiting,
            "AT command sent while another is still awaiting its reply"
        );

        self.channel.discard_received();
        self.channel.reset_matcher();
        self.rx_overflowed = false;
        self.state = TransmitState::Idle;

        let stale = self.channel.drain_link()?;
        if stale > 0 {
            debug!("AT dropped {} stale bytes", stale);
        }

        if self.config.verbose {
            debug!("AT >> {=[u8]:a}", command);
        }

        for &byte in command.iter().chain(LINE_TERMINATOR.iter()) {
            if let Err(e) = self.enqueue_pumping(byte) {
                // Never leave half a line queued ahead of the next command
                self.channel.discard_pending();
                return Err(e);
            }
        }
        self.state = TransmitState::Awaiting;

        match policy {
            ResponsePolicy::FireAndForget => Ok(TransmitState::Awaiting),
            ResponsePolicy::WaitForResponse => self.await_response(),
        }
    }

    /// Block until the outstanding command resolves or times out
    ///
    /// The timeout budget starts when this is called. Returns the consumed
    /// terminal state; if nothing is outstanding, returns the current state
    /// unchanged. A link fault abandons the outstanding command and leaves
    /// the transport `Idle`. A reply that outgrew the receive buffer is
    /// reported as [`TransportError::ReplyOverflow`] carrying the outcome.
    pub fn await_response(&mut self) -> Result<TransmitState, TransportError> {
        self.ticks.restart();
        let mut waited: u32 = 0;

        while self.state == TransmitState::Awaiting {
            if let Err(e) = self.pump_channel() {
                warn!("AT command abandoned: {}", e);
                self.state = TransmitState::Idle;
                self.channel.discard_pending();
                self.channel.reset_matcher();
                return Err(e);
            }
            if self.state != TransmitState::Awaiting {
                break;
            }

            waited = waited.saturating_add(self.ticks.elapsed_ticks());
            if waited >= self.config.timeout_ticks {
                self.state = TransmitState::TimedOut;
            }
        }

        let outcome = self.take_state();
        self.log_outcome(outcome);

        if self.rx_overflowed {
            warn!("AT reply overflowed the receive buffer");
            return Err(TransportError::ReplyOverflow { outcome });
        }
        Ok(outcome)
    }

    /// Pump the channel once and report the (unconsumed) state
    ///
    /// For callers that sent with [`ResponsePolicy::FireAndForget`] and
    /// service the link from their own loop.
    pub fn poll(&mut self) -> Result<TransmitState, TransportError> {
        self.pump_channel()?;
        Ok(self.state)
    }

    /// Consume the current state
    ///
    /// A terminal state is returned once and the transport goes back to
    /// `Idle`, clearing reply recognition. `Idle` and `Awaiting` are
    /// returned unchanged.
    pub fn take_state(&mut self) -> TransmitState {
        match self.state {
            TransmitState::Idle | TransmitState::Awaiting => self.state,
            TransmitState::Completed | TransmitState::Failed | TransmitState::TimedOut => {
                let outcome = self.state;
                self.state = TransmitState::Idle;
                self.channel.reset_matcher();
                outcome
            }
        }
    }

    /// Trailing `max_len` bytes received since the last `send`
    pub fn last_response(&self, max_len: usize) -> Vec<u8, RX_BUFFER_SIZE> {
        self.channel.tail(max_len)
    }

    /// Access the byte channel
    pub fn channel_mut(&mut self) -> &mut ByteChannel<L> {
        &mut self.channel
    }

    /// Queue one byte, pumping while the transmit buffer is full
    ///
    /// The link draining the buffer is the only way out. The wait is bounded
    /// by the same tick budget as a reply so a dead UART cannot hang the
    /// control loop; running it out is [`TransportError::TransmitStalled`].
    fn enqueue_pumping(&mut self, byte: u8) -> Result<(), TransportError> {
        match self.channel.enqueue(byte) {
            Err(ChannelError::Overflow(Buffer::Transmit)) => {}
            other => return other.map_err(TransportError::from),
        }

        self.ticks.restart();
        let mut waited: u32 = 0;
        loop {
            self.pump_channel()?;
            match self.channel.enqueue(byte) {
                Ok(()) => return Ok(()),
                Err(ChannelError::Overflow(Buffer::Transmit)) => {}
                Err(e) => return Err(e.into()),
            }

            waited = waited.saturating_add(self.ticks.elapsed_ticks());
            if waited >= self.config.timeout_ticks {
                warn!("AT transmit stalled, link not draining");
                return Err(TransportError::TransmitStalled);
            }
        }
    }

    /// Pump once, applying any recognized reply to the state
    fn pump_channel(&mut self) -> Result<(), TransportError> {
        let reply = match self.channel.pump() {
            Ok(reply) => reply,
            Err(ChannelError::Overflow(Buffer::Receive)) => {
                self.rx_overflowed = true;
                self.channel.reply()
            }
            Err(e) => return Err(e.into()),
        };

        if let (TransmitState::Awaiting, Some(reply)) = (self.state, reply) {
            self.state = match reply {
                Reply::Ok => TransmitState::Completed,
                Reply::Error => TransmitState::Failed,
            };
        }
        Ok(())
    }

    fn log_outcome(&self, outcome: TransmitState) {
        match outcome {
            TransmitState::Completed => {
                if self.config.verbose {
                    debug!("AT << {=[u8]:a}", &self.channel.tail(RX_BUFFER_SIZE)[..]);
                }
            }
            TransmitState::Failed => {
                warn!("AT << ERROR: {=[u8]:a}", &self.channel.tail(64)[..]);
            }
            TransmitState::TimedOut => {
                warn!("AT reply timed out after {} ticks", self.config.timeout_ticks);
            }
            TransmitState::Idle | TransmitState::Awaiting => {}
        }
    }
}

impl<L: SerialLink, T: TickSource> AtClient for CommandTransport<L, T> {
    fn send(
        &mut self,
        command: &[u8],
        policy: ResponsePolicy,
    ) -> Result<TransmitState, TransportError> {
        CommandTransport::send(self, command, policy)
    }

    fn last_response(&self, max_len: usize) -> Vec<u8, RX_BUFFER_SIZE> {
        CommandTransport::last_response(self, max_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Deque;

    /// Modem that answers every complete line with a canned reply
    struct CannedModem {
        written: Vec<u8, 512>,
        reply: &'static [u8],
        outbox: Deque<u8, 64>,
    }

    impl CannedModem {
        fn new(reply: &'static [u8]) -> Self {
            Self {
                written: Vec::new(),
                reply,
                outbox: Deque::new(),
            }
        }
    }

    impl SerialLink for CannedModem {
        fn tx_ready(&mut self) -> Result<bool, LinkError> {
            Ok(true)
        }

        fn write_byte(&mut self, byte: u8) -> Result<(), LinkError> {
            self.written.push(byte).map_err(|_| LinkError::Overrun)?;
            if self.written.ends_with(LINE_TERMINATOR) {
                for &b in self.reply {
                    let _ = self.outbox.push_back(b);
                }
            }
            Ok(())
        }

        fn read_byte(&mut self) -> Result<Option<u8>, LinkError> {
            Ok(self.outbox.pop_front())
        }
    }

    /// One tick per poll
    struct Stepper(u32);

    impl TickSource for Stepper {
        fn elapsed_ticks(&mut self) -> u32 {
            self.0 += 1;
            1
        }

        // Time passes only while the transport polls
        fn restart(&mut self) {}
    }

    fn transport(
        reply: &'static [u8],
        timeout_ticks: u32,
    ) -> CommandTransport<CannedModem, Stepper> {
        CommandTransport::new(
            CannedModem::new(reply),
            Stepper(0),
            TransportConfig {
                timeout_ticks,
                verbose: true,
            },
        )
    }

    #[test]
    fn test_completed_then_idle() {
        let mut t = transport(b"\r\nOK\r\n", 100);
        let outcome = t.send(b"AT", ResponsePolicy::WaitForResponse).unwrap();
        assert_eq!(outcome, TransmitState::Completed);
        assert_eq!(t.state(), TransmitState::Idle);
        assert_eq!(&t.channel_mut().link_mut().written[..], b"AT\r\n");
    }

    #[test]
    fn test_failed_keeps_diagnostic() {
        let mut t = transport(b"busy p...\r\nERROR\r\n", 100);
        let outcome = t
            .send(b"AT+CWJAP=\"x\",\"y\"", ResponsePolicy::WaitForResponse)
            .unwrap();
        assert_eq!(outcome, TransmitState::Failed);
        assert_eq!(outcome.into_result(), Err(TransportError::Rejected));
        assert_eq!(&t.last_response(7)[..], b"ERROR\r\n");
    }

    #[test]
    fn test_too_long_does_no_io() {
        let mut t = transport(b"OK\r\n", 100);
        let command = [b'A'; MAX_COMMAND_LEN + 1];
        assert_eq!(
            t.send(&command, ResponsePolicy::WaitForResponse),
            Err(TransportError::CommandTooLong { len: 256 })
        );
        assert!(t.channel_mut().link_mut().written.is_empty());
        assert_eq!(t.state(), TransmitState::Idle);
    }

    #[test]
    fn test_timeout_budget_is_exact() {
        let mut t = transport(b"", 50);
        let outcome = t.send(b"AT", ResponsePolicy::WaitForResponse).unwrap();
        assert_eq!(outcome, TransmitState::TimedOut);
        assert_eq!(t.ticks.0, 50);
        assert_eq!(t.state(), TransmitState::Idle);
    }

    #[test]
    fn test_stale_link_bytes_dropped_before_send() {
        let mut t = transport(b"\r\nERROR\r\n", 100);
        // Late terminator from an earlier exchange, never polled in
        for &b in b"\r\nOK\r\n" {
            t.channel_mut().link_mut().outbox.push_back(b).unwrap();
        }

        let outcome = t.send(b"AT+CWJAP?", ResponsePolicy::WaitForResponse).unwrap();
        assert_eq!(outcome, TransmitState::Failed);
        assert_eq!(&t.last_response(64)[..], b"\r\nERROR\r\n");
    }

    #[test]
    fn test_fire_and_forget_then_poll() {
        let mut t = transport(b"OK\r\n", 100);
        let state = t.send(b"AT+CWQAP", ResponsePolicy::FireAndForget).unwrap();
        assert_eq!(state, TransmitState::Awaiting);

        let mut polled = TransmitState::Awaiting;
        for _ in 0..32 {
            polled = t.poll().unwrap();
            if polled.is_terminal() {
                break;
            }
        }
        assert_eq!(polled, TransmitState::Completed);

        // Read once, then back to Idle
        assert_eq!(t.take_state(), TransmitState::Completed);
        assert_eq!(t.take_state(), TransmitState::Idle);
    }

    #[test]
    fn test_into_result() {
        assert_eq!(TransmitState::Completed.into_result(), Ok(()));
        assert_eq!(
            TransmitState::TimedOut.into_result(),
            Err(TransportError::Timeout)
        );
        assert!(!TransmitState::Awaiting.is_terminal());
        assert!(TransmitState::Failed.is_terminal());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "still awaiting")]
    fn test_second_in_flight_command_asserts() {
        let mut t = transport(b"", 100);
        t.send(b"AT", ResponsePolicy::FireAndForget).unwrap();
        let _ = t.send(b"AT", ResponsePolicy::FireAndForget);
    }
}
