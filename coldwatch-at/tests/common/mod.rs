//! Host-side fakes shared by the transport integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use coldwatch_hal::{LinkError, SerialLink, TickSource};

/// Link whose transmitter feeds straight back into its receiver
#[derive(Default)]
pub struct Loopback {
    wire: VecDeque<u8>,
    pub busy: bool,
}

impl SerialLink for Loopback {
    fn tx_ready(&mut self) -> Result<bool, LinkError> {
        Ok(!self.busy)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), LinkError> {
        self.wire.push_back(byte);
        Ok(())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, LinkError> {
        Ok(self.wire.pop_front())
    }
}

/// Fake modem answering each complete command line from a script
///
/// Every line terminated by `\r\n` pops the next scripted reply. With
/// `echo` on, the command line is sent back first, as ESP-AT does by
/// default. An exhausted script means the modem stays silent.
#[derive(Default)]
pub struct ScriptedModem {
    pub written: Vec<u8>,
    pub lines: Vec<Vec<u8>>,
    pub echo: bool,
    pub fault: Option<LinkError>,
    replies: VecDeque<Vec<u8>>,
    outbox: VecDeque<u8>,
    line: Vec<u8>,
}

impl ScriptedModem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_echo(mut self) -> Self {
        self.echo = true;
        self
    }

    pub fn reply(mut self, reply: &[u8]) -> Self {
        self.replies.push_back(reply.to_vec());
        self
    }

    /// Bytes the modem will send before any command arrives
    pub fn unsolicited(mut self, bytes: &[u8]) -> Self {
        self.outbox.extend(bytes.iter().copied());
        self
    }

    pub fn lines_str(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|l| String::from_utf8_lossy(l).into_owned())
            .collect()
    }
}

impl SerialLink for ScriptedModem {
    fn tx_ready(&mut self) -> Result<bool, LinkError> {
        match self.fault {
            Some(e) => Err(e),
            None => Ok(true),
        }
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), LinkError> {
        self.written.push(byte);
        self.line.push(byte);
        if self.line.ends_with(b"\r\n") {
            let line = std::mem::take(&mut self.line);
            if self.echo {
                self.outbox.extend(line.iter().copied());
            }
            self.lines.push(line[..line.len() - 2].to_vec());
            if let Some(reply) = self.replies.pop_front() {
                self.outbox.extend(reply);
            }
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, LinkError> {
        Ok(self.outbox.pop_front())
    }
}

/// Tick source advancing one tick per poll, observable from outside
#[derive(Clone, Default)]
pub struct StepTicks {
    now: Rc<Cell<u32>>,
}

impl StepTicks {
    pub fn now(&self) -> u32 {
        self.now.get()
    }
}

impl TickSource for StepTicks {
    fn elapsed_ticks(&mut self) -> u32 {
        self.now.set(self.now.get() + 1);
        1
    }

    // Time passes only while the transport polls
    fn restart(&mut self) {}
}

/// Free-running clock: ticks also pass between commands
///
/// Every poll costs one tick; [`advance`](Self::advance) models time spent
/// away from the transport, such as a sampling period.
#[derive(Clone, Default)]
pub struct WallTicks {
    now: Rc<Cell<u32>>,
    seen: u32,
}

impl WallTicks {
    pub fn now(&self) -> u32 {
        self.now.get()
    }

    pub fn advance(&self, ticks: u32) {
        self.now.set(self.now.get() + ticks);
    }
}

impl TickSource for WallTicks {
    fn elapsed_ticks(&mut self) -> u32 {
        self.advance(1);
        let elapsed = self.now() - self.seen;
        self.seen = self.now();
        elapsed
    }
}
