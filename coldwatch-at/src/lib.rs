//! AT Command Transport
//!
//! This crate drives an ESP-AT WiFi modem over a polled serial link. It is
//! split into three layers, bottom-up:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ CommandTransport  one in-flight command,     │
//! │                   tick-budgeted timeout      │
//! ├──────────────────────────────────────────────┤
//! │ ByteChannel       TX/RX ring buffers,        │
//! │                   one byte each way per pump │
//! ├──────────────────────────────────────────────┤
//! │ ResponseMatcher   OK\r\n / ERROR\r\n         │
//! └──────────────────────────────────────────────┘
//!                       │
//!                 SerialLink (coldwatch-hal)
//! ```
//!
//! Every command is one line terminated with `\r\n`. The modem echoes the
//! command, may print diagnostic lines, and ends with exactly one of
//! `OK\r\n` or `ERROR\r\n`.
//!
//! Nothing here blocks on interrupts or allocates. The caller's control
//! loop owns the transport and pumps it.

#![no_std]
#![deny(unsafe_code)]

// Logging shim macros, visible to every module below
#[macro_use]
extern crate coldwatch_hal;

pub mod channel;
pub mod command;
pub mod matcher;
pub mod transport;

pub use channel::{
    Buffer, ByteChannel, ChannelError, DRAIN_LIMIT, RX_BUFFER_SIZE, TX_BUFFER_SIZE,
};
pub use command::Command;
pub use matcher::{MatchProgress, Reply, ResponseMatcher, REPLY_ERROR, REPLY_OK};
pub use transport::{
    AtClient, CommandTransport, ResponsePolicy, TransmitState, TransportConfig, TransportError,
    DEFAULT_TIMEOUT_TICKS, LINE_TERMINATOR, MAX_COMMAND_LEN,
};
