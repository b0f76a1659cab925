//! ESP-AT command builders.
//!
//! Each builder renders one command line (without the `\r\n` terminator)
//! into a fixed-capacity buffer. String parameters are quoted, and the
//! characters ESP-AT treats specially inside quotes (`"`, `,` and `\`) are
//! escaped with a backslash.

use core::fmt::{self, Write};

use heapless::String;

use crate::transport::{TransportError, MAX_COMMAND_LEN};

/// A rendered AT command line, at most [`MAX_COMMAND_LEN`] bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    line: String<MAX_COMMAND_LEN>,
}

impl Command {
    /// Render a command from format arguments
    ///
    /// The length is measured before anything is written, so an oversized
    /// command reports its full length.
    pub fn from_fmt(args: fmt::Arguments<'_>) -> Result<Self, TransportError> {
        let mut counter = LengthCounter(0);
        // LengthCounter never fails; only a Display impl could
        let _ = counter.write_fmt(args);
        if counter.0 > MAX_COMMAND_LEN {
            return Err(TransportError::CommandTooLong { len: counter.0 });
        }

        let mut line = String::new();
        line.write_fmt(args)
            .map_err(|_| TransportError::CommandTooLong { len: counter.0 })?;
        Ok(Self { line })
    }

    /// Command text
    pub fn as_str(&self) -> &str {
        self.line.as_str()
    }

    /// Command bytes as sent on the wire, minus the terminator
    pub fn as_bytes(&self) -> &[u8] {
        self.line.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Command {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.line.as_str())
    }
}

struct LengthCounter(usize);

impl Write for LengthCounter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}

/// A quoted, escaped string parameter
pub struct Quoted<'a>(pub &'a str);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;
        for c in self.0.chars() {
            if matches!(c, '"' | ',' | '\\') {
                f.write_char('\\')?;
            }
            f.write_char(c)?;
        }
        f.write_char('"')
    }
}

/// `AT`: liveness probe
pub fn attention() -> Result<Command, TransportError> {
    Command::from_fmt(format_args!("AT"))
}

/// `AT+RST`: restart the modem
pub fn reset() -> Result<Command, TransportError> {
    Command::from_fmt(format_args!("AT+RST"))
}

/// `AT+CWMODE=1`: WiFi station mode
pub fn station_mode() -> Result<Command, TransportError> {
    Command::from_fmt(format_args!("AT+CWMODE=1"))
}

/// `AT+CWMODE?`: query the WiFi mode
pub fn query_station_mode() -> Result<Command, TransportError> {
    Command::from_fmt(format_args!("AT+CWMODE?"))
}

/// `AT+CWJAP="<ssid>","<passphrase>"`: join an access point
pub fn join_access_point(ssid: &str, passphrase: &str) -> Result<Command, TransportError> {
    Command::from_fmt(format_args!(
        "AT+CWJAP={},{}",
        Quoted(ssid),
        Quoted(passphrase)
    ))
}

/// `AT+CWQAP`: leave the access point
pub fn disconnect_access_point() -> Result<Command, TransportError> {
    Command::from_fmt(format_args!("AT+CWQAP"))
}

/// `AT+MQTTUSERCFG`: MQTT over TCP, no credentials, no certificates
pub fn mqtt_user_config(client_id: &str) -> Result<Command, TransportError> {
    Command::from_fmt(format_args!(
        "AT+MQTTUSERCFG=0,1,{},\"\",\"\",0,0,\"\"",
        Quoted(client_id)
    ))
}

/// `AT+MQTTCONN`: connect to the broker
pub fn mqtt_connect(host: &str, port: u16, reconnect: bool) -> Result<Command, TransportError> {
    Command::from_fmt(format_args!(
        "AT+MQTTCONN=0,{},{},{}",
        Quoted(host),
        port,
        u8::from(reconnect)
    ))
}

/// `AT+MQTTPUB`: publish at QoS 0 without retain
pub fn mqtt_publish(topic: &str, payload: &str) -> Result<Command, TransportError> {
    Command::from_fmt(format_args!(
        "AT+MQTTPUB=0,{},{},0,0",
        Quoted(topic),
        Quoted(payload)
    ))
}
