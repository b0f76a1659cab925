//! Station driven through the real AT transport against a fake modem

use std::collections::VecDeque;

use coldwatch_at::CommandTransport;
use coldwatch_core::config::StationConfig;
use coldwatch_core::station::{SampleOutcome, SessionState, Station};
use coldwatch_core::Temperature;
use coldwatch_hal::{LinkError, SerialLink, TickSource};

/// Modem that answers every command line, rejecting lines with a given prefix
#[derive(Default)]
struct Modem {
    lines: Vec<String>,
    line: Vec<u8>,
    outbox: VecDeque<u8>,
    reject: Option<&'static str>,
    silent: bool,
}

impl SerialLink for Modem {
    fn tx_ready(&mut self) -> Result<bool, LinkError> {
        Ok(true)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), LinkError> {
        self.line.push(byte);
        if self.line.ends_with(b"\r\n") {
            let text = String::from_utf8_lossy(&self.line[..self.line.len() - 2]).into_owned();
            self.line.clear();
            if !self.silent {
                let rejected = self.reject.is_some_and(|p| text.starts_with(p));
                let reply: &[u8] = if rejected { b"\r\nERROR\r\n" } else { b"\r\nOK\r\n" };
                self.outbox.extend(reply);
            }
            self.lines.push(text);
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, LinkError> {
        Ok(self.outbox.pop_front())
    }
}

/// One tick per poll
#[derive(Default)]
struct Ticks;

impl TickSource for Ticks {
    fn elapsed_ticks(&mut self) -> u32 {
        1
    }
}

type LinkedStation = Station<CommandTransport<Modem, Ticks>, 2>;

fn station(modem: Modem, config: &StationConfig) -> LinkedStation {
    let transport = CommandTransport::new(modem, Ticks, config.transport.transport_config());
    Station::new(transport, config)
}

fn lines(s: &mut LinkedStation) -> Vec<String> {
    s.publisher_mut().client_mut().channel_mut().link_mut().lines.clone()
}

#[test]
fn brings_up_session_and_publishes_windows() {
    let config = StationConfig::default();
    let mut s = station(Modem::default(), &config);

    assert_eq!(s.service(), SessionState::Online);

    for celsius in [4, 4, 3, 3] {
        s.on_sample(Temperature::from_celsius(celsius)).unwrap();
    }

    let sent = lines(&mut s);
    assert_eq!(sent[0], "AT+CWMODE=1");
    assert!(sent[1].starts_with("AT+CWJAP="));
    assert!(sent[2].starts_with("AT+MQTTUSERCFG="));
    assert!(sent[3].starts_with("AT+MQTTCONN="));
    assert_eq!(
        sent[4..],
        [
            r#"AT+MQTTPUB=0,"home/sensors/forgot/refrigerator/1","OK",0,0"#,
            r#"AT+MQTTPUB=0,"home/sensors/temperature/refrigerator/1","4.0",0,0"#,
            r#"AT+MQTTPUB=0,"home/sensors/forgot/refrigerator/1","CHECK",0,0"#,
            r#"AT+MQTTPUB=0,"home/sensors/temperature/refrigerator/1","3.0",0,0"#,
        ]
    );
}

#[test]
fn rejected_join_stays_offline() {
    let config = StationConfig::default();
    let modem = Modem {
        reject: Some("AT+CWJAP"),
        ..Modem::default()
    };
    let mut s = station(modem, &config);

    assert_eq!(s.service(), SessionState::Offline);
    // Rejections are not retried
    assert_eq!(lines(&mut s).len(), 2);
}

#[test]
fn silent_modem_exhausts_retries() {
    let mut config = StationConfig::default();
    config.transport.timeout_ms = 20;
    config.transport.retry_attempts = 2;
    let modem = Modem {
        silent: true,
        ..Modem::default()
    };
    let mut s = station(modem, &config);

    assert_eq!(s.service(), SessionState::Offline);
    assert_eq!(lines(&mut s), ["AT+CWMODE=1"; 3]);
}

#[test]
fn dropped_broker_is_rebuilt() {
    let mut config = StationConfig::default();
    config.sampling.max_failed_publishes = 1;
    let mut s = station(Modem::default(), &config);
    s.service();
    s.on_sample(Temperature::from_celsius(5)).unwrap();
    s.on_sample(Temperature::from_celsius(5)).unwrap();

    s.publisher_mut().client_mut().channel_mut().link_mut().reject = Some("AT+MQTTPUB");
    s.on_sample(Temperature::from_celsius(5)).unwrap();
    let outcome = s.on_sample(Temperature::from_celsius(5)).unwrap();
    assert!(matches!(outcome, SampleOutcome::Unpublished(_)));
    assert_eq!(s.state(), SessionState::Offline);

    s.publisher_mut().client_mut().channel_mut().link_mut().reject = None;
    assert_eq!(s.service(), SessionState::Online);
}
