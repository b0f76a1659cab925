//! Simple TOML parser for station configuration
//!
//! This is a minimal TOML parser that handles only the subset needed for
//! the station configuration. It does NOT support the full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - [section] headers: `wifi`, `mqtt`, `detector`, `transport`, `sampling`
//! - Comments (# ...), including trailing comments after a value
//!
//! NOT supported:
//! - Arrays and tables inside values
//! - Multi-line strings and escape sequences
//! - Dotted keys
//!
//! Keys not listed for a section are rejected so a typo never silently
//! falls back to a default.

use heapless::String;

use super::types::{SensorKind, StationConfig};
use crate::temperature::Temperature;

/// Parse error, with the 1-based line it was found on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection { line: usize },
    /// Key not valid in this section
    UnknownKey { line: usize },
    /// Line is neither a header nor `key = value`
    Malformed { line: usize },
    /// Value has the wrong type or is out of range
    InvalidValue { line: usize },
    /// String value exceeds the field's capacity
    TooLong { line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Wifi,
    Mqtt,
    Detector,
    Transport,
    Sampling,
}

/// Parse TOML text into a [`StationConfig`]
///
/// Every field not mentioned keeps its default value.
pub fn parse_config(input: &str) -> Result<StationConfig, ParseError> {
    let mut config = StationConfig::default();
    let mut section = Section::Root;

    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        let text = strip_comment(raw).trim();

        if text.is_empty() {
            continue;
        }

        if text.starts_with('[') {
            if !text.ends_with(']') {
                return Err(ParseError::InvalidSection { line });
            }
            section = parse_section_header(&text[1..text.len() - 1])
                .ok_or(ParseError::InvalidSection { line })?;
            continue;
        }

        let (key, value) = parse_key_value(text).ok_or(ParseError::Malformed { line })?;
        apply_value(&mut config, section, key, value)
            .map_err(|kind| kind.at(line))?;
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Option<Section> {
    match header.trim() {
        "wifi" => Some(Section::Wifi),
        "mqtt" => Some(Section::Mqtt),
        "detector" => Some(Section::Detector),
        "transport" => Some(Section::Transport),
        "sampling" => Some(Section::Sampling),
        _ => None,
    }
}

/// Drop a trailing `# comment` that is not inside a string
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Error without a line number yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueError {
    UnknownKey,
    Invalid,
    TooLong,
}

impl ValueError {
    fn at(self, line: usize) -> ParseError {
        match self {
            ValueError::UnknownKey => ParseError::UnknownKey { line },
            ValueError::Invalid => ParseError::InvalidValue { line },
            ValueError::TooLong => ParseError::TooLong { line },
        }
    }
}

fn apply_value(
    config: &mut StationConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ValueError> {
    match section {
        Section::Root => return Err(ValueError::UnknownKey),
        Section::Wifi => match key {
            "ssid" => config.wifi.ssid = parse_string(value)?,
            "passphrase" | "password" => config.wifi.passphrase = parse_string(value)?,
            _ => return Err(ValueError::UnknownKey),
        },
        Section::Mqtt => match key {
            "host" => config.mqtt.host = parse_string(value)?,
            "port" => config.mqtt.port = parse_int(value)?,
            "client_id" => config.mqtt.client_id = parse_string(value)?,
            "reconnect" => config.mqtt.reconnect = parse_bool(value)?,
            "status_topic" => config.mqtt.status_topic = parse_string(value)?,
            "temperature_topic" => config.mqtt.temperature_topic = parse_string(value)?,
            _ => return Err(ValueError::UnknownKey),
        },
        Section::Detector => match key {
            "threshold_percent" => {
                let percent: u8 = parse_int(value)?;
                if percent == 0 || percent > 100 {
                    return Err(ValueError::Invalid);
                }
                config.detector.threshold_percent = percent;
            }
            "min_baseline_x10" => {
                let x10: i32 = parse_int(value)?;
                if x10 < 0 {
                    return Err(ValueError::Invalid);
                }
                config.detector.min_baseline = Temperature::from_celsius_x10(x10);
            }
            _ => return Err(ValueError::UnknownKey),
        },
        Section::Transport => match key {
            "timeout_ms" => {
                let timeout: u32 = parse_int(value)?;
                if timeout == 0 {
                    return Err(ValueError::Invalid);
                }
                config.transport.timeout_ms = timeout;
            }
            "verbose" => config.transport.verbose = parse_bool(value)?,
            "retry_attempts" => config.transport.retry_attempts = parse_int(value)?,
            _ => return Err(ValueError::UnknownKey),
        },
        Section::Sampling => match key {
            "period_ms" => {
                let period: u32 = parse_int(value)?;
                if period == 0 {
                    return Err(ValueError::Invalid);
                }
                config.sampling.period_ms = period;
            }
            "max_failed_publishes" => {
                let max: u8 = parse_int(value)?;
                if max == 0 {
                    return Err(ValueError::Invalid);
                }
                config.sampling.max_failed_publishes = max;
            }
            "sensor" => {
                let name: String<16> = parse_string(value)?;
                config.sampling.sensor =
                    SensorKind::from_name(&name).ok_or(ValueError::Invalid)?;
            }
            _ => return Err(ValueError::UnknownKey),
        },
    }
    Ok(())
}

/// Parse a quoted string value into a fixed-capacity string
fn parse_string<const N: usize>(value: &str) -> Result<String<N>, ValueError> {
    let inner = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or(ValueError::Invalid)?;
    if inner.contains('"') {
        return Err(ValueError::Invalid);
    }
    let mut out = String::new();
    out.push_str(inner).map_err(|_| ValueError::TooLong)?;
    Ok(out)
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ValueError> {
    value.parse().map_err(|_| ValueError::Invalid)
}

fn parse_bool(value: &str) -> Result<bool, ValueError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ValueError::Invalid),
    }
}
