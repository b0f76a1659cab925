//! Build script for coldwatch-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates station.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths and scripts
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).expect("create memory.x");
    f.write_all(memory_x).expect("write memory.x");

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate station.toml at compile time
///
/// The firmware parses the same file at boot with a much smaller parser;
/// catching mistakes here keeps a bad file from silently falling back to
/// defaults on the device.
fn validate_config() {
    println!("cargo:rerun-if-changed=station.toml");

    let config_path = Path::new("station.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: station.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a station.toml configuration file.        ║\n\
            ║  Please create one in the coldwatch-firmware directory.          ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read station.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in station.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_wifi(&config, &mut errors);
    validate_mqtt(&config, &mut errors);
    validate_numbers(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid station configuration                            ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=station.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keys accepted per section; the boot parser rejects anything else
const SECTIONS: &[(&str, &[&str])] = &[
    ("wifi", &["ssid", "passphrase", "password"]),
    (
        "mqtt",
        &[
            "host",
            "port",
            "client_id",
            "reconnect",
            "status_topic",
            "temperature_topic",
        ],
    ),
    ("detector", &["threshold_percent", "min_baseline_x10"]),
    ("transport", &["timeout_ms", "verbose", "retry_attempts"]),
    ("sampling", &["period_ms", "max_failed_publishes", "sensor"]),
];

fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        return;
    };

    for (name, section) in root {
        let Some((_, keys)) = SECTIONS.iter().find(|(s, _)| s == name) else {
            errors.push(format!("unknown section [{}]", name));
            continue;
        };
        let Some(table) = section.as_table() else {
            errors.push(format!("'{}' must be a [section]", name));
            continue;
        };
        for key in table.keys() {
            if !keys.contains(&key.as_str()) {
                errors.push(format!("[{}] unknown key '{}'", name, key));
            }
        }
    }
}

fn string_at<'a>(config: &'a toml::Value, section: &str, key: &str) -> Option<&'a str> {
    config.get(section)?.get(key)?.as_str()
}

fn int_at(config: &toml::Value, section: &str, key: &str) -> Option<i64> {
    config.get(section)?.get(key)?.as_integer()
}

fn check_len(
    config: &toml::Value,
    section: &str,
    key: &str,
    max: usize,
    errors: &mut Vec<String>,
) {
    if let Some(value) = string_at(config, section, key) {
        if value.len() > max {
            errors.push(format!("[{}] {} longer than {} bytes", section, key, max));
        }
        if value.contains('"') {
            errors.push(format!("[{}] {} must not contain '\"'", section, key));
        }
    }
}

fn validate_wifi(config: &toml::Value, errors: &mut Vec<String>) {
    check_len(config, "wifi", "ssid", 32, errors);
    check_len(config, "wifi", "passphrase", 64, errors);
    check_len(config, "wifi", "password", 64, errors);
}

fn validate_mqtt(config: &toml::Value, errors: &mut Vec<String>) {
    check_len(config, "mqtt", "host", 64, errors);
    check_len(config, "mqtt", "client_id", 23, errors);
    check_len(config, "mqtt", "status_topic", 64, errors);
    check_len(config, "mqtt", "temperature_topic", 64, errors);

    if let Some(port) = int_at(config, "mqtt", "port") {
        if !(1..=65535).contains(&port) {
            errors.push("[mqtt] port must be 1-65535".to_string());
        }
    }
}

fn validate_numbers(config: &toml::Value, errors: &mut Vec<String>) {
    if let Some(percent) = int_at(config, "detector", "threshold_percent") {
        if !(1..=100).contains(&percent) {
            errors.push("[detector] threshold_percent must be 1-100".to_string());
        }
    }
    if let Some(x10) = int_at(config, "detector", "min_baseline_x10") {
        if x10 < 0 {
            errors.push("[detector] min_baseline_x10 must not be negative".to_string());
        }
    }
    for (section, key, max) in [
        ("transport", "timeout_ms", i64::from(u32::MAX)),
        ("sampling", "period_ms", i64::from(u32::MAX)),
        ("sampling", "max_failed_publishes", 255),
    ] {
        if let Some(value) = int_at(config, section, key) {
            if !(1..=max).contains(&value) {
                errors.push(format!("[{}] {} must be 1-{}", section, key, max));
            }
        }
    }
    if let Some(retries) = int_at(config, "transport", "retry_attempts") {
        if !(0..=255).contains(&retries) {
            errors.push("[transport] retry_attempts must be 0-255".to_string());
        }
    }
    if let Some(sensor) = string_at(config, "sampling", "sensor") {
        if !["ds18b20", "die", "simulated"].contains(&sensor) {
            errors.push("[sampling] sensor must be 'ds18b20', 'die' or 'simulated'".to_string());
        }
    }
}
