//! Station configuration loading
//!
//! station.toml is embedded at build time (and validated by build.rs);
//! it is parsed once at boot.

use coldwatch_core::config::{parse_config, StationConfig};
use defmt::*;

/// Embedded station configuration
/// Edit station.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../station.toml");

/// Parse the embedded configuration, falling back to built-in defaults
pub fn load() -> StationConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            // build.rs validates the file, so this means the two parsers disagree
            error!("Failed to parse embedded config: {}", e);
            error!("Using built-in defaults");
            StationConfig::default()
        }
    }
}
