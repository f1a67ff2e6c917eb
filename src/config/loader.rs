//! Machine configuration files (std only).
//!
//! On a host (commissioning scripts, the simulator, tests) the machine
//! description lives in a TOML file. Embedded builds skip this module and
//! construct a [`MachineConfig`] from baked-in data instead.

use std::fs;
use std::path::Path;

use crate::error::{ConfigError, Result};

use super::MachineConfig;

/// Fit an arbitrary diagnostic into the fixed-size error payload. Long
/// TOML messages get cut at the buffer boundary, never dropped.
fn clipped(message: &str) -> heapless::String<128> {
    let mut out = heapless::String::new();
    for ch in message.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// Read, parse and validate a machine configuration file.
///
/// A gantry must never start on a description that parses but cannot drive
/// the hardware, so the validation pass runs before anything is returned.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MachineConfig> {
    match fs::read_to_string(path.as_ref()) {
        Ok(text) => parse_config(&text),
        Err(e) => Err(ConfigError::IoError(clipped(&e.to_string())).into()),
    }
}

/// Parse and validate a machine configuration from TOML text.
pub fn parse_config(text: &str) -> Result<MachineConfig> {
    let config: MachineConfig =
        toml::from_str(text).map_err(|e| ConfigError::ParseError(clipped(e.message())))?;

    super::validation::validate_config(&config)?;
    Ok(config)
}
