//! Value parsers for CLI arguments.

use std::fs;
use std::path::PathBuf;

pub fn validate_port(port_str: &str) -> Result<u16, String> {
    let port: u16 = port_str
        .parse()
        .map_err(|_| format!("Port must be a number between 1 and 65535, got: '{port_str}'"))?;

    if port == 0 {
        return Err("Port must be between 1 and 65535".to_string());
    }
    Ok(port)
}

/// The path must name an existing, readable file.
fn readable_file(path_str: &str, what: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.is_file() {
        return Err(format!("{what} is not an existing file: '{path_str}'"));
    }

    fs::File::open(&path)
        .map(|_| path)
        .map_err(|e| format!("Cannot read {what} '{path_str}': {e}"))
}

pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
    readable_file(path_str, "Configuration file")
}

pub fn validate_reference_data_path(path_str: &str) -> Result<PathBuf, String> {
    let path = readable_file(path_str, "Reference data file")?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Ok(path),
        _ => Err(format!("Reference data must be a .toml file: '{path_str}'")),
    }
}

/// 1 to 100 steps.
pub fn validate_rollback_steps(steps_str: &str) -> Result<u32, String> {
    let steps: u32 = steps_str
        .parse()
        .map_err(|_| format!("Rollback steps must be a positive number, got: '{steps_str}'"))?;

    match steps {
        0 => Err("Rollback steps must be greater than 0".to_string()),
        101.. => Err("Rollback steps cannot exceed 100".to_string()),
        _ => Ok(steps),
    }
}

/// Accepts hostnames and dotted IPv4 addresses.
pub fn validate_host_address(host_str: &str) -> Result<String, String> {
    let host = host_str.trim();

    if host.is_empty() {
        return Err("Host address cannot be empty".to_string());
    }
    if host.contains(char::is_whitespace) {
        return Err("Host address cannot contain spaces".to_string());
    }
    if host.len() > 253 {
        return Err("Host address is too long (maximum 253 characters)".to_string());
    }

    if host.chars().all(|c| c.is_ascii_digit() || c == '.') {
        let octets: Vec<&str> = host.split('.').collect();
        if octets.len() != 4 || octets.iter().any(|o| o.parse::<u8>().is_err()) {
            return Err(format!("Invalid IPv4 address: '{host_str}'"));
        }
    }

    Ok(host.to_string())
}
