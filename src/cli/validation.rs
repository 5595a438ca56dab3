//! CLI argument validation functions
//!
//! This module provides custom validation functions for CLI arguments
//! that go beyond what clap can validate automatically.

use crate::xmpp::Jid;
use std::fs;
use std::path::PathBuf;

/// Validate port number is within valid range (1-65535)
pub fn validate_port(port_str: &str) -> Result<u16, String> {
    let port: u16 = port_str.parse().map_err(|_| {
        format!(
            "Port must be a valid number between 1 and 65535, got: '{}'",
            port_str
        )
    })?;

    if port == 0 {
        return Err("Port must be between 1 and 65535. Port 0 is not allowed.".to_string());
    }

    Ok(port)
}

/// Validate that a file path is accessible (exists and is readable)
pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(format!("Configuration file does not exist: '{}'", path_str));
    }

    if !path.is_file() {
        return Err(format!("Configuration path is not a file: '{}'", path_str));
    }

    match fs::File::open(&path) {
        Ok(_) => Ok(path),
        Err(e) => Err(format!(
            "Cannot read configuration file '{}': {}",
            path_str, e
        )),
    }
}

/// Validate a Jabber address such as `alice@example.com`
pub fn validate_address(address: &str) -> Result<String, String> {
    let address = address.trim();
    Jid::parse(address).map_err(|e| e.to_string())?;
    Ok(address.to_string())
}

/// Validate a server override of the form `host` or `host:port`
pub fn validate_server(server_str: &str) -> Result<String, String> {
    let server = server_str.trim();

    if server.is_empty() {
        return Err("Server cannot be empty".to_string());
    }
    if server.contains(char::is_whitespace) {
        return Err("Server cannot contain spaces".to_string());
    }

    let host = match server.rsplit_once(':') {
        Some((host, port)) => {
            validate_port(port)?;
            host
        }
        None => server,
    };

    if host.is_empty() {
        return Err(format!("Server host is missing in '{}'", server_str));
    }
    if host.len() > 253 {
        return Err("Server host is too long (maximum 253 characters)".to_string());
    }

    Ok(server.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_validation_valid_ports() {
        for port_str in ["1", "5222", "5223", "65535"] {
            let result = validate_port(port_str);
            assert!(result.is_ok(), "Port {} should be valid", port_str);
        }
    }

    #[test]
    fn test_port_validation_invalid_ports() {
        for port_str in ["0", "65536", "abc", "-1", ""] {
            let result = validate_port(port_str);
            assert!(result.is_err(), "Port {} should be invalid", port_str);
        }
    }

    #[test]
    fn test_address_validation() {
        assert_eq!(
            validate_address(" alice@example.com ").unwrap(),
            "alice@example.com"
        );
        assert!(validate_address("alice@example.com/phone").is_ok());

        for invalid in ["", "alice@", "@example.com", "alice@example.com/"] {
            assert!(
                validate_address(invalid).is_err(),
                "Address '{}' should be invalid",
                invalid
            );
        }
    }

    #[test]
    fn test_server_validation_valid() {
        for server in ["xmpp.example.com", "xmpp.example.com:5223", "10.0.0.5:5222"] {
            assert!(
                validate_server(server).is_ok(),
                "Server {} should be valid",
                server
            );
        }
    }

    #[test]
    fn test_server_validation_invalid() {
        let long = "x".repeat(300);
        for server in ["", "  ", "host name", ":5222", "xmpp.example.com:0", long.as_str()] {
            assert!(
                validate_server(server).is_err(),
                "Server '{}' should be invalid",
                server
            );
        }
    }

    #[test]
    fn test_config_file_path_validation() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        assert!(validate_config_file_path(path).is_ok());

        let dir = tempfile::tempdir().unwrap();
        assert!(validate_config_file_path(dir.path().to_str().unwrap()).is_err());
        assert!(validate_config_file_path("/nonexistent/notify.toml").is_err());
    }
}
