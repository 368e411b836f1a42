//! Client configuration.
//!
//! Settings can be built in code or loaded from a TOML file:
//!
//! ```toml
//! [connection]
//! addr = "127.0.0.1:6379"
//! connect_timeout_ms = 500
//!
//! [limits]
//! max_bulk_string_len = 1048576
//! ```

use std::path::Path;

use resp_proto::ParseOptions;
use serde::Deserialize;

use crate::Error;

/// Top-level client configuration.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Transport settings for [`TcpConnection`](crate::TcpConnection).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ConnectionConfig {
    /// Server address (`host:port`).
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Connect timeout in milliseconds. 0 means no timeout.
    #[serde(default)]
    pub connect_timeout_ms: u64,
    /// Disable Nagle's algorithm on the socket.
    #[serde(default = "default_nodelay")]
    pub nodelay: bool,
    /// Initial capacity of the read buffer in bytes.
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            connect_timeout_ms: 0,
            nodelay: default_nodelay(),
            read_buffer_size: default_read_buffer_size(),
        }
    }
}

/// Reply parser limits. Defaults match [`ParseOptions::default`].
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LimitsConfig {
    #[serde(default = "default_max_collection_elements")]
    pub max_collection_elements: usize,
    #[serde(default = "default_max_bulk_string_len")]
    pub max_bulk_string_len: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_max_total_items")]
    pub max_total_items: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_collection_elements: default_max_collection_elements(),
            max_bulk_string_len: default_max_bulk_string_len(),
            max_depth: default_max_depth(),
            max_total_items: default_max_total_items(),
        }
    }
}

fn default_addr() -> String {
    "127.0.0.1:6379".to_string()
}

fn default_nodelay() -> bool {
    true
}

fn default_read_buffer_size() -> usize {
    16 * 1024
}

fn default_max_collection_elements() -> usize {
    resp_proto::DEFAULT_MAX_COLLECTION_ELEMENTS
}

fn default_max_bulk_string_len() -> usize {
    resp_proto::DEFAULT_MAX_BULK_STRING_LEN
}

fn default_max_depth() -> usize {
    resp_proto::DEFAULT_MAX_DEPTH
}

fn default_max_total_items() -> usize {
    resp_proto::DEFAULT_MAX_TOTAL_ITEMS
}

impl ClientConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        toml::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    /// Parser limits derived from this configuration.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::new()
            .max_collection_elements(self.limits.max_collection_elements)
            .max_bulk_string_len(self.limits.max_bulk_string_len)
            .max_depth(self.limits.max_depth)
            .max_total_items(self.limits.max_total_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.connection.addr, "127.0.0.1:6379");
        assert!(config.connection.nodelay);
        assert_eq!(config.parse_options(), ParseOptions::default());
    }

    #[test]
    fn partial_toml_overrides() {
        let config = ClientConfig::from_toml_str(
            r#"
            [connection]
            addr = "10.0.0.5:7000"
            connect_timeout_ms = 250
            nodelay = false

            [limits]
            max_bulk_string_len = 1024
            "#,
        )
        .unwrap();
        assert_eq!(config.connection.addr, "10.0.0.5:7000");
        assert_eq!(config.connection.connect_timeout_ms, 250);
        assert!(!config.connection.nodelay);
        assert_eq!(config.connection.read_buffer_size, 16 * 1024);
        assert_eq!(config.parse_options().max_bulk_string_len, 1024);
        assert_eq!(
            config.parse_options().max_depth,
            resp_proto::DEFAULT_MAX_DEPTH
        );
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = ClientConfig::from_toml_str("[connection]\naddr = 5").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = ClientConfig::load("/nonexistent/resp-client.toml").unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("resp-client.toml")));
    }
}
