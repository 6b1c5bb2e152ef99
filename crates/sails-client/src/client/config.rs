//! Client configuration
//!
//! [`ClientConfig`] can be built in code, or loaded from a TOML, YAML or JSON
//! file with environment variable overrides.

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use sails_transport_traits::SocketOptions;

use crate::error::ConfigError;

/// Default environment variable prefix for [`ClientConfig::from_file`].
pub const DEFAULT_ENV_PREFIX: &str = "SAILS";

/// Configuration for one [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Address handed to the transport on connect
    pub address: String,

    /// Options handed to the transport on connect
    pub options: SocketOptions,

    /// Connect as part of building the client
    pub auto_connect: bool,

    /// Per-call reply timeout in milliseconds; `None` waits indefinitely
    pub request_timeout_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: "localhost:1337".to_string(),
            options: SocketOptions::default(),
            auto_connect: false,
            request_timeout_ms: None,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for `address` with default settings.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Per-call reply timeout, if one is configured.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Load configuration from a file, with `SAILS_` environment overrides.
    ///
    /// The format follows the extension (`.toml`, `.yaml`/`.yml`, `.json`).
    /// Nested keys use `__` in variable names, e.g.
    /// `SAILS_OPTIONS__CONNECT_TIMEOUT_MS=5000`.
    ///
    /// ```rust,no_run
    /// use sails_client::ClientConfig;
    ///
    /// let config = ClientConfig::from_file("sails.toml").expect("Failed to load config");
    /// ```
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_file_with_prefix(path, DEFAULT_ENV_PREFIX)
    }

    /// Load configuration from a file with a custom environment prefix.
    pub fn from_file_with_prefix(
        path: impl AsRef<Path>,
        env_prefix: &str,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let format = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("yaml" | "yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => return Err(ConfigError::UnsupportedFormat),
        };

        let config = Config::builder()
            .add_source(File::from(path).format(format))
            .add_source(
                Environment::with_prefix(env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[cfg(unix)]
    #[test]
    fn test_load_non_utf8_path() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OsStr::from_bytes(b"sails-\xff.toml"));
        std::fs::write(&path, "address = \"raw.example.com:1337\"\n").unwrap();

        let config = ClientConfig::from_file_with_prefix(&path, "SAILS_NON_UTF8_TEST").unwrap();
        assert_eq!(config.address, "raw.example.com:1337");
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.address, "localhost:1337");
        assert!(!config.auto_connect);
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_load_toml() {
        let file = write_config(
            ".toml",
            r#"
address = "api.example.com:443"
auto_connect = true
request_timeout_ms = 2500

[options]
connect_timeout_ms = 1000

[options.query]
__sails_io_sdk_version = "0.13.8"
"#,
        );

        let config = ClientConfig::from_file_with_prefix(file.path(), "SAILS_TEST_TOML").unwrap();
        assert_eq!(config.address, "api.example.com:443");
        assert!(config.auto_connect);
        assert_eq!(config.request_timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(config.options.connect_timeout_ms, 1000);
        assert_eq!(config.options.query["__sails_io_sdk_version"], "0.13.8");
    }

    #[test]
    fn test_load_json_partial() {
        let file = write_config(".json", r#"{"address": "10.0.0.1:1337"}"#);
        let config = ClientConfig::from_file_with_prefix(file.path(), "SAILS_TEST_JSON").unwrap();
        assert_eq!(config.address, "10.0.0.1:1337");
        assert_eq!(config.options, SocketOptions::default());
    }

    #[test]
    fn test_missing_file() {
        let err = ClientConfig::from_file("/nonexistent/sails.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_config(".ini", "address = x");
        let err = ClientConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat));
    }

    #[test]
    fn test_malformed_file() {
        let file = write_config(".toml", "address = [");
        let err = ClientConfig::from_file_with_prefix(file.path(), "SAILS_TEST_BAD").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
