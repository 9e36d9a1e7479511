use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Thread search API
    pub bearer_token: String,
    pub x_api_base_url: String,

    // Marketplaces
    pub objkt_graphql_url: String,

    // IPFS archival
    pub ipfs_api_url: String,
    pub ipfs_gateway_url: String,

    // Pipeline
    pub data_dir: PathBuf,
    pub post_delay: Duration,
    pub http_timeout: Duration,

    // Logging
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Thread search API
            bearer_token: required_env("X_BEARER_TOKEN")?,
            x_api_base_url: env_or_default("X_API_BASE_URL", "https://api.twitter.com"),

            // Marketplaces
            objkt_graphql_url: env_or_default(
                "OBJKT_GRAPHQL_URL",
                "https://data.objkt.com/v3/graphql",
            ),

            // IPFS archival
            ipfs_api_url: env_or_default("IPFS_API_URL", "http://127.0.0.1:5001"),
            ipfs_gateway_url: env_or_default("IPFS_GATEWAY_URL", "https://nftstorage.link/ipfs/"),

            // Pipeline
            data_dir: PathBuf::from(env_or_default("DATA_DIR", "./data")),
            post_delay: Duration::from_millis(parse_env_u64("POST_DELAY_MS", 5)?),
            http_timeout: Duration::from_secs(parse_env_u64("HTTP_TIMEOUT_SECS", 30)?),

            // Logging
            log_format: parse_log_format(&env_or_default("LOG_FORMAT", "pretty"))?,
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bearer_token.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "X_BEARER_TOKEN".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        for (name, value) in [
            ("X_API_BASE_URL", &self.x_api_base_url),
            ("OBJKT_GRAPHQL_URL", &self.objkt_graphql_url),
            ("IPFS_API_URL", &self.ipfs_api_url),
        ] {
            if url::Url::parse(value).is_err() {
                return Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    message: format!("not a valid URL: '{value}'"),
                });
            }
        }
        if self.http_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "HTTP_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Directory holding the submission CSV files.
    #[must_use]
    pub fn entries_dir(&self) -> PathBuf {
        self.data_dir.join("entries")
    }

    /// Configuration pointing at local defaults, for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            bearer_token: "test-token".to_string(),
            x_api_base_url: "http://127.0.0.1:9".to_string(),
            objkt_graphql_url: "http://127.0.0.1:9/v3/graphql".to_string(),
            ipfs_api_url: "http://127.0.0.1:9".to_string(),
            ipfs_gateway_url: "https://nftstorage.link/ipfs/".to_string(),
            data_dir: PathBuf::from("./data"),
            post_delay: Duration::ZERO,
            http_timeout: Duration::from_secs(5),
            log_format: LogFormat::Pretty,
        }
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_log_format(value: &str) -> Result<LogFormat, ConfigError> {
    match value.to_lowercase().as_str() {
        "pretty" | "text" => Ok(LogFormat::Pretty),
        "json" | "structured" => Ok(LogFormat::Json),
        _ => Err(ConfigError::InvalidValue {
            name: "LOG_FORMAT".to_string(),
            message: format!("must be 'pretty' or 'json', got '{value}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "X_BEARER_TOKEN",
        "X_API_BASE_URL",
        "OBJKT_GRAPHQL_URL",
        "IPFS_API_URL",
        "IPFS_GATEWAY_URL",
        "DATA_DIR",
        "POST_DELAY_MS",
        "HTTP_TIMEOUT_SECS",
        "LOG_FORMAT",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_parse_log_format() {
        assert_eq!(parse_log_format("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(parse_log_format("JSON").unwrap(), LogFormat::Json);
        assert_eq!(parse_log_format("structured").unwrap(), LogFormat::Json);
        assert!(parse_log_format("xml").is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_requires_token() {
        clear_env();
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref name) if name == "X_BEARER_TOKEN"));
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        std::env::set_var("X_BEARER_TOKEN", "abc");

        let config = Config::from_env().unwrap();
        assert_eq!(config.bearer_token, "abc");
        assert_eq!(config.x_api_base_url, "https://api.twitter.com");
        assert_eq!(config.objkt_graphql_url, "https://data.objkt.com/v3/graphql");
        assert_eq!(config.ipfs_gateway_url, "https://nftstorage.link/ipfs/");
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.post_delay, Duration::from_millis(5));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.validate().is_ok());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_integer() {
        clear_env();
        std::env::set_var("X_BEARER_TOKEN", "abc");
        std::env::set_var("POST_DELAY_MS", "soon");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::ParseInt { ref name, .. } if name == "POST_DELAY_MS"));

        clear_env();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            bearer_token: "  ".to_string(),
            ..Config::for_testing()
        };
        assert!(config.validate().is_err());

        let config = Config {
            objkt_graphql_url: "not a url".to_string(),
            ..Config::for_testing()
        };
        assert!(config.validate().is_err());

        let config = Config {
            http_timeout: Duration::ZERO,
            ..Config::for_testing()
        };
        assert!(config.validate().is_err());

        assert!(Config::for_testing().validate().is_ok());
    }
}
