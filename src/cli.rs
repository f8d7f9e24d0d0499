//! Command-line and environment configuration for the AQI proxy
//!
//! Every option can be given as a flag or through its environment variable;
//! a `.env` file in the working directory is loaded first when present.

use clap::{Parser, ValueEnum};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

use crate::cache::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL_SECS};
use crate::data::waqi::WAQI_BASE_URL;

/// Token value shipped as the default; running with it will not work
pub const PLACEHOLDER_TOKEN: &str = "PLACEHOLDER_TOKEN_INSERT_YOUR_TOKEN_HERE";

/// Error types for configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The listen host is not an IP address
    #[error("Invalid host: '{0}'. Expected an IP address such as 127.0.0.1")]
    InvalidHost(String),

    /// The provider base URL is not an http(s) URL
    #[error("Invalid base URL: '{0}'. Expected an http:// or https:// URL")]
    InvalidBaseUrl(String),
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// AQI Proxy - A cached REST front for the WAQI air quality API
#[derive(Parser, Debug)]
#[command(name = "aqiproxy")]
#[command(about = "Air quality lookups by city, cached in memory")]
#[command(version)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "AQI_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "AQI_PORT", default_value_t = 5000)]
    pub port: u16,

    /// WAQI API token (get one at https://aqicn.org/data-platform/token/)
    #[arg(long, env = "AQI_TOKEN", default_value = PLACEHOLDER_TOKEN,
          hide_default_value = true, hide_env_values = true)]
    pub token: String,

    /// Base URL of the WAQI API
    #[arg(long, env = "AQI_BASE_URL", default_value = WAQI_BASE_URL)]
    pub base_url: String,

    /// Seconds a cached lookup stays fresh
    #[arg(long, env = "AQI_CACHE_TTL", default_value_t = DEFAULT_TTL_SECS,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub cache_ttl: u64,

    /// Maximum number of cities held in the cache
    #[arg(long, env = "AQI_MAX_ENTRIES", default_value_t = DEFAULT_MAX_ENTRIES as u64,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub max_entries: u64,

    /// Seconds to wait for the WAQI API before giving up
    #[arg(long, env = "AQI_FETCH_TIMEOUT", default_value_t = 10,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub fetch_timeout: u64,

    /// Log output format
    #[arg(long, env = "AQI_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Disable permissive CORS headers
    #[arg(long)]
    pub no_cors: bool,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Socket address to bind
    pub listen_addr: SocketAddr,
    /// WAQI API token
    pub token: String,
    /// WAQI base URL
    pub base_url: String,
    /// Cache entry time-to-live
    pub cache_ttl: Duration,
    /// Cache capacity
    pub max_entries: usize,
    /// Provider request timeout
    pub fetch_timeout: Duration,
    /// Log output format
    pub log_format: LogFormat,
    /// Whether to send CORS headers
    pub enable_cors: bool,
}

impl ProxyConfig {
    /// Creates a ProxyConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(ProxyConfig)` with validated settings
    /// * `Err(ConfigError)` if the host or base URL is unusable
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let ip: IpAddr = cli
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(cli.host.clone()))?;

        if !(cli.base_url.starts_with("http://") || cli.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(cli.base_url.clone()));
        }

        Ok(ProxyConfig {
            listen_addr: SocketAddr::new(ip, cli.port),
            token: cli.token.clone(),
            base_url: cli.base_url.clone(),
            cache_ttl: Duration::from_secs(cli.cache_ttl),
            max_entries: usize::try_from(cli.max_entries).unwrap_or(usize::MAX),
            fetch_timeout: Duration::from_secs(cli.fetch_timeout),
            log_format: cli.log_format,
            enable_cors: !cli.no_cors,
        })
    }

    /// Whether the token is still the shipped placeholder
    pub fn token_is_placeholder(&self) -> bool {
        self.token == PLACEHOLDER_TOKEN
    }
}
