//! Server configuration
//!
//! Defaults, a builder for programmatic use and the command-line surface
//! of the `lemcache` binary.

use crate::protocol::DEFAULT_MAX_ITEM_SIZE;
use crate::{DEFAULT_HOST, DEFAULT_PORT};
use clap::Parser;

/// Runtime configuration for a lemcache server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Host to bind to
    pub host: String,

    /// TCP port to listen on
    pub port: u16,

    /// Largest payload a `set`/`add` may declare (bytes)
    pub max_item_size: usize,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_item_size: DEFAULT_MAX_ITEM_SIZE,
            max_connections: 1024,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Returns the `host:port` string the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for [`Config`]
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the item size ceiling (in bytes)
    pub fn max_item_size(mut self, size: usize) -> Self {
        self.config.max_item_size = size;
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log_level = level.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// lemcache server
#[derive(Parser, Debug)]
#[command(name = "lemcache")]
#[command(about = "In-memory cache speaking the memcache text protocol")]
#[command(version)]
pub struct Cli {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Largest item accepted, in bytes
    #[arg(short = 'I', long, default_value_t = DEFAULT_MAX_ITEM_SIZE)]
    pub max_item_size: usize,

    /// Maximum concurrent connections
    #[arg(short = 'c', long, default_value_t = 1024)]
    pub max_connections: usize,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn into_config(self) -> Config {
        Config::builder()
            .host(self.host)
            .port(self.port)
            .max_item_size(self.max_item_size)
            .max_connections(self.max_connections)
            .log_level(self.log_level)
            .build()
    }
}
