// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(rename = "static")]
    pub static_files: StaticConfig,
    pub proxy: ProxyConfig,
    pub logging: LoggingConfig,
    pub cors: CorsConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Upper bound on a single connection's lifetime, keep-alive included
    pub connection_timeout_secs: u64,
    /// How long `stop` waits for in-flight connections before exiting
    pub shutdown_grace_secs: u64,
}

/// Static file serving configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StaticConfig {
    /// Directory files are served from
    pub root: String,
    /// Document served for `/`
    pub default_document: String,
}

/// Proxy endpoint configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ProxyConfig {
    /// Request targets starting with this prefix are proxied
    pub path_prefix: String,
    /// Outbound call timeout
    pub timeout_secs: u64,
    /// Largest envelope body accepted, in bytes
    pub max_body_size: u64,
    /// Fixed `message` field of the error envelope
    pub error_message: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (`default` or `json`)
    pub format: String,
    /// Log file path (optional, stdout if not set)
    #[serde(default)]
    pub log_file: Option<String>,
}

/// CORS configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Also attach `Access-Control-Allow-Origin` to 404/500/501 responses
    /// produced outside the proxy route. Off keeps the historical wire behavior.
    pub on_errors: bool,
}
